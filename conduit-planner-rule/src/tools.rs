//! Deterministic tool-selection scoring.

use std::collections::HashSet;
use std::sync::OnceLock;

use conduit_registry::ToolDefinition;
use regex::Regex;

fn non_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^0-9a-zA-Z가-힣_ ]+").expect("valid regex"))
}

fn tokenize(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    let cleaned = non_token_pattern().replace_all(&lowered, " ");
    cleaned.split_whitespace().filter(|token| token.chars().count() >= 2).map(str::to_string).collect()
}

/// Score and rank `tools` against `user_text`, returning up to `max_tools`
/// tool names. Falls back to the first `max_tools` tools, unscored, when
/// nothing scores above zero.
pub fn select_tools(user_text: &str, tools: &[&ToolDefinition], max_tools: usize) -> Vec<String> {
    if tools.is_empty() {
        return Vec::new();
    }

    let query_tokens = tokenize(user_text);
    let mut scored: Vec<(String, i64)> = tools
        .iter()
        .map(|tool| {
            let corpus = format!("{} {}", tool.tool_name, tool.description);
            let tool_tokens = tokenize(&corpus);
            let mut overlap = query_tokens.intersection(&tool_tokens).count() as i64;

            if user_text.contains("요약") && (tool.tool_name.contains("retrieve") || tool.tool_name.contains("search")) {
                overlap += 1;
            }
            if ["생성", "만들", "작성"].iter().any(|k| user_text.contains(k))
                && (tool.tool_name.contains("create") || tool.tool_name.contains("append"))
            {
                overlap += 2;
            }
            if ["조회", "검색", "목록", "최근"].iter().any(|k| user_text.contains(k))
                && (tool.tool_name.contains("search") || tool.tool_name.contains("get") || tool.tool_name.contains("retrieve"))
            {
                overlap += 1;
            }
            if ["삭제", "지워", "아카이브", "archive"].iter().any(|k| user_text.contains(k)) && tool.tool_name.contains("update") {
                overlap += 2;
            }

            (tool.tool_name.clone(), overlap)
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    let selected: Vec<String> = scored.into_iter().filter(|(_, score)| *score > 0).map(|(name, _)| name).take(max_tools).collect();

    if !selected.is_empty() {
        return selected;
    }
    tools.iter().take(max_tools).map(|t| t.tool_name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_registry::IdempotencyKeyPolicy;
    use std::collections::HashMap;

    fn tool(name: &str, description: &str) -> ToolDefinition {
        ToolDefinition {
            service: "notion".to_string(),
            tool_name: name.to_string(),
            description: description.to_string(),
            http_method: "POST".to_string(),
            path_template: "/x".to_string(),
            base_url: "https://example.test".to_string(),
            adapter_function: "noop".to_string(),
            input_schema: serde_json::json!({"type": "object"}),
            required_scopes: Vec::new(),
            idempotency_key_policy: IdempotencyKeyPolicy::None,
            error_map: HashMap::new(),
        }
    }

    #[test]
    fn create_intent_boosts_create_and_append_tools() {
        let search = tool("notion_search", "search pages");
        let create = tool("notion_create_page", "create a page");
        let tools = vec![&search, &create];
        let selected = select_tools("페이지 생성해줘", &tools, 5);
        assert_eq!(selected.first().map(String::as_str), Some("notion_create_page"));
    }

    #[test]
    fn falls_back_to_first_tools_when_nothing_scores() {
        let search = tool("notion_search", "search pages");
        let tools = vec![&search];
        let selected = select_tools("완전히 무관한 문장", &tools, 5);
        assert_eq!(selected, vec!["notion_search".to_string()]);
    }

    #[test]
    fn empty_tool_list_returns_empty() {
        assert!(select_tools("anything", &[], 5).is_empty());
    }
}
