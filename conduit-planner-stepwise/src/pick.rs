//! Deterministic per-sentence tool selection, used when the LLM declines
//! or returns nothing usable.

use crate::catalog::CatalogTool;
use crate::chunks::sentence_chunks;
use crate::task::StepwiseTask;

/// Pick the most likely `(service, tool_name)` for one sentence, falling
/// back to the catalog's first entry when no branch matches.
pub fn pick_tool_for_sentence(sentence: &str, tools: &[CatalogTool]) -> (String, String) {
    let lowered = sentence.to_lowercase();

    for tool in tools {
        if tool.service == "google"
            && ["일정", "캘린더", "회의", "calendar"].iter().any(|t| lowered.contains(t))
            && tool.tool_name.contains("list_events")
        {
            return (tool.service.clone(), tool.tool_name.clone());
        }
        if tool.service == "notion" && ["노션", "notion"].iter().any(|t| lowered.contains(t)) {
            if ["생성", "create", "회의록", "페이지", "초안"].iter().any(|t| lowered.contains(t)) && tool.tool_name.contains("create_page") {
                return (tool.service.clone(), tool.tool_name.clone());
            }
            if ["조회", "검색", "찾"].iter().any(|t| lowered.contains(t)) && tool.tool_name.contains("search") {
                return (tool.service.clone(), tool.tool_name.clone());
            }
        }
        if tool.service == "linear" && ["리니어", "linear", "이슈", "issue"].iter().any(|t| lowered.contains(t)) {
            if ["생성", "등록", "create"].iter().any(|t| lowered.contains(t)) && tool.tool_name.contains("create_issue") {
                return (tool.service.clone(), tool.tool_name.clone());
            }
            if ["조회", "검색", "목록"].iter().any(|t| lowered.contains(t)) && tool.tool_name.contains("search_issues") {
                return (tool.service.clone(), tool.tool_name.clone());
            }
        }
    }

    tools.first().map(|t| (t.service.clone(), t.tool_name.clone())).unwrap_or_default()
}

/// Build one [`StepwiseTask`] per sentence chunk of `user_text`, dropping
/// chunks that resolve to no tool at all.
pub fn build_deterministic_tasks(user_text: &str, tools: &[CatalogTool]) -> Vec<StepwiseTask> {
    let chunks = sentence_chunks(user_text);
    if chunks.is_empty() {
        return Vec::new();
    }

    chunks
        .into_iter()
        .enumerate()
        .filter_map(|(index, sentence)| {
            let (service, tool_name) = pick_tool_for_sentence(&sentence, tools);
            if tool_name.is_empty() {
                return None;
            }
            Some(StepwiseTask { task_id: format!("step_{}", index + 1), sentence, service, tool_name })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<CatalogTool> {
        vec![
            CatalogTool {
                service: "google".to_string(),
                tool_name: "google_calendar_list_events".to_string(),
                description: "list calendar events".to_string(),
                required_fields: vec![],
            },
            CatalogTool {
                service: "notion".to_string(),
                tool_name: "notion_create_page".to_string(),
                description: "create a page".to_string(),
                required_fields: vec![],
            },
            CatalogTool {
                service: "linear".to_string(),
                tool_name: "linear_create_issue".to_string(),
                description: "create an issue".to_string(),
                required_fields: vec![],
            },
        ]
    }

    #[test]
    fn matches_calendar_events_by_keyword() {
        let (service, tool) = pick_tool_for_sentence("오늘 회의 일정 확인해줘", &catalog());
        assert_eq!((service.as_str(), tool.as_str()), ("google", "google_calendar_list_events"));
    }

    #[test]
    fn matches_notion_create_page_by_keyword() {
        let (service, tool) = pick_tool_for_sentence("노션에 회의록 페이지 생성해줘", &catalog());
        assert_eq!((service.as_str(), tool.as_str()), ("notion", "notion_create_page"));
    }

    #[test]
    fn falls_back_to_first_catalog_entry() {
        let (service, tool) = pick_tool_for_sentence("완전히 무관한 문장", &catalog());
        assert_eq!((service.as_str(), tool.as_str()), ("google", "google_calendar_list_events"));
    }

    #[test]
    fn empty_catalog_yields_empty_strings() {
        let (service, tool) = pick_tool_for_sentence("anything", &[]);
        assert!(service.is_empty() && tool.is_empty());
    }

    #[test]
    fn builds_one_task_per_sentence_chunk() {
        let tasks = build_deterministic_tasks("캘린더 확인하고 그리고 노션에 회의록 만들어줘", &catalog());
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].task_id, "step_1");
        assert_eq!(tasks[1].task_id, "step_2");
    }
}
