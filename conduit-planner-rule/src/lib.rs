//! # conduit-planner-rule
//!
//! The deterministic, no-LLM planner: classify requirements from the
//! request text, resolve target services, pick candidate tools by keyword
//! overlap, and attach per-service API-guide notes. Always succeeds —
//! there is no network call and no ambiguity this planner can't resolve by
//! falling back to a generic plan.

#![deny(missing_docs)]

mod guide;
mod requirements;
mod tools;

pub use guide::{collect_guide_notes, extract_sections, GuideError, GuideRetriever, MarkdownGuideRetriever, DEFAULT_PLANNING_SECTIONS};
pub use requirements::{extract_quantity, extract_requirements};
pub use tools::select_tools;

use conduit_plan::AgentPlan;
use conduit_registry::ToolRegistry;

const MAX_SELECTED_TOOLS: usize = 5;
const MAX_TARGET_SERVICES: i64 = 3;
const GUIDE_MAX_CHARS: usize = 1200;

/// Build a rule-based [`AgentPlan`] for `user_text`.
///
/// `guide_retriever`, when present, attaches a `"{service} guide loaded"`
/// or `"{service} guide missing"` note per target service.
pub fn build_agent_plan(
    user_text: &str,
    connected_services: &[String],
    registry: &ToolRegistry,
    guide_retriever: Option<&dyn GuideRetriever>,
) -> AgentPlan {
    let requirements = requirements::extract_requirements(user_text);
    let target_services = conduit_resolver::resolve_services(user_text, connected_services, MAX_TARGET_SERVICES, Some(registry));

    let available_for = if target_services.is_empty() { connected_services.to_vec() } else { target_services.clone() };
    let available_tools = registry.list_available_tools(&available_for, None);
    let selected_tools = tools::select_tools(user_text, &available_tools, MAX_SELECTED_TOOLS);

    let mut notes = Vec::new();
    if let Some(retriever) = guide_retriever {
        guide::collect_guide_notes(retriever, &target_services, GUIDE_MAX_CHARS, &mut notes);
    }

    let mut workflow_steps = vec![
        "요청문 분석 및 작업 요구사항 도출".to_string(),
        "작업 요구사항 기반 타겟 서비스 선정".to_string(),
        "타겟 서비스의 실행 가능한 API(tool) 선정".to_string(),
        "선정된 API 순서 기반 워크플로우 생성".to_string(),
        "워크플로우 기반 작업 진행".to_string(),
        "결과 정리".to_string(),
        "텔레그램 사용자 결과 전달".to_string(),
    ];
    if !selected_tools.is_empty() {
        workflow_steps.push(format!("실행 예정 API 순서: {}", selected_tools.join(" -> ")));
    }

    AgentPlan {
        user_text: user_text.to_string(),
        requirements,
        target_services,
        selected_tools,
        workflow_steps,
        tasks: Vec::new(),
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_registry::{IdempotencyKeyPolicy, ToolDefinition};
    use std::collections::HashMap;

    fn tool(service: &str, name: &str, description: &str) -> ToolDefinition {
        ToolDefinition {
            service: service.to_string(),
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
    fn builds_plan_with_target_services_and_tools() {
        let registry = ToolRegistry::from_tools(vec![tool("notion", "notion_create_page", "create a notion page")]);
        let connected = vec!["notion".to_string()];
        let plan = build_agent_plan("노션 페이지 만들어줘", &connected, &registry, None);
        assert_eq!(plan.target_services, vec!["notion".to_string()]);
        assert_eq!(plan.selected_tools, vec!["notion_create_page".to_string()]);
        assert!(plan.workflow_steps.last().unwrap().contains("notion_create_page"));
    }

    #[test]
    fn no_guide_retriever_means_no_notes() {
        let registry = ToolRegistry::from_tools(vec![]);
        let plan = build_agent_plan("아무 말", &[], &registry, None);
        assert!(plan.notes.is_empty());
    }
}
