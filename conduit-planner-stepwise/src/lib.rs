//! # conduit-planner-stepwise
//!
//! Splits one user request into sequential chunks, resolves each chunk to
//! a single tool call (LLM-assisted, deterministic fallback), and packages
//! the result as a single `STEPWISE_PIPELINE` task plus a catalog id the
//! executor can hydrate the tool catalog from.

#![deny(missing_docs)]

mod candidate;
mod catalog;
mod chunks;
mod pick;
mod task;

pub use candidate::is_stepwise_candidate;
pub use catalog::{build_tool_catalog, is_tool_allowed_for_stepwise, CatalogTool};
pub use chunks::sentence_chunks;
pub use pick::{build_deterministic_tasks, pick_tool_for_sentence};
pub use task::StepwiseTask;

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use conduit_plan::{AgentPlan, AgentRequirement, AgentTask, TaskType};
use conduit_planner_llm::LlmProvider;
use conduit_profile::{build_runtime_api_profile, RiskPolicy, TenantPolicy};
use conduit_registry::ToolRegistry;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawTask {
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    sentence: Option<String>,
    #[serde(default)]
    service: Option<String>,
    #[serde(default)]
    tool_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTaskResponse {
    #[serde(default)]
    tasks: Vec<RawTask>,
}

fn system_prompt() -> &'static str {
    "You are a planner that decomposes one user request into sequential tasks. Return JSON only."
}

fn user_prompt(user_text: &str, connected_services: &[String], tool_catalog: &[CatalogTool]) -> String {
    format!(
        "user_text={}\nconnected_services={}\napi_catalog={}\nReturn format: {{\"tasks\":[{{\"task_id\":\"step_1\",\"sentence\":\"...\",\"service\":\"...\",\"tool_name\":\"...\"}}]}}",
        user_text,
        serde_json::to_string(connected_services).unwrap_or_default(),
        serde_json::to_string(tool_catalog).unwrap_or_default(),
    )
}

async fn request_tasks_from_llm(
    providers: &[&dyn LlmProvider],
    user_text: &str,
    connected_services: &[String],
    tool_catalog: &[CatalogTool],
) -> Vec<StepwiseTask> {
    let allowed_tools: HashSet<&str> = tool_catalog.iter().map(|t| t.tool_name.as_str()).collect();
    let prompt = user_prompt(user_text, connected_services, tool_catalog);

    for provider in providers {
        let Some(object) = provider.request_json(system_prompt(), &prompt).await else {
            continue;
        };
        let Ok(response) = serde_json::from_value::<RawTaskResponse>(object) else {
            continue;
        };
        let mut tasks = Vec::new();
        for (index, raw) in response.tasks.into_iter().enumerate() {
            let sentence = raw.sentence.unwrap_or_default().trim().to_string();
            let tool_name = raw.tool_name.unwrap_or_default().trim().to_string();
            if sentence.is_empty() || tool_name.is_empty() || !allowed_tools.contains(tool_name.as_str()) {
                continue;
            }
            let service = raw.service.unwrap_or_default().trim().to_lowercase();
            let task_id = raw.task_id.map(|id| id.trim().to_string()).filter(|id| !id.is_empty()).unwrap_or_else(|| format!("step_{}", index + 1));
            tasks.push(StepwiseTask { task_id, sentence, service, tool_name });
        }
        if !tasks.is_empty() {
            return tasks;
        }
    }
    Vec::new()
}

fn dedup_preserve_order(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for value in values {
        if !value.is_empty() && seen.insert(value.clone()) {
            result.push(value);
        }
    }
    result
}

/// Try to build a `STEPWISE_PIPELINE` plan for `user_text`.
///
/// Applies only when `force_enabled` is set or the request both carries a
/// create/read/update intent and names a connected service (see
/// [`is_stepwise_candidate`]). Returns `None` when the candidate check
/// fails, the catalog ends up empty after policy filtering, or no sentence
/// chunk resolves to a usable tool.
#[allow(clippy::too_many_arguments)]
pub async fn try_build_stepwise_pipeline_plan(
    user_text: &str,
    connected_services: &[String],
    user_id: &str,
    registry: &ToolRegistry,
    granted_scopes: Option<&HashMap<String, HashSet<String>>>,
    allow_high_risk: bool,
    force_enabled: bool,
    llm_providers: &[&dyn LlmProvider],
) -> Option<AgentPlan> {
    if !force_enabled && !is_stepwise_candidate(user_text, connected_services) {
        return None;
    }

    let api_profile = build_runtime_api_profile(
        registry,
        connected_services,
        granted_scopes,
        &TenantPolicy::default(),
        &RiskPolicy { allow_high_risk },
    );
    let enabled_api_ids: HashSet<String> = api_profile.enabled_api_ids.into_iter().collect();

    let tool_catalog = build_tool_catalog(registry, connected_services, &enabled_api_ids);
    if tool_catalog.is_empty() {
        return None;
    }

    let mut tasks = request_tasks_from_llm(llm_providers, user_text, connected_services, &tool_catalog).await;
    if tasks.is_empty() {
        tasks = build_deterministic_tasks(user_text, &tool_catalog);
    }
    if tasks.is_empty() {
        return None;
    }

    let target_services = dedup_preserve_order(tasks.iter().map(|t| t.service.clone()));
    let selected_tools = dedup_preserve_order(tasks.iter().map(|t| t.tool_name.clone()));
    let workflow_steps: Vec<String> = tasks.iter().enumerate().map(|(idx, t)| format!("{}. {}", idx + 1, t.sentence)).collect();

    let normalized_connected = dedup_preserve_order(connected_services.iter().map(|s| s.trim().to_lowercase()));
    let mut sorted_enabled: Vec<String> = enabled_api_ids.into_iter().collect();
    sorted_enabled.sort();
    let catalog_payload = serde_json::json!({
        "connected_services": normalized_connected,
        "enabled_api_ids": sorted_enabled,
        "tool_catalog": tool_catalog,
    });
    let (catalog_id, _created) = conduit_catalog::get_or_create_catalog_id(user_id, &catalog_payload, Duration::from_secs(1800)).ok()?;

    let pipeline_task = AgentTask {
        id: "task_stepwise_pipeline_v1".to_string(),
        title: "llm stepwise sequential pipeline".to_string(),
        task_type: TaskType::StepwisePipeline,
        depends_on: Vec::new(),
        service: None,
        tool_name: None,
        payload: serde_json::json!({
            "tasks": tasks,
            "ctx": {"enabled": true, "catalog_id": catalog_id},
        }),
        instruction: None,
        output_schema: serde_json::json!({"type": "object"}),
    };

    Some(AgentPlan {
        user_text: user_text.to_string(),
        requirements: vec![AgentRequirement::new("llm_stepwise_pipeline")],
        target_services,
        selected_tools,
        workflow_steps,
        tasks: vec![pipeline_task],
        notes: vec![
            "planner=llm_stepwise".to_string(),
            "router_mode=STEPWISE_PIPELINE".to_string(),
            "plan_source=stepwise_template".to_string(),
            format!("catalog_id={catalog_id}"),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use conduit_registry::{IdempotencyKeyPolicy, ToolDefinition};
    use serde_json::json;

    struct NoOpProvider;

    #[async_trait]
    impl LlmProvider for NoOpProvider {
        fn name(&self) -> &str {
            "noop"
        }

        async fn request_json(&self, _system_prompt: &str, _user_prompt: &str) -> Option<serde_json::Value> {
            None
        }
    }

    fn registry_with_notion() -> ToolRegistry {
        ToolRegistry::from_tools(vec![ToolDefinition {
            service: "notion".to_string(),
            tool_name: "notion_create_page".to_string(),
            description: "create a page".to_string(),
            http_method: "POST".to_string(),
            path_template: "/x".to_string(),
            base_url: "https://example.test".to_string(),
            adapter_function: "noop".to_string(),
            input_schema: json!({"type": "object"}),
            required_scopes: Vec::new(),
            idempotency_key_policy: IdempotencyKeyPolicy::None,
            error_map: HashMap::new(),
        }])
    }

    #[tokio::test]
    async fn non_candidate_text_returns_none() {
        let registry = registry_with_notion();
        let connected = vec!["notion".to_string()];
        let provider = NoOpProvider;
        let plan = try_build_stepwise_pipeline_plan(
            "오늘 날씨 어때",
            &connected,
            "user-1",
            &registry,
            None,
            false,
            false,
            &[&provider],
        )
        .await;
        assert!(plan.is_none());
    }

    #[tokio::test]
    async fn falls_back_to_deterministic_tasks_when_llm_declines() {
        let registry = registry_with_notion();
        let connected = vec!["notion".to_string()];
        let provider = NoOpProvider;
        let plan = try_build_stepwise_pipeline_plan(
            "노션에 회의록 페이지 생성해줘",
            &connected,
            "user-2",
            &registry,
            None,
            false,
            false,
            &[&provider],
        )
        .await
        .unwrap();
        assert_eq!(plan.selected_tools, vec!["notion_create_page".to_string()]);
        assert!(plan.notes.iter().any(|n| n == "router_mode=STEPWISE_PIPELINE"));
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].task_type, TaskType::StepwisePipeline);
    }

    #[tokio::test]
    async fn force_enabled_skips_candidate_check() {
        let registry = registry_with_notion();
        let connected = vec!["notion".to_string()];
        let provider = NoOpProvider;
        let plan = try_build_stepwise_pipeline_plan(
            "아무 평범한 문장",
            &connected,
            "user-3",
            &registry,
            None,
            false,
            true,
            &[&provider],
        )
        .await;
        assert!(plan.is_some());
    }
}
