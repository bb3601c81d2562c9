//! Requesting and validating an LLM-produced plan.

use std::collections::HashSet;

use conduit_plan::{AgentPlan, AgentRequirement};
use conduit_registry::ToolRegistry;
use serde::Deserialize;

use crate::provider::LlmProvider;

/// Why the LLM planner produced no usable plan. Recorded by the
/// orchestrator as `llm_planner_fallback:{reason}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanRequestFailure {
    /// Every provider returned `None` or unparsable JSON.
    NoProviderSucceeded,
    /// The response's `target_services` was missing or not a subset of
    /// `connected_services`.
    TargetServicesNotConnected,
    /// A selected tool name doesn't exist in the registry.
    UnknownTool(String),
}

impl PlanRequestFailure {
    /// The `{reason}` tag recorded alongside `llm_planner_fallback:`.
    pub fn reason_tag(&self) -> String {
        match self {
            Self::NoProviderSucceeded => "no_provider_succeeded".to_string(),
            Self::TargetServicesNotConnected => "target_services_not_connected".to_string(),
            Self::UnknownTool(name) => format!("unknown_tool:{name}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LlmPlanResponse {
    #[serde(default)]
    requirements: Vec<AgentRequirement>,
    #[serde(default)]
    target_services: Vec<String>,
    #[serde(default)]
    selected_tools: Vec<String>,
    #[serde(default)]
    workflow_steps: Vec<String>,
}

fn validate_response(response: &LlmPlanResponse, connected_services: &[String], registry: &ToolRegistry) -> Result<(), PlanRequestFailure> {
    let connected: HashSet<String> = connected_services.iter().map(|s| s.trim().to_lowercase()).collect();
    if response.target_services.is_empty() || !response.target_services.iter().all(|s| connected.contains(&s.trim().to_lowercase())) {
        return Err(PlanRequestFailure::TargetServicesNotConnected);
    }
    for tool_name in &response.selected_tools {
        if registry.get_tool(tool_name).is_err() {
            return Err(PlanRequestFailure::UnknownTool(tool_name.clone()));
        }
    }
    Ok(())
}

/// Try `providers` in order (primary, then fallback) for a JSON plan under
/// `system_prompt`/`user_prompt`. The first provider whose response both
/// parses as a JSON object and passes [`validate_response`] wins; its plan
/// is annotated with an `llm_provider=…` note. Returns the last validation
/// failure seen (or [`PlanRequestFailure::NoProviderSucceeded`] if nothing
/// even parsed) when every provider is exhausted.
pub async fn request_plan(
    providers: &[&dyn LlmProvider],
    user_text: &str,
    system_prompt: &str,
    user_prompt: &str,
    connected_services: &[String],
    registry: &ToolRegistry,
) -> Result<AgentPlan, PlanRequestFailure> {
    let mut last_failure = PlanRequestFailure::NoProviderSucceeded;

    for provider in providers {
        let Some(object) = provider.request_json(system_prompt, user_prompt).await else {
            continue;
        };
        let response: LlmPlanResponse = match serde_json::from_value(object) {
            Ok(response) => response,
            Err(_) => continue,
        };
        match validate_response(&response, connected_services, registry) {
            Ok(()) => {
                let mut workflow_steps = response.workflow_steps;
                if !response.selected_tools.is_empty() {
                    workflow_steps.push(format!("실행 예정 API 순서: {}", response.selected_tools.join(" -> ")));
                }
                let mut plan = AgentPlan {
                    user_text: user_text.to_string(),
                    requirements: response.requirements,
                    target_services: response.target_services,
                    selected_tools: response.selected_tools,
                    workflow_steps,
                    tasks: Vec::new(),
                    notes: Vec::new(),
                };
                plan.push_note(format!("llm_provider={}", provider.name()));
                return Ok(plan);
            }
            Err(failure) => last_failure = failure,
        }
    }

    Err(last_failure)
}
