//! Plan construction (§4.17 step 2): try the LLM planner first, falling
//! back to the deterministic rule planner and recording why.

use conduit_plan::{AgentPlan, PlanSource};
use conduit_planner_llm::{request_plan, LlmProvider};
use conduit_planner_rule::{build_agent_plan, GuideRetriever};
use conduit_registry::ToolRegistry;

/// Build a plan for `user_text`: ask `llm_providers` first (in order), and
/// fall back to the rule planner on any failure, appending
/// `llm_planner_fallback:{reason}` to the fallback plan's notes.
pub async fn build_plan(
    user_text: &str,
    connected_services: &[String],
    registry: &ToolRegistry,
    llm_providers: &[&dyn LlmProvider],
    llm_system_prompt: &str,
    llm_user_prompt: &str,
    guide_retriever: Option<&dyn GuideRetriever>,
) -> (AgentPlan, PlanSource) {
    if llm_providers.is_empty() {
        let plan = build_agent_plan(user_text, connected_services, registry, guide_retriever);
        return (plan, PlanSource::Rule);
    }

    match request_plan(llm_providers, user_text, llm_system_prompt, llm_user_prompt, connected_services, registry).await {
        Ok(plan) => (plan, PlanSource::Llm),
        Err(failure) => {
            let mut plan = build_agent_plan(user_text, connected_services, registry, guide_retriever);
            plan.push_note(format!("llm_planner_fallback:{}", failure.reason_tag()));
            (plan, PlanSource::Rule)
        }
    }
}
