//! The bounded autonomous-execution loop (§4.17 step 4): turn-by-turn tool
//! calling under a turn/tool-call/timeout/replan budget, used only when
//! the rollout controller has routed the plan to `autonomous_execution`.
//!
//! The original orchestrator's loop defers to a separate `agent.autonomous`
//! module that isn't part of this corpus; this loop reconstructs its
//! externally-visible contract (the bounded `error_code`s the caller
//! retries on) from how `run_agent_analysis` consumes it.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use conduit_plan::{AgentExecutionResult, AgentExecutionStep, AgentPlan};
use serde_json::Value;

use crate::config::RetryOverrides;
use conduit_executor::ToolInvoker;

/// One decision the autonomous agent makes per turn.
#[derive(Debug, Clone)]
pub enum AutonomousAction {
    /// Invoke a tool and feed its result back into the next turn.
    ToolCall {
        /// Fully-qualified tool name.
        tool_name: String,
        /// Resolved payload for the call.
        payload: Value,
    },
    /// Abandon the current plan and ask the caller to replan.
    Replan,
    /// End the loop with a final result.
    Finish {
        /// Whether the loop accomplished the user's request.
        success: bool,
        /// Short machine summary.
        summary: String,
        /// Human-readable message.
        user_message: String,
    },
}

/// One already-executed turn, fed back to [`AutonomousAgent::next_action`]
/// so it can condition on prior tool outcomes.
#[derive(Debug, Clone)]
pub struct AutonomousStep {
    /// The tool that was called.
    pub tool_name: String,
    /// Whether the call succeeded.
    pub ok: bool,
    /// The canonical error code, when it failed.
    pub error_code: Option<String>,
}

/// Chooses the next action given the plan and history so far. Injected
/// rather than tied to a concrete LLM backend, mirroring
/// `conduit-executor::TaskSummarizer`.
#[async_trait]
pub trait AutonomousAgent: Send + Sync {
    /// Decide the next action for this turn.
    async fn next_action(&self, plan: &AgentPlan, history: &[AutonomousStep]) -> AutonomousAction;
}

/// Turn/tool-call/timeout/replan budget for one loop invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutonomousLimits {
    /// Maximum number of turns.
    pub max_turns: u32,
    /// Maximum number of tool calls across all turns.
    pub max_tool_calls: u32,
    /// Wall-clock timeout in seconds.
    pub timeout_sec: u32,
    /// Maximum number of `Replan` actions before giving up.
    pub replan_limit: u32,
}

impl AutonomousLimits {
    /// Build limits from the bumped values used for the single retry
    /// attempt (§4.17 step 4).
    pub fn from_overrides(overrides: RetryOverrides) -> Self {
        Self {
            max_turns: overrides.max_turns,
            max_tool_calls: overrides.max_tool_calls,
            timeout_sec: overrides.timeout_sec,
            replan_limit: overrides.replan_limit,
        }
    }
}

fn bounded_failure(error_code: &str, steps: Vec<AgentExecutionStep>) -> AgentExecutionResult {
    let mut artifacts = HashMap::new();
    artifacts.insert("error_code".to_string(), error_code.to_string());
    AgentExecutionResult {
        success: false,
        user_message: "자율 실행 한도에 도달하여 중단했습니다.".to_string(),
        summary: format!("autonomous execution stopped: {error_code}"),
        artifacts,
        steps,
    }
}

/// Run the bounded loop: ask `agent` for an action each turn, executing
/// tool calls against `invoker`, until it finishes or a limit trips.
/// `artifacts.error_code` on a bounded failure is one of `turn_limit`,
/// `tool_call_limit`, `replan_limit`, or `timeout` — the set the caller
/// treats as retryable.
pub async fn run_autonomous_loop(
    user_id: &str,
    plan: &AgentPlan,
    agent: &dyn AutonomousAgent,
    invoker: &dyn ToolInvoker,
    limits: AutonomousLimits,
) -> AgentExecutionResult {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(limits.timeout_sec as u64);
    let mut history: Vec<AutonomousStep> = Vec::new();
    let mut steps: Vec<AgentExecutionStep> = Vec::new();
    let mut tool_calls = 0u32;
    let mut replans = 0u32;

    for turn in 1..=limits.max_turns {
        if tokio::time::Instant::now() >= deadline {
            return bounded_failure("timeout", steps);
        }

        match agent.next_action(plan, &history).await {
            AutonomousAction::Finish { success, summary, user_message } => {
                return AgentExecutionResult { success, summary, user_message, artifacts: HashMap::new(), steps };
            }
            AutonomousAction::Replan => {
                replans += 1;
                if replans > limits.replan_limit {
                    return bounded_failure("replan_limit", steps);
                }
                steps.push(AgentExecutionStep { name: format!("turn_{turn}"), status: "replanned".to_string(), detail: "replan".to_string() });
            }
            AutonomousAction::ToolCall { tool_name, payload } => {
                tool_calls += 1;
                if tool_calls > limits.max_tool_calls {
                    return bounded_failure("tool_call_limit", steps);
                }
                let outcome = invoker.invoke(user_id, &tool_name, &payload).await;
                let status = if outcome.ok { "ok" } else { "failed" };
                let detail = outcome.error_code.clone().unwrap_or_else(|| tool_name.clone());
                steps.push(AgentExecutionStep { name: tool_name.clone(), status: status.to_string(), detail });
                history.push(AutonomousStep { tool_name, ok: outcome.ok, error_code: outcome.error_code });
            }
        }
    }

    bounded_failure("turn_limit", steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_executor::ToolInvocationOutcome;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct StubInvoker;

    #[async_trait]
    impl ToolInvoker for StubInvoker {
        async fn invoke(&self, _user_id: &str, _tool_name: &str, _payload: &Value) -> ToolInvocationOutcome {
            ToolInvocationOutcome { ok: true, data: Some(json!({})), error_code: None }
        }
    }

    struct FinishesImmediately;

    #[async_trait]
    impl AutonomousAgent for FinishesImmediately {
        async fn next_action(&self, _plan: &AgentPlan, _history: &[AutonomousStep]) -> AutonomousAction {
            AutonomousAction::Finish { success: true, summary: "done".to_string(), user_message: "완료했습니다.".to_string() }
        }
    }

    struct AlwaysCallsTool;

    #[async_trait]
    impl AutonomousAgent for AlwaysCallsTool {
        async fn next_action(&self, _plan: &AgentPlan, _history: &[AutonomousStep]) -> AutonomousAction {
            AutonomousAction::ToolCall { tool_name: "notion_search".to_string(), payload: json!({}) }
        }
    }

    struct AlwaysReplans;

    #[async_trait]
    impl AutonomousAgent for AlwaysReplans {
        async fn next_action(&self, _plan: &AgentPlan, _history: &[AutonomousStep]) -> AutonomousAction {
            AutonomousAction::Replan
        }
    }

    struct CountingToolAgent {
        calls: AtomicU32,
        finish_after: u32,
        seen: Mutex<Vec<bool>>,
    }

    #[async_trait]
    impl AutonomousAgent for CountingToolAgent {
        async fn next_action(&self, _plan: &AgentPlan, history: &[AutonomousStep]) -> AutonomousAction {
            self.seen.lock().unwrap().push(history.last().map(|s| s.ok).unwrap_or(true));
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n >= self.finish_after {
                AutonomousAction::Finish { success: true, summary: "done".to_string(), user_message: "ok".to_string() }
            } else {
                AutonomousAction::ToolCall { tool_name: "notion_search".to_string(), payload: json!({}) }
            }
        }
    }

    fn plan() -> AgentPlan {
        AgentPlan {
            user_text: "x".to_string(),
            requirements: Vec::new(),
            target_services: vec!["notion".to_string()],
            selected_tools: Vec::new(),
            workflow_steps: Vec::new(),
            tasks: Vec::new(),
            notes: Vec::new(),
        }
    }

    fn limits(max_turns: u32, max_tool_calls: u32, replan_limit: u32) -> AutonomousLimits {
        AutonomousLimits { max_turns, max_tool_calls, timeout_sec: 30, replan_limit }
    }

    #[tokio::test]
    async fn finishes_on_the_first_turn() {
        let result = run_autonomous_loop("u1", &plan(), &FinishesImmediately, &StubInvoker, limits(6, 8, 1)).await;
        assert!(result.success);
        assert!(result.steps.is_empty());
    }

    #[tokio::test]
    async fn exhausting_turns_reports_turn_limit() {
        let agent = CountingToolAgent { calls: AtomicU32::new(0), finish_after: 100, seen: Mutex::new(Vec::new()) };
        let result = run_autonomous_loop("u1", &plan(), &agent, &StubInvoker, limits(3, 100, 1)).await;
        assert!(!result.success);
        assert_eq!(result.artifact("error_code"), Some("turn_limit"));
        assert_eq!(result.steps.len(), 3);
    }

    #[tokio::test]
    async fn exceeding_tool_call_budget_reports_tool_call_limit() {
        let result = run_autonomous_loop("u1", &plan(), &AlwaysCallsTool, &StubInvoker, limits(10, 2, 1)).await;
        assert!(!result.success);
        assert_eq!(result.artifact("error_code"), Some("tool_call_limit"));
    }

    #[tokio::test]
    async fn exceeding_replan_budget_reports_replan_limit() {
        let result = run_autonomous_loop("u1", &plan(), &AlwaysReplans, &StubInvoker, limits(10, 8, 1)).await;
        assert!(!result.success);
        assert_eq!(result.artifact("error_code"), Some("replan_limit"));
    }
}
