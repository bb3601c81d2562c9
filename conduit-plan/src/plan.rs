//! Plan-level types: requirements, the plan itself, and run results.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::task::AgentTask;

/// A single extracted piece of what the user asked for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequirement {
    /// Short human-readable description of the requirement.
    pub summary: String,
    /// Parsed quantity, when the request named a count.
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Free-form constraints extracted from the request text.
    #[serde(default)]
    pub constraints: Vec<String>,
}

impl AgentRequirement {
    /// Build a requirement with no quantity and no constraints.
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            quantity: None,
            constraints: Vec::new(),
        }
    }
}

/// The declarative outcome of planning: requirements, target services,
/// selected tools, human-readable steps, and the typed tasks to execute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentPlan {
    /// The original user request text this plan was built from.
    pub user_text: String,
    /// Requirements extracted from `user_text`.
    pub requirements: Vec<AgentRequirement>,
    /// Services the plan touches.
    pub target_services: Vec<String>,
    /// Tool names selected for this plan.
    pub selected_tools: Vec<String>,
    /// Human-readable description of each step, for display.
    pub workflow_steps: Vec<String>,
    /// Typed tasks to execute, in declaration order.
    #[serde(default)]
    pub tasks: Vec<AgentTask>,
    /// Free-form notes accumulated during planning (fallback reasons,
    /// provider annotations, catalog ids).
    #[serde(default)]
    pub notes: Vec<String>,
}

impl AgentPlan {
    /// Append a note, e.g. `"llm_planner_fallback:timeout"`.
    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }
}

/// One step of an execution trace, for display and debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecutionStep {
    /// Step name, usually a task or node id.
    pub name: String,
    /// Outcome status, e.g. `"ok"`, `"failed"`, `"skipped"`.
    pub status: String,
    /// Human-readable detail.
    pub detail: String,
}

/// The result of running a plan's tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecutionResult {
    /// Whether the run overall succeeded.
    pub success: bool,
    /// User-facing message describing the outcome.
    pub user_message: String,
    /// Short machine-oriented summary.
    pub summary: String,
    /// Structured key-value facts about the run (error codes, router mode,
    /// pipeline run id, and similar).
    #[serde(default)]
    pub artifacts: HashMap<String, String>,
    /// Per-step execution trace.
    #[serde(default)]
    pub steps: Vec<AgentExecutionStep>,
}

impl AgentExecutionResult {
    /// Read an artifact by key as a typed JSON-ish string, or `None`.
    pub fn artifact(&self, key: &str) -> Option<&str> {
        self.artifacts.get(key).map(String::as_str)
    }
}

/// Where a plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    /// Built deterministically by the rule-based planner (C9).
    Rule,
    /// Requested from an LLM provider (C10).
    Llm,
    /// Built by the stepwise planner (C11).
    Stepwise,
}

impl Default for PlanSource {
    fn default() -> Self {
        Self::Rule
    }
}

/// The top-level result of `run_agent_analysis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRunResult {
    /// Whether the run completed successfully end to end.
    pub ok: bool,
    /// The stage the run stopped at, e.g. `"validation"`, `"execution"`, `"done"`.
    pub stage: String,
    /// The plan this result came from.
    pub plan: AgentPlan,
    /// Short human-readable result summary.
    pub result_summary: String,
    /// Execution result, present once execution was attempted.
    #[serde(default)]
    pub execution: Option<AgentExecutionResult>,
    /// Which planner produced `plan`.
    #[serde(default)]
    pub plan_source: PlanSource,
}

/// Reusable JSON-value payload alias, used throughout task and node inputs.
pub type Payload = Value;
