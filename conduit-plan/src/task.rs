//! The [`AgentTask`] type shared by both execution modes (§4.13.1, §4.13.3).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What kind of work a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// Delegates to a single tool invocation.
    Tool,
    /// Delegates to an LLM summarisation/transform capability.
    Llm,
    /// Delegates to a full pipeline DAG (`conduit-executor`'s DAG mode).
    PipelineDag,
    /// Delegates to the stepwise pipeline's deterministic/LLM task list.
    StepwisePipeline,
}

/// A single node in a plan's task list.
///
/// `TOOL` tasks require a non-empty `service` present in the plan's
/// `target_services` and a `tool_name` starting with `{service}_`. `LLM`
/// tasks require a non-empty `instruction`. All tasks require a non-empty
/// `output_schema` object and every id in `depends_on` to resolve inside
/// the same plan — `conduit-plan-validate` enforces both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTask {
    /// Unique id within the owning plan.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// What kind of work this task performs.
    pub task_type: TaskType,
    /// Ids of tasks that must complete before this one runs.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Target service, required for `TOOL` tasks.
    #[serde(default)]
    pub service: Option<String>,
    /// Tool name, required for `TOOL` tasks.
    #[serde(default)]
    pub tool_name: Option<String>,
    /// Task input payload.
    #[serde(default)]
    pub payload: Value,
    /// Natural-language instruction, required for `LLM` tasks.
    #[serde(default)]
    pub instruction: Option<String>,
    /// Non-empty JSON-Schema object describing the task's output.
    pub output_schema: Value,
}

impl AgentTask {
    /// Whether this task's `tool_name` contains an OAuth-adjacent verb
    /// that must never be reachable from a plan (`oauth`, `token_exchange`).
    pub fn has_forbidden_tool_verb(&self) -> bool {
        match &self.tool_name {
            Some(name) => name.contains("oauth") || name.contains("token_exchange"),
            None => false,
        }
    }
}
