//! The per-sentence task shape both the LLM and the deterministic
//! fallback produce, before they're wrapped into a `STEPWISE_PIPELINE`
//! plan task.

use serde::{Deserialize, Serialize};

/// One sentence chunk resolved to a single tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepwiseTask {
    /// Unique id within this pipeline, e.g. `step_1`.
    pub task_id: String,
    /// The source sentence this task was built from.
    pub sentence: String,
    /// Owning service.
    pub service: String,
    /// Fully-qualified tool name.
    pub tool_name: String,
}
