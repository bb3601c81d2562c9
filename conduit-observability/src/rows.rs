//! The two log row shapes the orchestrator writes: one per
//! `run_agent_analysis` call, one per DAG node.

use serde::{Deserialize, Serialize};

/// One `run_agent_analysis` call, including its plan source and the
/// opaque `detail` k=v string consumed by rollout evaluators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandLogRow {
    /// Owning user.
    pub user_id: String,
    /// Always `"agent_plan"` for this orchestrator.
    pub command: String,
    /// Coarse outcome status, e.g. `"ok"`, `"validation_error"`.
    pub status: String,
    /// Final settled status after any autonomous-execution fallback.
    pub final_status: String,
    /// Which planner produced the plan (`"rule"`, `"llm"`, `"stepwise"`).
    pub plan_source: String,
    /// Which executor ran the plan (`"classical"`, `"dag"`, `"autonomous"`).
    pub execution_mode: String,
    /// Canonical error code, present on failure.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Why post-execution verification rejected the result, if it did.
    #[serde(default)]
    pub verification_reason: Option<String>,
    /// Why the autonomous executor fell back to classical execution, if
    /// it did.
    #[serde(default)]
    pub autonomous_fallback_reason: Option<String>,
    /// Opaque `k=v;k=v` detail string; see [`crate::DetailBuilder`].
    pub detail: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// One DAG node's execution outcome, within one `request_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStepLogRow {
    /// The orchestrator call this step belongs to.
    pub request_id: String,
    /// The DAG run this step belongs to.
    pub pipeline_run_id: String,
    /// Node id within the DAG.
    pub node_id: String,
    /// Node type, e.g. `"skill"`, `"llm_transform"`, `"for_each"`, `"verify"`.
    pub node_type: String,
    /// Outcome status, e.g. `"ok"`, `"failed"`, `"compensated"`.
    pub status: String,
    /// Canonical error code, present on failure.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Wall-clock duration of this node's execution, in milliseconds.
    pub latency_ms: u64,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}
