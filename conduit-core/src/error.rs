//! Canonical error taxonomy shared by every crate in the workspace.
//!
//! Two vocabularies coexist: pipeline-specific codes raised by the DAG
//! executor (`PipelineErrorCode`), and business codes surfaced by the
//! orchestrator to the end user (`BusinessErrorCode`). Individual crates
//! still define their own `thiserror` enums for internal propagation; these
//! are the stable strings that cross a component boundary (log rows, link
//! rows, user-facing messages).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised inside pipeline DAG execution (§6, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineErrorCode {
    /// The DAG failed a structural or schema check before execution.
    DslValidationFailed,
    /// A `$node_id.path` or `$item.path` reference did not resolve.
    DslRefNotFound,
    /// An `llm_transform` node's autofill step failed.
    LlmAutofillFailed,
    /// The tool invocation was rejected for an auth reason.
    ToolAuthError,
    /// The tool invocation was rate limited. Retryable.
    ToolRateLimited,
    /// The tool invocation exceeded its timeout. Retryable.
    ToolTimeout,
    /// A `verify` node's rule evaluated to false.
    VerifyCountMismatch,
    /// Best-effort compensation could not fully undo prior mutations.
    CompensationFailed,
    /// The overall pipeline deadline elapsed.
    PipelineTimeout,
}

impl PipelineErrorCode {
    /// Stable screaming-snake-case string form, as written to logs and link rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DslValidationFailed => "DSL_VALIDATION_FAILED",
            Self::DslRefNotFound => "DSL_REF_NOT_FOUND",
            Self::LlmAutofillFailed => "LLM_AUTOFILL_FAILED",
            Self::ToolAuthError => "TOOL_AUTH_ERROR",
            Self::ToolRateLimited => "TOOL_RATE_LIMITED",
            Self::ToolTimeout => "TOOL_TIMEOUT",
            Self::VerifyCountMismatch => "VERIFY_COUNT_MISMATCH",
            Self::CompensationFailed => "COMPENSATION_FAILED",
            Self::PipelineTimeout => "PIPELINE_TIMEOUT",
        }
    }

    /// Parse from the wire string form. Unknown strings return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "DSL_VALIDATION_FAILED" => Self::DslValidationFailed,
            "DSL_REF_NOT_FOUND" => Self::DslRefNotFound,
            "LLM_AUTOFILL_FAILED" => Self::LlmAutofillFailed,
            "TOOL_AUTH_ERROR" => Self::ToolAuthError,
            "TOOL_RATE_LIMITED" => Self::ToolRateLimited,
            "TOOL_TIMEOUT" => Self::ToolTimeout,
            "VERIFY_COUNT_MISMATCH" => Self::VerifyCountMismatch,
            "COMPENSATION_FAILED" => Self::CompensationFailed,
            "PIPELINE_TIMEOUT" => Self::PipelineTimeout,
            _ => return None,
        })
    }

    /// Whether the executor's retry policy should retry a node that failed
    /// with this code. Property 10 (§8): true exactly for
    /// `TOOL_RATE_LIMITED` and `TOOL_TIMEOUT`.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ToolRateLimited | Self::ToolTimeout)
    }
}

impl fmt::Display for PipelineErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a wire-form pipeline error code is retryable. Unknown codes are
/// treated as non-retryable (terminal), mirroring
/// `is_retryable_pipeline_error`'s `ValueError` → `False` fallback.
pub fn is_retryable_pipeline_error(code: &str) -> bool {
    PipelineErrorCode::parse(code)
        .map(|c| c.is_retryable())
        .unwrap_or(false)
}

/// Business-facing error codes surfaced in `AgentRunResult`/`AgentExecutionResult`
/// artifacts (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessErrorCode {
    /// The request failed local input validation.
    ValidationError,
    /// The upstream service rejected credentials.
    AuthError,
    /// No OAuth token is on file for the required service.
    TokenMissing,
    /// The plan named a service the user has not connected.
    ServiceNotConnected,
    /// The upstream service is rate limiting the caller.
    RateLimited,
    /// The requested resource does not exist upstream.
    NotFound,
    /// The upstream service returned an unexpected error.
    UpstreamError,
    /// A tool or DAG node failed during execution.
    ExecutionError,
    /// Post-execution verification found the plan's obligations unmet.
    VerificationFailed,
    /// The orchestrator needs another turn of slot collection from the user.
    ClarificationNeeded,
    /// The risk/scope policy gate blocked the request.
    RiskGateBlocked,
    /// A tool invocation failed for a reason with no more specific code.
    ToolFailed,
}

impl BusinessErrorCode {
    /// Stable snake_case string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::AuthError => "auth_error",
            Self::TokenMissing => "token_missing",
            Self::ServiceNotConnected => "service_not_connected",
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::UpstreamError => "upstream_error",
            Self::ExecutionError => "execution_error",
            Self::VerificationFailed => "verification_failed",
            Self::ClarificationNeeded => "clarification_needed",
            Self::RiskGateBlocked => "risk_gate_blocked",
            Self::ToolFailed => "tool_failed",
        }
    }
}

impl fmt::Display for BusinessErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
