//! Runtime settings for the autonomous-execution loop (§4.17), read from
//! the process environment with typed defaults — small enough that this
//! crate doesn't take on a settings-framework dependency for it.

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<bool>().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<u32>().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<f64>().ok()).unwrap_or(default)
}

/// Mirrors the autonomous-execution settings block of the original
/// orchestrator's `Settings`, read from `LLM_AUTONOMOUS_*` environment
/// variables rather than a `pydantic` model.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Master switch for the autonomous execution loop.
    pub llm_autonomous_enabled: bool,
    /// Percent of eligible users routed to autonomous execution.
    pub llm_autonomous_traffic_percent: u8,
    /// Run autonomous execution in shadow mode (computed but not served).
    pub llm_autonomous_shadow_mode: bool,
    /// Maximum reasoning turns before `turn_limit`.
    pub llm_autonomous_max_turns: u32,
    /// Maximum tool calls before `tool_call_limit`.
    pub llm_autonomous_max_tool_calls: u32,
    /// Wall-clock timeout in seconds before `timeout`.
    pub llm_autonomous_timeout_sec: u32,
    /// Maximum in-loop replans before `replan_limit`.
    pub llm_autonomous_replan_limit: u32,
    /// Treat autonomous failure as final instead of falling back.
    pub llm_autonomous_strict: bool,
    /// Reject tool calls outside the plan's declared target services.
    pub llm_autonomous_strict_tool_scope: bool,
    /// Retry once, with bumped limits, on a bounded autonomous failure.
    pub llm_autonomous_limit_retry_once: bool,
    /// Allow falling back to the rule planner when autonomous execution
    /// doesn't produce a usable plan.
    pub llm_autonomous_rule_fallback_enabled: bool,
    /// Allow the rule-planner fallback to include mutating tool calls.
    pub llm_autonomous_rule_fallback_mutation_enabled: bool,
    /// Disable automatic fallback once progressive execution has started.
    pub llm_autonomous_progressive_no_fallback_enabled: bool,
    /// Run the post-execution verifier over autonomous results.
    pub llm_autonomous_verifier_enabled: bool,
    /// Treat a verifier error as a hard failure instead of passing through.
    pub llm_autonomous_verifier_fail_closed: bool,
    /// Maximum turn history handed to the verifier.
    pub llm_autonomous_verifier_max_history: u32,
    /// Require at least one tool call as evidence before the verifier
    /// accepts a turn.
    pub llm_autonomous_verifier_require_tool_evidence: bool,
    /// Enable the mid-loop guardrail that aborts a runaway loop early.
    pub llm_autonomous_guardrail_enabled: bool,
    /// Tool error rate above which the guardrail aborts the loop.
    pub llm_autonomous_guardrail_tool_error_rate_threshold: f64,
    /// Minimum tool call samples before the error-rate guardrail applies.
    pub llm_autonomous_guardrail_min_tool_samples: u32,
    /// Replan ratio above which the guardrail aborts the loop.
    pub llm_autonomous_guardrail_replan_ratio_threshold: f64,
    /// Cross-service tool call count above which the guardrail aborts.
    pub llm_autonomous_guardrail_cross_service_block_threshold: u32,
}

impl RuntimeConfig {
    /// Read every `LLM_AUTONOMOUS_*` variable from the environment,
    /// falling back to the same defaults as the original settings model.
    pub fn from_env() -> Self {
        Self {
            llm_autonomous_enabled: env_bool("LLM_AUTONOMOUS_ENABLED", false),
            llm_autonomous_traffic_percent: env_u32("LLM_AUTONOMOUS_TRAFFIC_PERCENT", 100).min(100) as u8,
            llm_autonomous_shadow_mode: env_bool("LLM_AUTONOMOUS_SHADOW_MODE", false),
            llm_autonomous_max_turns: env_u32("LLM_AUTONOMOUS_MAX_TURNS", 6),
            llm_autonomous_max_tool_calls: env_u32("LLM_AUTONOMOUS_MAX_TOOL_CALLS", 8),
            llm_autonomous_timeout_sec: env_u32("LLM_AUTONOMOUS_TIMEOUT_SEC", 45),
            llm_autonomous_replan_limit: env_u32("LLM_AUTONOMOUS_REPLAN_LIMIT", 1),
            llm_autonomous_strict: env_bool("LLM_AUTONOMOUS_STRICT", false),
            llm_autonomous_strict_tool_scope: env_bool("LLM_AUTONOMOUS_STRICT_TOOL_SCOPE", true),
            llm_autonomous_limit_retry_once: env_bool("LLM_AUTONOMOUS_LIMIT_RETRY_ONCE", true),
            llm_autonomous_rule_fallback_enabled: env_bool("LLM_AUTONOMOUS_RULE_FALLBACK_ENABLED", true),
            llm_autonomous_rule_fallback_mutation_enabled: env_bool("LLM_AUTONOMOUS_RULE_FALLBACK_MUTATION_ENABLED", false),
            llm_autonomous_progressive_no_fallback_enabled: env_bool("LLM_AUTONOMOUS_PROGRESSIVE_NO_FALLBACK_ENABLED", true),
            llm_autonomous_verifier_enabled: env_bool("LLM_AUTONOMOUS_VERIFIER_ENABLED", false),
            llm_autonomous_verifier_fail_closed: env_bool("LLM_AUTONOMOUS_VERIFIER_FAIL_CLOSED", false),
            llm_autonomous_verifier_max_history: env_u32("LLM_AUTONOMOUS_VERIFIER_MAX_HISTORY", 8),
            llm_autonomous_verifier_require_tool_evidence: env_bool("LLM_AUTONOMOUS_VERIFIER_REQUIRE_TOOL_EVIDENCE", true),
            llm_autonomous_guardrail_enabled: env_bool("LLM_AUTONOMOUS_GUARDRAIL_ENABLED", true),
            llm_autonomous_guardrail_tool_error_rate_threshold: env_f64("LLM_AUTONOMOUS_GUARDRAIL_TOOL_ERROR_RATE_THRESHOLD", 0.6),
            llm_autonomous_guardrail_min_tool_samples: env_u32("LLM_AUTONOMOUS_GUARDRAIL_MIN_TOOL_SAMPLES", 2),
            llm_autonomous_guardrail_replan_ratio_threshold: env_f64("LLM_AUTONOMOUS_GUARDRAIL_REPLAN_RATIO_THRESHOLD", 0.5),
            llm_autonomous_guardrail_cross_service_block_threshold: env_u32("LLM_AUTONOMOUS_GUARDRAIL_CROSS_SERVICE_BLOCK_THRESHOLD", 1),
        }
    }

    /// Bump the bounded-retry limits the way the original loop does
    /// before its single autonomous retry attempt.
    pub fn retry_overrides(&self) -> RetryOverrides {
        RetryOverrides {
            max_turns: (self.llm_autonomous_max_turns + 2).max(2),
            max_tool_calls: (self.llm_autonomous_max_tool_calls + 2).max(2),
            timeout_sec: (self.llm_autonomous_timeout_sec + 15).max(10),
            replan_limit: self.llm_autonomous_replan_limit + 1,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Bumped limits for the single bounded-failure retry (§4.17 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOverrides {
    /// Turn limit for the retry attempt.
    pub max_turns: u32,
    /// Tool-call limit for the retry attempt.
    pub max_tool_calls: u32,
    /// Timeout, in seconds, for the retry attempt.
    pub timeout_sec: u32,
    /// Replan limit for the retry attempt.
    pub replan_limit: u32,
}
