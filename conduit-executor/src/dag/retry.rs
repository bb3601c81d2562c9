//! Retry policy for DAG `skill` node tool invocations (§4.13.2): only
//! `TOOL_RATE_LIMITED` and `TOOL_TIMEOUT` are retryable, with linear
//! backoff between attempts.

use std::time::Duration;

use conduit_core::error::is_retryable_pipeline_error;

/// Bounds one node's retry behavior.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Backoff added per additional attempt, linearly.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Build a policy from the raw config values
    /// (`stepwise_tool_retry_max_attempts`, `stepwise_tool_retry_backoff_ms`).
    pub fn new(max_attempts: u32, backoff_ms: u64) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff: Duration::from_millis(backoff_ms) }
    }

    /// Delay to wait before the given 1-indexed attempt number, e.g.
    /// before attempt 2, wait `backoff * 1`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.backoff * attempt.saturating_sub(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 500)
    }
}

/// Retry an operation returning `Result<T, String>` where the error is a
/// bare pipeline error code (e.g. `"TOOL_RATE_LIMITED"`). Non-retryable
/// errors return immediately. Exhausting attempts returns the last error.
pub async fn retry_with_policy<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T, String>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, String>>,
{
    let mut attempt = 1;
    loop {
        if attempt > 1 {
            tokio::time::sleep(policy.delay_before(attempt)).await;
        }
        match operation().await {
            Ok(value) => return Ok(value),
            Err(code) if attempt < policy.max_attempts && is_retryable_pipeline_error(&code) => {
                attempt += 1;
                continue;
            }
            Err(code) => return Err(code),
        }
    }
}
