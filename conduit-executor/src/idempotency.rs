//! Idempotency (§4.13.4): a tool call whose [`IdempotencyKeyPolicy`] yields
//! a key is deduplicated within a run — if that key already produced a
//! successful [`ToolInvocationOutcome`], the cached result is reused
//! instead of invoking the tool again.

use std::collections::HashMap;
use std::sync::Mutex;

use conduit_registry::IdempotencyKeyPolicy;

pub use crate::invoker::idempotency_key;
use crate::invoker::ToolInvocationOutcome;

/// Tracks successful outcomes by `(tool_name, idempotency_key)` for the
/// lifetime of one run. Not shared across runs.
#[derive(Default)]
pub struct IdempotencyTracker {
    seen: Mutex<HashMap<(String, String), ToolInvocationOutcome>>,
    reuse_count: Mutex<u64>,
}

impl IdempotencyTracker {
    /// A tracker with no recorded outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// A previously recorded successful outcome for `(tool_name, key)`,
    /// if any. Each hit increments [`Self::reuse_count`].
    pub fn lookup(&self, tool_name: &str, key: &str) -> Option<ToolInvocationOutcome> {
        let seen = self.seen.lock().unwrap();
        let hit = seen.get(&(tool_name.to_string(), key.to_string())).cloned();
        if hit.is_some() {
            *self.reuse_count.lock().unwrap() += 1;
        }
        hit
    }

    /// Record a successful outcome under `(tool_name, key)` for later reuse.
    pub fn record(&self, tool_name: &str, key: &str, outcome: ToolInvocationOutcome) {
        if outcome.ok {
            self.seen.lock().unwrap().insert((tool_name.to_string(), key.to_string()), outcome);
        }
    }

    /// How many times a cached outcome was returned instead of invoking
    /// the tool again. Reported as `idempotent_success_reuse_count`.
    pub fn reuse_count(&self) -> u64 {
        *self.reuse_count.lock().unwrap()
    }
}

/// `true` when `policy` derives a key at all — callers skip tracking
/// entirely for [`IdempotencyKeyPolicy::None`].
pub fn is_idempotent(policy: &IdempotencyKeyPolicy) -> bool {
    !matches!(policy, IdempotencyKeyPolicy::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok_outcome() -> ToolInvocationOutcome {
        ToolInvocationOutcome { ok: true, data: Some(json!({"id": "abc"})), error_code: None }
    }

    #[test]
    fn lookup_misses_until_recorded() {
        let tracker = IdempotencyTracker::new();
        assert!(tracker.lookup("notion_create_page", "key-1").is_none());
        tracker.record("notion_create_page", "key-1", ok_outcome());
        assert!(tracker.lookup("notion_create_page", "key-1").is_some());
        assert_eq!(tracker.reuse_count(), 1);
    }

    #[test]
    fn failures_are_never_cached() {
        let tracker = IdempotencyTracker::new();
        let failure = ToolInvocationOutcome { ok: false, data: None, error_code: Some("x".to_string()) };
        tracker.record("notion_create_page", "key-1", failure);
        assert!(tracker.lookup("notion_create_page", "key-1").is_none());
    }

    #[test]
    fn none_policy_is_never_idempotent() {
        assert!(!is_idempotent(&IdempotencyKeyPolicy::None));
        assert!(is_idempotent(&IdempotencyKeyPolicy::EventId));
        assert!(is_idempotent(&IdempotencyKeyPolicy::Hash));
    }
}
