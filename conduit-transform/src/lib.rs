//! # conduit-transform
//!
//! Pure JSON-to-JSON transform contracts invoked by `LLM_TRANSFORM` DAG
//! nodes. Each transform is a deterministic function of its payload; none
//! of them call out to a network or a clock.

#![deny(missing_docs)]

mod event;
mod filter;
mod linear;
mod minutes;

pub use event::{normalize_event, resolve_event, NormalizedEvent};
pub use filter::filter_meeting_events;
pub use linear::format_linear_meeting_issue;
pub use minutes::format_detailed_minutes;

use serde_json::Value;

/// Run the transform named `transform_name` against `payload`.
///
/// Unknown names pass `payload` through unchanged (cloned), matching the
/// original contract dispatcher's no-op default rather than erroring —
/// an unrecognized transform name is a planning-time contract violation
/// the DAG validator should have already caught.
pub fn run_transform_contract(transform_name: &str, payload: &Value) -> Value {
    match transform_name.trim() {
        "filter_meeting_events" => filter_meeting_events(payload),
        "format_detailed_minutes" => format_detailed_minutes(payload),
        "format_linear_meeting_issue" => format_linear_meeting_issue(payload),
        _ => payload.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_transform_passes_payload_through() {
        let payload = json!({"a": 1});
        assert_eq!(run_transform_contract("nonexistent", &payload), payload);
    }

    #[test]
    fn dispatches_to_filter_meeting_events() {
        let payload = json!({"events": [{"id": "1", "title": "회의"}]});
        let result = run_transform_contract("filter_meeting_events", &payload);
        assert_eq!(result["meeting_count"], 1);
    }
}
