//! Compensation (§4.13.3): on a DAG failure after earlier successful
//! mutations, walk them in reverse order and issue best-effort inverse
//! operations.

use serde_json::{json, Value};

use crate::invoker::ToolInvoker;

/// One successful mutation recorded during a DAG run, kept around in
/// case compensation is needed later.
#[derive(Debug, Clone)]
pub struct SuccessfulMutation {
    /// The node id that performed the mutation.
    pub node_id: String,
    /// The tool that was called.
    pub tool_name: String,
    /// The tool's response data.
    pub result: Value,
}

/// `compensation_status` after a compensation attempt, per §4.13.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompensationOutcome {
    /// No mutation happened before the failure; nothing to undo.
    NotRequired,
    /// Every inverse call succeeded.
    Completed,
    /// At least one inverse call failed.
    Failed,
}

impl CompensationOutcome {
    /// The `conduit_plan::links::CompensationStatus` name for this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompensationOutcome::NotRequired => "not_required",
            CompensationOutcome::Completed => "completed",
            CompensationOutcome::Failed => "failed",
        }
    }
}

/// The inverse tool call for a known mutation, or `None` when the tool
/// has no known inverse (compensation for it is skipped, not failed).
fn inverse_call(mutation: &SuccessfulMutation) -> Option<(&'static str, Value)> {
    match mutation.tool_name.as_str() {
        "notion_create_page" => {
            let page_id = mutation.result.get("id").cloned().unwrap_or(Value::Null);
            Some(("notion_update_page", json!({"page_id": page_id, "archived": true})))
        }
        "linear_create_issue" => {
            let issue_id = mutation.result.get("id").cloned().unwrap_or(Value::Null);
            Some(("linear_update_issue", json!({"issue_id": issue_id, "state": "cancelled"})))
        }
        _ => None,
    }
}

/// Run inverse operations for every `mutations` entry, most recent first,
/// on the injected `invoker`. Returns the overall compensation outcome.
pub async fn compensate(mutations: &[SuccessfulMutation], user_id: &str, invoker: &dyn ToolInvoker) -> CompensationOutcome {
    if mutations.is_empty() {
        return CompensationOutcome::NotRequired;
    }

    let mut any_attempted = false;
    let mut any_failed = false;
    for mutation in mutations.iter().rev() {
        let Some((inverse_tool, payload)) = inverse_call(mutation) else { continue };
        any_attempted = true;
        let outcome = invoker.invoke(user_id, inverse_tool, &payload).await;
        if !outcome.ok {
            any_failed = true;
        }
    }

    if !any_attempted {
        CompensationOutcome::NotRequired
    } else if any_failed {
        CompensationOutcome::Failed
    } else {
        CompensationOutcome::Completed
    }
}

/// The `pipeline_links` row `status` implied by a compensation outcome.
pub fn row_status_for(outcome: CompensationOutcome) -> &'static str {
    match outcome {
        CompensationOutcome::NotRequired | CompensationOutcome::Completed => "failed",
        CompensationOutcome::Failed => "manual_required",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::ToolInvocationOutcome;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingInvoker {
        calls: Mutex<Vec<String>>,
        fail_tool: Option<&'static str>,
    }

    #[async_trait]
    impl ToolInvoker for RecordingInvoker {
        async fn invoke(&self, _user_id: &str, tool_name: &str, _payload: &Value) -> ToolInvocationOutcome {
            self.calls.lock().unwrap().push(tool_name.to_string());
            if Some(tool_name) == self.fail_tool {
                ToolInvocationOutcome { ok: false, data: None, error_code: Some("tool_failed".to_string()) }
            } else {
                ToolInvocationOutcome { ok: true, data: Some(json!({})), error_code: None }
            }
        }
    }

    #[tokio::test]
    async fn no_mutations_means_not_required() {
        let invoker = RecordingInvoker { calls: Mutex::new(Vec::new()), fail_tool: None };
        let outcome = compensate(&[], "user-1", &invoker).await;
        assert_eq!(outcome, CompensationOutcome::NotRequired);
    }

    #[tokio::test]
    async fn compensates_in_reverse_order() {
        let invoker = RecordingInvoker { calls: Mutex::new(Vec::new()), fail_tool: None };
        let mutations = vec![
            SuccessfulMutation { node_id: "n1".to_string(), tool_name: "notion_create_page".to_string(), result: json!({"id": "p1"}) },
            SuccessfulMutation { node_id: "n2".to_string(), tool_name: "linear_create_issue".to_string(), result: json!({"id": "i1"}) },
        ];
        let outcome = compensate(&mutations, "user-1", &invoker).await;
        assert_eq!(outcome, CompensationOutcome::Completed);
        let calls = invoker.calls.lock().unwrap();
        assert_eq!(*calls, vec!["linear_update_issue".to_string(), "notion_update_page".to_string()]);
    }

    #[tokio::test]
    async fn a_single_inverse_failure_marks_compensation_failed() {
        let invoker = RecordingInvoker { calls: Mutex::new(Vec::new()), fail_tool: Some("notion_update_page") };
        let mutations = vec![SuccessfulMutation { node_id: "n1".to_string(), tool_name: "notion_create_page".to_string(), result: json!({"id": "p1"}) }];
        let outcome = compensate(&mutations, "user-1", &invoker).await;
        assert_eq!(outcome, CompensationOutcome::Failed);
        assert_eq!(row_status_for(outcome), "manual_required");
    }

    #[tokio::test]
    async fn mutations_with_no_known_inverse_are_skipped_not_failed() {
        let invoker = RecordingInvoker { calls: Mutex::new(Vec::new()), fail_tool: None };
        let mutations = vec![SuccessfulMutation { node_id: "n1".to_string(), tool_name: "notion_query_database".to_string(), result: json!({}) }];
        let outcome = compensate(&mutations, "user-1", &invoker).await;
        assert_eq!(outcome, CompensationOutcome::NotRequired);
        assert_eq!(row_status_for(outcome), "failed");
    }
}
