//! Pulling `(event_id, notion_page_id, linear_issue_id)` triples out of a
//! DAG run's per-item artifacts.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;

use conduit_plan::{CompensationStatus, LinkStatus, PipelineLinkRow};

fn as_object(value: Option<&Value>) -> Option<&serde_json::Map<String, Value>> {
    value.and_then(Value::as_object)
}

fn trimmed_string(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or("").trim().to_string()
}

fn first_non_empty(candidates: &[Option<&Value>]) -> String {
    for candidate in candidates {
        let text = trimmed_string(*candidate);
        if !text.is_empty() {
            return text;
        }
    }
    String::new()
}

fn extract_notion_page_id(payload: &Value) -> String {
    let data = as_object(payload.get("data"));
    let result = as_object(payload.get("result"));
    let data_result = data.and_then(|d| as_object(d.get("result")));
    first_non_empty(&[
        payload.get("id"),
        payload.get("page_id"),
        result.and_then(|r| r.get("id")),
        data.and_then(|d| d.get("id")),
        data.and_then(|d| d.get("page_id")),
        data_result.and_then(|r| r.get("id")),
    ])
}

fn extract_linear_issue_id(payload: &Value) -> String {
    let data = as_object(payload.get("data"));
    let issue_create = as_object(payload.get("issueCreate"));
    let issue = issue_create.and_then(|ic| as_object(ic.get("issue")));
    let payload_issue = as_object(payload.get("issue"));
    let data_issue_create = data.and_then(|d| as_object(d.get("issueCreate")));
    let data_issue_from_create = data_issue_create.and_then(|ic| as_object(ic.get("issue")));
    let data_issue = data.and_then(|d| as_object(d.get("issue")));
    first_non_empty(&[
        issue.and_then(|i| i.get("id")),
        payload_issue.and_then(|i| i.get("id")),
        payload.get("id"),
        data_issue_from_create.and_then(|i| i.get("id")),
        data_issue.and_then(|i| i.get("id")),
        data.and_then(|d| d.get("id")),
    ])
}

/// Walk `artifacts` (one entry per top-level DAG node, each optionally
/// carrying an `item_results` array from a `for_each` node) and build a
/// [`PipelineLinkRow`] for every item that produced a non-empty
/// `event_id`. Items without an `event_id` are skipped, not errored.
pub fn extract_pipeline_links(user_id: &str, pipeline_run_id: &str, artifacts: &HashMap<String, Value>) -> Vec<PipelineLinkRow> {
    let mut links = Vec::new();
    for value in artifacts.values() {
        let Some(item_results) = value.get("item_results").and_then(Value::as_array) else {
            continue;
        };
        for item_result in item_results {
            let Some(item_result) = item_result.as_object() else {
                continue;
            };
            let transform = item_result.get("n2_1").cloned().unwrap_or(Value::Null);
            let notion = item_result.get("n2_2").cloned().unwrap_or(Value::Null);
            let linear = item_result.get("n2_3").cloned().unwrap_or(Value::Null);

            let event_id = first_non_empty(&[transform.get("event_id"), transform.get("calendar_event_id")]);
            if event_id.is_empty() {
                continue;
            }
            let notion_page_id = extract_notion_page_id(&notion);
            let linear_issue_id = extract_linear_issue_id(&linear);

            links.push(PipelineLinkRow {
                user_id: user_id.to_string(),
                event_id,
                notion_page_id: (!notion_page_id.is_empty()).then_some(notion_page_id),
                linear_issue_id: (!linear_issue_id.is_empty()).then_some(linear_issue_id),
                run_id: pipeline_run_id.to_string(),
                status: LinkStatus::Succeeded,
                error_code: None,
                compensation_status: CompensationStatus::NotRequired,
                updated_at: Utc::now().to_rfc3339(),
            });
        }
    }
    links
}

/// Build the single link row recorded when a run fails before (or during)
/// compensation, for the one `event_id` it was triggered by.
pub fn build_failure_link(
    user_id: &str,
    event_id: &str,
    run_id: &str,
    status: LinkStatus,
    error_code: Option<String>,
    compensation_status: CompensationStatus,
) -> Option<PipelineLinkRow> {
    let event_id = event_id.trim();
    if event_id.is_empty() {
        return None;
    }
    Some(PipelineLinkRow {
        user_id: user_id.to_string(),
        event_id: event_id.to_string(),
        notion_page_id: None,
        linear_issue_id: None,
        run_id: run_id.to_string(),
        status,
        error_code,
        compensation_status,
        updated_at: Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_link_from_nested_item_results() {
        let mut artifacts = HashMap::new();
        artifacts.insert(
            "n2".to_string(),
            json!({
                "item_results": [
                    {
                        "n2_1": {"event_id": "evt-1"},
                        "n2_2": {"id": "page-1"},
                        "n2_3": {"issue": {"id": "ISS-1"}},
                    }
                ]
            }),
        );
        let links = extract_pipeline_links("user-1", "run-1", &artifacts);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].event_id, "evt-1");
        assert_eq!(links[0].notion_page_id.as_deref(), Some("page-1"));
        assert_eq!(links[0].linear_issue_id.as_deref(), Some("ISS-1"));
    }

    #[test]
    fn items_without_event_id_are_skipped() {
        let mut artifacts = HashMap::new();
        artifacts.insert("n2".to_string(), json!({"item_results": [{"n2_1": {}}]}));
        let links = extract_pipeline_links("user-1", "run-1", &artifacts);
        assert!(links.is_empty());
    }

    #[test]
    fn linear_issue_id_falls_back_to_issue_create_shape() {
        let mut artifacts = HashMap::new();
        artifacts.insert(
            "n2".to_string(),
            json!({
                "item_results": [{
                    "n2_1": {"calendar_event_id": "evt-2"},
                    "n2_2": {},
                    "n2_3": {"issueCreate": {"issue": {"id": "ISS-2"}}},
                }]
            }),
        );
        let links = extract_pipeline_links("user-1", "run-1", &artifacts);
        assert_eq!(links[0].linear_issue_id.as_deref(), Some("ISS-2"));
    }

    #[test]
    fn build_failure_link_rejects_blank_event_id() {
        assert!(build_failure_link("user-1", "  ", "run-1", LinkStatus::Failed, None, CompensationStatus::NotRequired).is_none());
    }
}
