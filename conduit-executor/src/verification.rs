//! Post-execution verification (§4.13.2): a completed plan is checked
//! against requirement-to-tool obligations inferred from the tasks that
//! were actually executed.

use serde_json::Value;

use conduit_plan::AgentPlan;

/// One tool call observed during execution, enough to check the
/// verification table against.
#[derive(Debug, Clone)]
pub struct ExecutedCall {
    /// The tool invoked, e.g. `notion_update_page`.
    pub tool_name: String,
    /// The resolved payload sent to the tool.
    pub payload: Value,
    /// The tool's response data, when the call succeeded.
    pub result: Option<Value>,
}

/// An intent the plan is expected to have fulfilled, inferred upstream
/// from the requirement text or task shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredIntent {
    /// Moving a page to a different parent.
    MovePage,
    /// Appending body content to one page.
    AppendBody,
    /// Appending the same content to more than one target.
    AppendToMultipleTargets,
    /// Renaming a page's title property.
    RenamePage,
    /// Archiving or deleting a page.
    ArchiveOrDeletePage,
    /// Reading data back out, with no mutation expected.
    Lookup,
    /// Creating a new artifact.
    Create,
    /// Any state-changing call.
    Mutation,
}

/// `Some(reason)` describes why `intent` is unmet by `calls`; `None`
/// means the obligation was satisfied.
pub fn verify_intent(intent: RequiredIntent, calls: &[ExecutedCall], target_count: usize) -> Option<&'static str> {
    let succeeded = |call: &&ExecutedCall| call.result.is_some();
    match intent {
        RequiredIntent::MovePage => {
            if calls.iter().filter(succeeded).any(|c| c.tool_name.ends_with("_update_page")) {
                None
            } else {
                Some("move_requires_update_page")
            }
        }
        RequiredIntent::AppendBody => {
            if calls.iter().filter(succeeded).any(|c| c.tool_name.ends_with("_append_block_children")) {
                None
            } else {
                Some("append_requires_append_block_children")
            }
        }
        RequiredIntent::AppendToMultipleTargets => {
            let appended = calls.iter().filter(succeeded).filter(|c| c.tool_name.ends_with("_append_block_children")).count();
            if appended >= target_count.max(1) {
                None
            } else {
                Some("append_requires_multiple_targets")
            }
        }
        RequiredIntent::RenamePage => {
            let renamed = calls.iter().filter(succeeded).any(|c| {
                c.tool_name.ends_with("_update_page")
                    && c.payload.get("properties").and_then(Value::as_object).map(|p| p.contains_key("title")).unwrap_or(false)
            });
            if renamed {
                None
            } else {
                Some("rename_requires_title_property")
            }
        }
        RequiredIntent::ArchiveOrDeletePage => {
            let archived = calls.iter().filter(succeeded).any(|c| {
                (c.tool_name.ends_with("_update_page") && c.payload.get("archived").and_then(Value::as_bool) == Some(true))
                    || c.tool_name.contains("delete")
            });
            if archived {
                None
            } else {
                Some("archive_requires_archived_flag_or_delete")
            }
        }
        RequiredIntent::Lookup => {
            if calls.iter().any(|c| succeeded(&c)) {
                None
            } else {
                Some("lookup_requires_tool_call")
            }
        }
        RequiredIntent::Create => {
            let created = calls.iter().filter(succeeded).any(|c| {
                c.result.as_ref().map(|r| r.get("id").is_some() || r.get("url").is_some()).unwrap_or(false)
            });
            if created {
                None
            } else {
                Some("create_requires_artifact_id_or_url")
            }
        }
        RequiredIntent::Mutation => {
            let mutated = calls.iter().filter(succeeded).any(|c| {
                !c.tool_name.ends_with("_get") && !c.tool_name.ends_with("_list") && !c.tool_name.ends_with("_search")
            });
            if mutated {
                None
            } else {
                Some("mutation_requires_state_change")
            }
        }
    }
}

/// The obligations `plan`'s requirements imply, per §4.13.2's intent→tool
/// table, each paired with the target count an `AppendToMultipleTargets`
/// check should use. Requirement text is classified the same
/// keyword-based way `conduit-planner-rule` classifies the original user
/// request, via `conduit-intent`.
fn required_intents(plan: &AgentPlan) -> Vec<(RequiredIntent, usize)> {
    let append_count = plan.requirements.iter().filter(|r| conduit_intent::is_append_intent(&r.summary)).count();
    plan.requirements
        .iter()
        .filter_map(|requirement| {
            let text = requirement.summary.as_str();
            let intent = if conduit_intent::contains_any(text, &["이동", "move"]) {
                RequiredIntent::MovePage
            } else if conduit_intent::contains_any(text, &["이름", "제목", "rename"]) {
                RequiredIntent::RenamePage
            } else if conduit_intent::is_delete_intent(text) {
                RequiredIntent::ArchiveOrDeletePage
            } else if conduit_intent::is_append_intent(text) {
                if append_count > 1 {
                    RequiredIntent::AppendToMultipleTargets
                } else {
                    RequiredIntent::AppendBody
                }
            } else if conduit_intent::is_create_intent(text) {
                RequiredIntent::Create
            } else if conduit_intent::is_read_intent(text) {
                RequiredIntent::Lookup
            } else if conduit_intent::is_update_intent(text) {
                RequiredIntent::Mutation
            } else {
                return None;
            };
            Some((intent, append_count.max(1)))
        })
        .collect()
}

/// Check every obligation `plan`'s requirements imply against `calls`,
/// the tool calls actually executed. Returns the first unmet obligation's
/// reason, in requirement order.
pub fn verify_plan(plan: &AgentPlan, calls: &[ExecutedCall]) -> Option<&'static str> {
    required_intents(plan).into_iter().find_map(|(intent, target_count)| verify_intent(intent, calls, target_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(tool_name: &str, payload: Value, result: Option<Value>) -> ExecutedCall {
        ExecutedCall { tool_name: tool_name.to_string(), payload, result }
    }

    #[test]
    fn move_page_requires_update_page_call() {
        let calls = vec![call("notion_query_database", json!({}), Some(json!({"id": "1"})))];
        assert_eq!(verify_intent(RequiredIntent::MovePage, &calls, 1), Some("move_requires_update_page"));

        let calls = vec![call("notion_update_page", json!({"parent": "x"}), Some(json!({"id": "1"})))];
        assert_eq!(verify_intent(RequiredIntent::MovePage, &calls, 1), None);
    }

    #[test]
    fn append_to_multiple_targets_counts_successful_calls() {
        let calls = vec![
            call("notion_append_block_children", json!({}), Some(json!({}))),
        ];
        assert_eq!(verify_intent(RequiredIntent::AppendToMultipleTargets, &calls, 2), Some("append_requires_multiple_targets"));

        let calls = vec![
            call("notion_append_block_children", json!({}), Some(json!({}))),
            call("notion_append_block_children", json!({}), Some(json!({}))),
        ];
        assert_eq!(verify_intent(RequiredIntent::AppendToMultipleTargets, &calls, 2), None);
    }

    #[test]
    fn rename_requires_title_property_in_payload() {
        let calls = vec![call("notion_update_page", json!({"properties": {"status": "done"}}), Some(json!({})))];
        assert_eq!(verify_intent(RequiredIntent::RenamePage, &calls, 1), Some("rename_requires_title_property"));

        let calls = vec![call("notion_update_page", json!({"properties": {"title": "new"}}), Some(json!({})))];
        assert_eq!(verify_intent(RequiredIntent::RenamePage, &calls, 1), None);
    }

    #[test]
    fn create_requires_id_or_url_in_result() {
        let calls = vec![call("linear_create_issue", json!({}), Some(json!({"title": "x"})))];
        assert_eq!(verify_intent(RequiredIntent::Create, &calls, 1), Some("create_requires_artifact_id_or_url"));

        let calls = vec![call("linear_create_issue", json!({}), Some(json!({"id": "ISSUE-1"})))];
        assert_eq!(verify_intent(RequiredIntent::Create, &calls, 1), None);
    }

    #[test]
    fn mutation_excludes_read_only_tool_names() {
        let calls = vec![call("notion_list_databases", json!({}), Some(json!({})))];
        assert_eq!(verify_intent(RequiredIntent::Mutation, &calls, 1), Some("mutation_requires_state_change"));

        let calls = vec![call("notion_update_page", json!({}), Some(json!({})))];
        assert_eq!(verify_intent(RequiredIntent::Mutation, &calls, 1), None);
    }

    fn plan_with_requirements(summaries: &[&str]) -> AgentPlan {
        AgentPlan {
            user_text: "테스트".to_string(),
            requirements: summaries.iter().map(|s| conduit_plan::AgentRequirement::new(*s)).collect(),
            target_services: vec!["notion".to_string()],
            selected_tools: Vec::new(),
            workflow_steps: Vec::new(),
            tasks: Vec::new(),
            notes: Vec::new(),
        }
    }

    #[test]
    fn verify_plan_flags_an_append_requirement_with_no_matching_call() {
        let plan = plan_with_requirements(&["본문에 회의록을 추가해줘"]);
        assert_eq!(verify_plan(&plan, &[]), Some("append_requires_append_block_children"));

        let calls = vec![call("notion_append_block_children", json!({}), Some(json!({})))];
        assert_eq!(verify_plan(&plan, &calls), None);
    }

    #[test]
    fn verify_plan_requires_one_append_per_requirement_when_several_are_named() {
        let plan = plan_with_requirements(&["A 페이지에 추가해줘", "B 페이지에도 추가해줘"]);
        let calls = vec![call("notion_append_block_children", json!({}), Some(json!({})))];
        assert_eq!(verify_plan(&plan, &calls), Some("append_requires_multiple_targets"));
    }

    #[test]
    fn verify_plan_ignores_requirements_with_no_classifiable_intent() {
        let plan = plan_with_requirements(&["그냥 아무거나"]);
        assert_eq!(verify_plan(&plan, &[]), None);
    }
}
