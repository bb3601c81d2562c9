//! # conduit-executor
//!
//! Runs an [`AgentPlan`]'s tasks, whether that means the classical
//! sequential mode (§4.13.1) or a full Pipeline DAG (§4.13.2), and
//! produces the [`AgentExecutionResult`] contract (§4.13.5): retries,
//! post-execution verification, compensation, and idempotency all live
//! here, grounded in the tool-invocation capability from `conduit-registry`.

#![deny(missing_docs)]

mod classical;
mod dag;
mod idempotency;
mod invoker;
mod verification;

use std::collections::HashMap;

use conduit_links::{extract_pipeline_links, PipelineLinkSink};
use conduit_plan::{AgentExecutionResult, AgentExecutionStep, AgentPlan, CompensationStatus, LinkStatus};
use conduit_skills::SkillStore;
use serde_json::Value;

pub use classical::{run_classical, TaskSummarizer};
pub use dag::{
    check_planning_gate, compensate, interpolate, retry_with_policy, row_status_for, CompensationOutcome, DagFailure,
    DagRunOutcome, GateFailure, RetryPolicy, SuccessfulMutation, UnresolvedReference,
};
pub use idempotency::{idempotency_key, is_idempotent, IdempotencyTracker};
pub use invoker::{build_path, strip_path_params, validate_payload_by_schema, AccessTokenProvider, HttpToolInvoker, ToolInvocationOutcome, ToolInvoker};
pub use verification::{verify_intent, verify_plan, ExecutedCall, RequiredIntent};

/// Run a `PIPELINE_DAG` task to completion: planning gate, the scheduling
/// loop, compensation on failure, post-execution verification against
/// `plan`'s requirements, and persisting at least one `pipeline_links`
/// row for the run.
#[allow(clippy::too_many_arguments)]
pub async fn execute_pipeline_dag(
    plan: &AgentPlan,
    dag: &conduit_plan::PipelineDag,
    pipeline_run_id: &str,
    user_id: &str,
    skills: &SkillStore,
    registry: &conduit_registry::ToolRegistry,
    invoker: &dyn ToolInvoker,
    retry_policy: &RetryPolicy,
    tracker: &IdempotencyTracker,
    link_sink: &dyn PipelineLinkSink,
    initial_bindings: HashMap<String, Value>,
) -> AgentExecutionResult {
    if let Err(gate_failure) = check_planning_gate(dag, &dag.limits) {
        return gate_failure_result(&gate_failure);
    }

    let mut result = match dag::run_dag(dag, pipeline_run_id, user_id, skills, registry, invoker, retry_policy, tracker, initial_bindings).await {
        Ok(outcome) => match verify_plan(plan, &outcome.tool_calls) {
            Some(reason) => verification_failure_result(reason),
            None => success_result(pipeline_run_id, &outcome, link_sink, user_id).await,
        },
        Err(failure) => failure_result(pipeline_run_id, user_id, failure, invoker, link_sink).await,
    };
    result.artifacts.insert("idempotent_success_reuse_count".to_string(), tracker.reuse_count().to_string());
    result
}

fn verification_failure_result(reason: &'static str) -> AgentExecutionResult {
    let mut artifacts = HashMap::new();
    artifacts.insert("error_code".to_string(), "verification_failed".to_string());
    artifacts.insert("verification_reason".to_string(), reason.to_string());
    artifacts.insert("retry_hint".to_string(), "false".to_string());
    artifacts.insert("compensation_status".to_string(), CompensationStatus::NotRequired.as_str().to_string());
    AgentExecutionResult {
        success: false,
        user_message: "파이프라인은 실행됐지만 요청하신 내용이 검증되지 않았습니다.".to_string(),
        summary: "DAG 파이프라인 검증 실패".to_string(),
        artifacts,
        steps: Vec::new(),
    }
}

fn gate_failure_result(failure: &GateFailure) -> AgentExecutionResult {
    let mut artifacts = HashMap::new();
    artifacts.insert("error_code".to_string(), failure.code().to_string());
    artifacts.insert("reason".to_string(), format!("{failure:?}"));
    artifacts.insert("retry_hint".to_string(), "false".to_string());
    artifacts.insert("compensation_status".to_string(), CompensationStatus::NotRequired.as_str().to_string());
    AgentExecutionResult {
        success: false,
        user_message: "파이프라인 구성이 허용된 한도를 초과했습니다.".to_string(),
        summary: "DAG planning gate rejected the pipeline".to_string(),
        artifacts,
        steps: Vec::new(),
    }
}

async fn success_result(pipeline_run_id: &str, outcome: &DagRunOutcome, link_sink: &dyn PipelineLinkSink, user_id: &str) -> AgentExecutionResult {
    let mut artifacts = HashMap::new();
    artifacts.insert("router_mode".to_string(), "PIPELINE_DAG".to_string());
    artifacts.insert("pipeline_run_id".to_string(), pipeline_run_id.to_string());
    artifacts.insert("run_log".to_string(), serde_json::to_string(&outcome.node_outputs).unwrap_or_default());

    let links = extract_pipeline_links(user_id, pipeline_run_id, &outcome.node_outputs);
    if !links.is_empty() {
        let _ = link_sink.upsert_many(&links).await;
    }

    let steps = outcome.step_names.iter().map(|name| AgentExecutionStep { name: name.clone(), status: "ok".to_string(), detail: "dag_node".to_string() }).collect();

    AgentExecutionResult {
        success: true,
        user_message: "파이프라인 실행을 완료했습니다.".to_string(),
        summary: "DAG 파이프라인 실행 완료".to_string(),
        artifacts,
        steps,
    }
}

async fn failure_result(pipeline_run_id: &str, user_id: &str, failure: DagFailure, invoker: &dyn ToolInvoker, link_sink: &dyn PipelineLinkSink) -> AgentExecutionResult {
    let compensation_outcome = compensate(&failure.partial.mutations, user_id, invoker).await;
    let link_status = if row_status_for(compensation_outcome) == "manual_required" { LinkStatus::ManualRequired } else { LinkStatus::Failed };

    if let Some(event_id) = best_effort_event_id(user_id, pipeline_run_id, &failure.partial.node_outputs) {
        if let Some(row) = conduit_links::build_failure_link(user_id, &event_id, pipeline_run_id, link_status, Some(failure.error_code.clone()), compensation_outcome_to_status(compensation_outcome)) {
            let _ = link_sink.upsert_many(&[row]).await;
        }
    }

    let mut artifacts = HashMap::new();
    artifacts.insert("error_code".to_string(), failure.error_code.clone());
    artifacts.insert("failed_step".to_string(), failure.failed_node.clone());
    artifacts.insert("reason".to_string(), failure.reason.clone());
    artifacts.insert("retry_hint".to_string(), conduit_core::is_retryable_pipeline_error(&failure.error_code).to_string());
    artifacts.insert("compensation_status".to_string(), compensation_outcome_to_status(compensation_outcome).as_str().to_string());
    artifacts.insert("pipeline_links_failure_status".to_string(), row_status_for(compensation_outcome).to_string());

    let mut steps: Vec<AgentExecutionStep> = failure.partial.step_names.iter().map(|name| AgentExecutionStep { name: name.clone(), status: "ok".to_string(), detail: "dag_node".to_string() }).collect();
    steps.push(AgentExecutionStep { name: failure.failed_node, status: "failed".to_string(), detail: failure.reason });

    AgentExecutionResult {
        success: false,
        user_message: "파이프라인 실행 중 오류가 발생하여 되돌렸습니다.".to_string(),
        summary: "DAG 파이프라인 실행 실패".to_string(),
        artifacts,
        steps,
    }
}

fn compensation_outcome_to_status(outcome: CompensationOutcome) -> CompensationStatus {
    match outcome {
        CompensationOutcome::NotRequired => CompensationStatus::NotRequired,
        CompensationOutcome::Completed => CompensationStatus::Completed,
        CompensationOutcome::Failed => CompensationStatus::Failed,
    }
}

/// Best-effort `event_id` for a failure-path link row: reuse the same
/// `item_results` shape `extract_pipeline_links` understands, falling
/// back to `None` (the link write is then skipped, not fabricated).
fn best_effort_event_id(user_id: &str, pipeline_run_id: &str, partial_outputs: &HashMap<String, Value>) -> Option<String> {
    extract_pipeline_links(user_id, pipeline_run_id, partial_outputs).into_iter().next().map(|row| row.event_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::ToolInvocationOutcome;
    use async_trait::async_trait;
    use conduit_links::InMemoryPipelineLinkSink;
    use conduit_plan::{PipelineDag, PipelineLimits, SkillNode};
    use conduit_registry::{IdempotencyKeyPolicy, ToolDefinition, ToolRegistry};
    use conduit_skills::{SkillContract, SkillProvider};
    use serde_json::json;

    struct StubInvoker {
        ok: bool,
    }

    #[async_trait]
    impl ToolInvoker for StubInvoker {
        async fn invoke(&self, _user_id: &str, _tool_name: &str, _payload: &Value) -> ToolInvocationOutcome {
            if self.ok {
                ToolInvocationOutcome { ok: true, data: Some(json!({"id": "page-1"})), error_code: None }
            } else {
                ToolInvocationOutcome { ok: false, data: None, error_code: Some("notion_create_page:TOOL_AUTH_ERROR".to_string()) }
            }
        }
    }

    fn skills() -> SkillStore {
        SkillStore::from_contracts(vec![SkillContract {
            name: "notion.page_create".to_string(),
            version: "1".to_string(),
            summary: "x".to_string(),
            provider: SkillProvider { service: "notion".to_string(), scopes: vec![] },
            autofill: json!({}),
            input_schema: json!({"type": "object"}),
            output_schema: json!({"type": "object"}),
            examples: vec![json!({})],
            runtime_tools: vec!["notion_create_page".to_string()],
        }])
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::from_tools(vec![ToolDefinition {
            service: "notion".to_string(),
            tool_name: "notion_create_page".to_string(),
            description: "create a page".to_string(),
            http_method: "POST".to_string(),
            path_template: "/pages".to_string(),
            base_url: "https://example.test".to_string(),
            adapter_function: "noop".to_string(),
            input_schema: json!({"type": "object"}),
            required_scopes: Vec::new(),
            idempotency_key_policy: IdempotencyKeyPolicy::None,
            error_map: HashMap::new(),
        }])
    }

    fn single_skill_dag() -> PipelineDag {
        PipelineDag {
            nodes: vec![conduit_plan::DagNode::Skill(SkillNode { id: "n1".to_string(), name: "notion.page_create".to_string(), depends_on: vec![], input: json!({}), timeout_sec: None })],
            limits: PipelineLimits::default(),
        }
    }

    fn empty_plan() -> AgentPlan {
        AgentPlan {
            user_text: "테스트".to_string(),
            requirements: Vec::new(),
            target_services: vec!["notion".to_string()],
            selected_tools: Vec::new(),
            workflow_steps: Vec::new(),
            tasks: Vec::new(),
            notes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn successful_dag_run_reports_the_router_mode_contract() {
        let invoker = StubInvoker { ok: true };
        let sink = InMemoryPipelineLinkSink::default();
        let retry = RetryPolicy::new(1, 0);
        let tracker = IdempotencyTracker::new();
        let result =
            execute_pipeline_dag(&empty_plan(), &single_skill_dag(), "run-1", "user-1", &skills(), &registry(), &invoker, &retry, &tracker, &sink, HashMap::new()).await;
        assert!(result.success);
        assert_eq!(result.artifact("router_mode"), Some("PIPELINE_DAG"));
        assert_eq!(result.summary, "DAG 파이프라인 실행 완료");
    }

    #[tokio::test]
    async fn failed_dag_run_reports_compensation_and_retry_hint() {
        let invoker = StubInvoker { ok: false };
        let sink = InMemoryPipelineLinkSink::default();
        let retry = RetryPolicy::new(1, 0);
        let tracker = IdempotencyTracker::new();
        let result =
            execute_pipeline_dag(&empty_plan(), &single_skill_dag(), "run-1", "user-1", &skills(), &registry(), &invoker, &retry, &tracker, &sink, HashMap::new()).await;
        assert!(!result.success);
        assert_eq!(result.artifact("failed_step"), Some("n1"));
        assert_eq!(result.artifact("compensation_status"), Some("not_required"));
    }

    #[tokio::test]
    async fn a_dag_run_that_never_archives_fails_verification_even_though_execution_succeeded() {
        let invoker = StubInvoker { ok: true };
        let sink = InMemoryPipelineLinkSink::default();
        let retry = RetryPolicy::new(1, 0);
        let mut plan = empty_plan();
        plan.requirements.push(conduit_plan::AgentRequirement::new("이 페이지를 삭제해줘"));
        let tracker = IdempotencyTracker::new();
        let result = execute_pipeline_dag(&plan, &single_skill_dag(), "run-1", "user-1", &skills(), &registry(), &invoker, &retry, &tracker, &sink, HashMap::new()).await;
        assert!(!result.success);
        assert_eq!(result.artifact("error_code"), Some("verification_failed"));
        assert_eq!(result.artifact("verification_reason"), Some("archive_requires_archived_flag_or_delete"));
    }

    #[test]
    fn gate_rejects_a_dag_over_the_node_limit() {
        let mut dag = single_skill_dag();
        dag.limits.max_nodes = 0;
        let failure = check_planning_gate(&dag, &dag.limits).unwrap_err();
        assert_eq!(failure.code(), "DSL_VALIDATION_FAILED");
    }
}
