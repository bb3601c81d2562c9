//! # conduit-orchestrator
//!
//! `run_agent_analysis` (§4.17): the single entry point that turns one
//! user utterance into a planned-and-executed (or rejected) result. It
//! threads together the data-source short-circuit, the LLM-then-rule
//! planner fallback, the rollout controller's gate on autonomous
//! execution, a single bounded retry on a retryable autonomous failure,
//! and the classical/DAG/stepwise execution dispatch, logging one
//! `command_logs` row per call.

#![deny(missing_docs)]

mod autonomous;
mod config;
mod data_source;
mod execute;
mod planning;

pub use autonomous::{run_autonomous_loop, AutonomousAction, AutonomousAgent, AutonomousLimits, AutonomousStep};
pub use config::{RetryOverrides, RuntimeConfig};
pub use data_source::{parse_data_source_query_state, DataSourceQueryState};
pub use execute::{execute_agent_plan, StepwisePayloadBuilder};
pub use planning::build_plan;

use std::collections::HashMap;

use conduit_executor::{RetryPolicy, TaskSummarizer, ToolInvoker};
use conduit_links::PipelineLinkSink;
use conduit_observability::{run_agent_analysis_span, CommandLogRow, DetailBuilder, ObservabilityWriter};
use conduit_plan::{AgentExecutionResult, AgentExecutionStep, AgentPlan, AgentRunResult, PlanSource};
use conduit_plan_validate::validate_plan_contract;
use conduit_planner_llm::LlmProvider;
use conduit_planner_rule::{build_agent_plan, GuideRetriever};
use conduit_registry::ToolRegistry;
use conduit_rollout::{decide_rollout, RolloutSettings};
use conduit_skills::SkillStore;
use tracing::Instrument;
use uuid::Uuid;

const AUTONOMOUS_FEATURE: &str = "autonomous_execution";
const RETRYABLE_AUTONOMOUS_ERRORS: [&str; 4] = ["turn_limit", "tool_call_limit", "replan_limit", "timeout"];

/// Everything `run_agent_analysis` needs injected: the tool registry, the
/// execution capabilities, the optional LLM backends, and the places it
/// writes to. Bundled into one struct because Rust has no implicit
/// settings/provider singletons to reach for mid-function.
pub struct RunAgentAnalysisDeps<'a> {
    /// Tool registry used by both planners.
    pub registry: &'a ToolRegistry,
    /// Skill catalog, for DAG `skill` node resolution.
    pub skills: &'a SkillStore,
    /// Tool invocation capability.
    pub invoker: &'a dyn ToolInvoker,
    /// Where `pipeline_links` rows are upserted.
    pub link_sink: &'a dyn PipelineLinkSink,
    /// Summarises `LLM` task outputs in classical execution.
    pub summarizer: &'a dyn TaskSummarizer,
    /// Resolves a stepwise task's tool payload.
    pub stepwise_payload_builder: &'a dyn StepwisePayloadBuilder,
    /// Chooses the next action in the bounded autonomous loop.
    pub autonomous_agent: &'a dyn AutonomousAgent,
    /// LLM providers tried, in order, for plan requests.
    pub llm_providers: &'a [&'a dyn LlmProvider],
    /// System prompt used for LLM plan requests.
    pub llm_system_prompt: &'a str,
    /// User prompt used for LLM plan requests.
    pub llm_user_prompt: &'a str,
    /// Optional operating-guide retriever for the rule planner.
    pub guide_retriever: Option<&'a dyn GuideRetriever>,
    /// Where `command_logs` rows are written.
    pub observability: &'a dyn ObservabilityWriter,
    /// Retry policy for tool invocations inside DAG and stepwise execution.
    pub retry_policy: RetryPolicy,
    /// Autonomous-execution settings.
    pub config: RuntimeConfig,
}

fn execution_mode_of(plan: &AgentPlan) -> &'static str {
    use conduit_plan::TaskType;
    if plan.notes.iter().any(|n| n.starts_with("execution=autonomous")) {
        "autonomous"
    } else if plan.tasks.iter().any(|t| t.task_type == TaskType::PipelineDag) {
        "dag"
    } else if plan.tasks.iter().any(|t| t.task_type == TaskType::StepwisePipeline) {
        "stepwise"
    } else {
        "classical"
    }
}

fn plan_source_tag(source: PlanSource) -> &'static str {
    match source {
        PlanSource::Rule => "rule",
        PlanSource::Llm => "llm",
        PlanSource::Stepwise => "stepwise",
    }
}

async fn run_autonomous_with_retry(
    user_id: &str,
    plan: &mut AgentPlan,
    deps: &RunAgentAnalysisDeps<'_>,
) -> Option<AgentExecutionResult> {
    let limits = AutonomousLimits {
        max_turns: deps.config.llm_autonomous_max_turns,
        max_tool_calls: deps.config.llm_autonomous_max_tool_calls,
        timeout_sec: deps.config.llm_autonomous_timeout_sec,
        replan_limit: deps.config.llm_autonomous_replan_limit,
    };
    let first = run_autonomous_loop(user_id, plan, deps.autonomous_agent, deps.invoker, limits).await;
    if first.success {
        plan.push_note("execution=autonomous");
        return Some(first);
    }

    let error_code = first.artifact("error_code").unwrap_or("unknown").to_string();
    plan.push_note(format!("autonomous_error={error_code}"));

    let mut last_failure = first;
    if deps.config.llm_autonomous_limit_retry_once && RETRYABLE_AUTONOMOUS_ERRORS.contains(&error_code.as_str()) {
        plan.push_note("autonomous_retry=1");
        let retry_limits = AutonomousLimits::from_overrides(deps.config.retry_overrides());
        let retry = run_autonomous_loop(user_id, plan, deps.autonomous_agent, deps.invoker, retry_limits).await;
        if retry.success {
            plan.push_note("execution=autonomous_retry");
            return Some(retry);
        }
        let retry_error = retry.artifact("error_code").unwrap_or(error_code.as_str()).to_string();
        plan.push_note(format!("autonomous_retry_error={retry_error}"));
        last_failure = retry;
    }

    if deps.config.llm_autonomous_strict {
        plan.push_note("execution=autonomous_strict");
        return Some(last_failure);
    }

    plan.push_note("execution=autonomous_fallback");
    None
}

async fn run_inner(user_text: &str, connected_services: &[String], user_id: &str, deps: &RunAgentAnalysisDeps<'_>, request_id: &str) -> AgentRunResult {
    let data_source_state = parse_data_source_query_state(user_text);
    if data_source_state.is_data_source_query() && matches!(data_source_state, DataSourceQueryState::Missing | DataSourceQueryState::Invalid) {
        let plan = build_agent_plan(user_text, connected_services, deps.registry, deps.guide_retriever);
        let (user_message, detail) = match data_source_state {
            DataSourceQueryState::Missing => data_source::missing_id_message(),
            _ => data_source::invalid_id_message(),
        };
        let summary = match data_source_state {
            DataSourceQueryState::Missing => "데이터소스 ID를 찾지 못했습니다.",
            _ => "데이터소스 ID 형식이 올바르지 않습니다.",
        };
        let mut artifacts = HashMap::new();
        artifacts.insert("error_code".to_string(), "validation_error".to_string());
        let execution = AgentExecutionResult {
            success: false,
            user_message: user_message.to_string(),
            summary: summary.to_string(),
            artifacts,
            steps: vec![AgentExecutionStep { name: "parse_data_source_id".to_string(), status: "error".to_string(), detail: detail.to_string() }],
        };
        return AgentRunResult {
            ok: false,
            stage: "validation".to_string(),
            plan,
            result_summary: summary.to_string(),
            execution: Some(execution),
            plan_source: PlanSource::Rule,
        };
    }

    let (mut plan, plan_source) = build_plan(
        user_text,
        connected_services,
        deps.registry,
        deps.llm_providers,
        deps.llm_system_prompt,
        deps.llm_user_prompt,
        deps.guide_retriever,
    )
    .await;

    if plan.target_services.is_empty() {
        let summary = "요청에서 타겟 서비스를 확정하지 못했습니다. 예: '노션', '스포티파이'처럼 서비스 이름을 포함해 다시 요청해주세요.".to_string();
        return AgentRunResult { ok: false, stage: "planning".to_string(), plan, result_summary: summary.clone(), execution: None, plan_source };
    }

    if let Err(contract_error) = validate_plan_contract(&plan) {
        let summary = "생성된 계획이 실행 조건을 만족하지 못했습니다.".to_string();
        let mut artifacts = HashMap::new();
        artifacts.insert("error_code".to_string(), contract_error.code());
        let execution = AgentExecutionResult {
            success: false,
            user_message: summary.clone(),
            summary: summary.clone(),
            artifacts,
            steps: vec![AgentExecutionStep { name: "validate_plan_contract".to_string(), status: "error".to_string(), detail: contract_error.code() }],
        };
        return AgentRunResult { ok: false, stage: "plan_contract".to_string(), plan, result_summary: summary, execution: Some(execution), plan_source };
    }

    let mut execution = None;

    if deps.config.llm_autonomous_enabled && plan_source == PlanSource::Llm {
        let rollout_settings = RolloutSettings {
            enabled: deps.config.llm_autonomous_enabled,
            shadow_mode: deps.config.llm_autonomous_shadow_mode,
            allowlist: None,
            traffic_percent: deps.config.llm_autonomous_traffic_percent,
            legacy_fallback_enabled: deps.config.llm_autonomous_rule_fallback_enabled,
        };
        let decision = decide_rollout(user_id, AUTONOMOUS_FEATURE, &rollout_settings);
        plan.push_note(format!("autonomous_rollout={}", decision.reason));
        if decision.serve {
            execution = run_autonomous_with_retry(user_id, &mut plan, deps).await;
        }
    }

    let pipeline_run_id = Uuid::new_v4().to_string();
    let execution = match execution {
        Some(execution) => execution,
        None => {
            execute_agent_plan(
                &plan,
                user_id,
                &pipeline_run_id,
                deps.skills,
                deps.registry,
                deps.invoker,
                &deps.retry_policy,
                deps.link_sink,
                deps.summarizer,
                deps.stepwise_payload_builder,
            )
            .await
        }
    };

    let result_summary = execution.summary.clone();
    let ok = execution.success;
    let _ = request_id;
    AgentRunResult { ok, stage: "execution".to_string(), plan, result_summary, execution: Some(execution), plan_source }
}

/// Plan and execute `user_text` for `user_id`, given which services are
/// already connected. Writes one best-effort `command_logs` row and wraps
/// the whole call in a `tracing` span.
pub async fn run_agent_analysis(user_text: &str, connected_services: &[String], user_id: &str, deps: &RunAgentAnalysisDeps<'_>) -> AgentRunResult {
    let request_id = Uuid::new_v4().to_string();
    let span = run_agent_analysis_span(&request_id, user_id);
    let started = std::time::Instant::now();

    let result = run_inner(user_text, connected_services, user_id, deps, &request_id).instrument(span).await;

    let elapsed_ms = started.elapsed().as_millis();
    let detail = DetailBuilder::new()
        .field("services", result.plan.target_services.join(","))
        .field("request_id", &request_id)
        .field("analysis_latency_ms", elapsed_ms)
        .build();

    let row = CommandLogRow {
        user_id: user_id.to_string(),
        command: "agent_plan".to_string(),
        status: result.stage.clone(),
        final_status: if result.ok { "ok".to_string() } else { "failed".to_string() },
        plan_source: plan_source_tag(result.plan_source).to_string(),
        execution_mode: execution_mode_of(&result.plan).to_string(),
        error_code: result.execution.as_ref().and_then(|e| e.artifact("error_code")).map(str::to_string),
        verification_reason: result.execution.as_ref().and_then(|e| e.artifact("verification_reason")).map(str::to_string),
        autonomous_fallback_reason: result.plan.notes.iter().find(|n| n.starts_with("autonomous_error=")).cloned(),
        detail,
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    deps.observability.write_command_log(row).await;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use conduit_executor::ToolInvocationOutcome;
    use conduit_links::InMemoryPipelineLinkSink;
    use conduit_observability::InMemoryObservabilityWriter;
    use conduit_planner_stepwise::StepwiseTask;
    use conduit_registry::{IdempotencyKeyPolicy, ToolDefinition};
    use serde_json::{json, Value};

    struct StubInvoker;

    #[async_trait]
    impl ToolInvoker for StubInvoker {
        async fn invoke(&self, _user_id: &str, _tool_name: &str, _payload: &Value) -> ToolInvocationOutcome {
            ToolInvocationOutcome { ok: true, data: Some(json!({"id": "page-1"})), error_code: None }
        }
    }

    struct NoopSummarizer;

    #[async_trait]
    impl TaskSummarizer for NoopSummarizer {
        async fn summarize(&self, _instruction: &str, _dependency_outputs: &Value) -> Result<Value, String> {
            Ok(json!({}))
        }
    }

    struct NoopPayloadBuilder;

    #[async_trait]
    impl StepwisePayloadBuilder for NoopPayloadBuilder {
        async fn build_payload(&self, _task: &StepwiseTask, _prior_outputs: &HashMap<String, Value>) -> Result<Value, String> {
            Ok(json!({}))
        }
    }

    struct NoopAutonomousAgent;

    #[async_trait]
    impl AutonomousAgent for NoopAutonomousAgent {
        async fn next_action(&self, _plan: &AgentPlan, _history: &[AutonomousStep]) -> AutonomousAction {
            AutonomousAction::Finish { success: true, summary: "n/a".to_string(), user_message: "n/a".to_string() }
        }
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

    fn deps<'a>(
        registry: &'a ToolRegistry,
        skills: &'a SkillStore,
        invoker: &'a StubInvoker,
        link_sink: &'a InMemoryPipelineLinkSink,
        summarizer: &'a NoopSummarizer,
        payload_builder: &'a NoopPayloadBuilder,
        autonomous_agent: &'a NoopAutonomousAgent,
        observability: &'a InMemoryObservabilityWriter,
    ) -> RunAgentAnalysisDeps<'a> {
        RunAgentAnalysisDeps {
            registry,
            skills,
            invoker,
            link_sink,
            summarizer,
            stepwise_payload_builder: payload_builder,
            autonomous_agent,
            llm_providers: &[],
            llm_system_prompt: "sys",
            llm_user_prompt: "user",
            guide_retriever: None,
            observability,
            retry_policy: RetryPolicy::default(),
            config: RuntimeConfig { llm_autonomous_enabled: false, ..RuntimeConfig::from_env() },
        }
    }

    #[tokio::test]
    async fn a_request_with_no_target_service_stops_at_planning() {
        let registry = registry();
        let skills = SkillStore::from_contracts(Vec::new());
        let invoker = StubInvoker;
        let link_sink = InMemoryPipelineLinkSink::default();
        let summarizer = NoopSummarizer;
        let payload_builder = NoopPayloadBuilder;
        let autonomous_agent = NoopAutonomousAgent;
        let observability = InMemoryObservabilityWriter::new();
        let deps = deps(&registry, &skills, &invoker, &link_sink, &summarizer, &payload_builder, &autonomous_agent, &observability);

        let result = run_agent_analysis("아무 의미 없는 문장", &["notion".to_string()], "user-1", &deps).await;
        assert!(!result.ok);
        assert_eq!(result.stage, "planning");
        assert_eq!(observability.command_logs().await.len(), 1);
    }

    #[tokio::test]
    async fn a_missing_data_source_id_short_circuits_before_planning() {
        let registry = registry();
        let skills = SkillStore::from_contracts(Vec::new());
        let invoker = StubInvoker;
        let link_sink = InMemoryPipelineLinkSink::default();
        let summarizer = NoopSummarizer;
        let payload_builder = NoopPayloadBuilder;
        let autonomous_agent = NoopAutonomousAgent;
        let observability = InMemoryObservabilityWriter::new();
        let deps = deps(&registry, &skills, &invoker, &link_sink, &summarizer, &payload_builder, &autonomous_agent, &observability);

        let result = run_agent_analysis("데이터소스 최근 5개 조회", &["notion".to_string()], "user-1", &deps).await;
        assert!(!result.ok);
        assert_eq!(result.stage, "validation");
        assert_eq!(result.execution.unwrap().artifact("error_code"), Some("validation_error"));
    }

    #[tokio::test]
    async fn a_connected_service_request_executes_classically() {
        let registry = registry();
        let skills = SkillStore::from_contracts(Vec::new());
        let invoker = StubInvoker;
        let link_sink = InMemoryPipelineLinkSink::default();
        let summarizer = NoopSummarizer;
        let payload_builder = NoopPayloadBuilder;
        let autonomous_agent = NoopAutonomousAgent;
        let observability = InMemoryObservabilityWriter::new();
        let deps = deps(&registry, &skills, &invoker, &link_sink, &summarizer, &payload_builder, &autonomous_agent, &observability);

        let result = run_agent_analysis("노션 페이지 만들어줘", &["notion".to_string()], "user-1", &deps).await;
        assert_eq!(result.stage, "execution");
        let logs = observability.command_logs().await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].plan_source, "rule");
    }

    #[tokio::test]
    async fn a_plan_that_selects_an_internal_only_tool_is_rejected_before_execution() {
        let registry = ToolRegistry::from_tools(vec![ToolDefinition {
            service: "notion".to_string(),
            tool_name: "notion_oauth_token_exchange".to_string(),
            description: "토큰 교환".to_string(),
            http_method: "POST".to_string(),
            path_template: "/oauth/token".to_string(),
            base_url: "https://example.test".to_string(),
            adapter_function: "noop".to_string(),
            input_schema: json!({"type": "object"}),
            required_scopes: Vec::new(),
            idempotency_key_policy: IdempotencyKeyPolicy::None,
            error_map: HashMap::new(),
        }]);
        let skills = SkillStore::from_contracts(Vec::new());
        let invoker = StubInvoker;
        let link_sink = InMemoryPipelineLinkSink::default();
        let summarizer = NoopSummarizer;
        let payload_builder = NoopPayloadBuilder;
        let autonomous_agent = NoopAutonomousAgent;
        let observability = InMemoryObservabilityWriter::new();
        let deps = deps(&registry, &skills, &invoker, &link_sink, &summarizer, &payload_builder, &autonomous_agent, &observability);

        let result = run_agent_analysis("노션 토큰 교환 해줘", &["notion".to_string()], "user-1", &deps).await;
        assert!(!result.ok);
        assert_eq!(result.stage, "plan_contract");
        assert_eq!(result.execution.unwrap().artifact("error_code"), Some("internal_tool_selected:notion_oauth_token_exchange"));
    }
}
