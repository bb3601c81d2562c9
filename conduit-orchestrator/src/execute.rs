//! Dispatches a built plan to the right execution mode: a `PIPELINE_DAG`
//! task goes to the DAG executor (§4.13.2), a `STEPWISE_PIPELINE` task
//! runs its own small sequential loop (no concrete dispatcher for this
//! task type exists upstream of this crate), and everything else runs
//! through classical sequential execution (§4.13.1).

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use conduit_executor::{execute_pipeline_dag, run_classical, IdempotencyTracker, RetryPolicy, TaskSummarizer, ToolInvoker};
use conduit_links::PipelineLinkSink;
use conduit_plan::{AgentExecutionResult, AgentExecutionStep, AgentPlan, AgentTask, TaskType};
use conduit_planner_stepwise::StepwiseTask;
use conduit_registry::ToolRegistry;
use conduit_skills::SkillStore;

/// Resolves a [`StepwiseTask`] to a concrete tool payload. Stepwise tasks
/// carry only `(service, tool_name, sentence)`, not arguments, so filling
/// in the actual request body is injected the same way `TaskSummarizer`
/// fills in an `LLM` task's output.
#[async_trait]
pub trait StepwisePayloadBuilder: Send + Sync {
    /// Build the payload for one stepwise task, given the sentence it was
    /// derived from and the outputs of tasks already executed in this run.
    async fn build_payload(&self, task: &StepwiseTask, prior_outputs: &HashMap<String, Value>) -> Result<Value, String>;
}

#[derive(Debug, Deserialize)]
struct StepwisePayload {
    #[serde(default)]
    tasks: Vec<StepwiseTask>,
}

fn pipeline_error_code(detail: &str) -> &str {
    let after_tool = detail.split(':').nth(1).unwrap_or(detail);
    after_tool.split('|').next().unwrap_or(after_tool)
}

/// Run a `STEPWISE_PIPELINE` task's tasks in order, stopping at the first
/// terminal failure. Transient `TOOL_RATE_LIMITED`/`TOOL_TIMEOUT` errors
/// retry under `retry_policy`, per §4.13.2's retry policy text.
async fn run_stepwise(
    task: &AgentTask,
    user_id: &str,
    invoker: &dyn ToolInvoker,
    retry_policy: &RetryPolicy,
    payload_builder: &dyn StepwisePayloadBuilder,
) -> AgentExecutionResult {
    let stepwise: StepwisePayload = match serde_json::from_value(task.payload.clone()) {
        Ok(payload) => payload,
        Err(err) => return execution_error(&task.id, "stepwise_payload_malformed", &err.to_string()),
    };

    let mut outputs: HashMap<String, Value> = HashMap::new();
    let mut steps = Vec::new();

    for step in &stepwise.tasks {
        let payload = match payload_builder.build_payload(step, &outputs).await {
            Ok(payload) => payload,
            Err(reason) => {
                steps.push(AgentExecutionStep { name: step.task_id.clone(), status: "failed".to_string(), detail: reason.clone() });
                return failed_stepwise("stepwise_payload_build_failed", &step.task_id, &reason, steps);
            }
        };

        let tool_name = step.tool_name.clone();
        let attempt_payload = payload.clone();
        let result = conduit_executor::retry_with_policy(retry_policy, || {
            let tool_name = tool_name.clone();
            let payload = attempt_payload.clone();
            async move {
                let outcome = invoker.invoke(user_id, &tool_name, &payload).await;
                if outcome.ok {
                    Ok(outcome.data.unwrap_or(Value::Null))
                } else {
                    let code = outcome.error_code.unwrap_or_else(|| "TOOL_UNKNOWN_ERROR".to_string());
                    Err(pipeline_error_code(&code).to_string())
                }
            }
        })
        .await;

        match result {
            Ok(data) => {
                outputs.insert(step.task_id.clone(), data);
                steps.push(AgentExecutionStep { name: step.task_id.clone(), status: "ok".to_string(), detail: step.tool_name.clone() });
            }
            Err(code) => {
                steps.push(AgentExecutionStep { name: step.task_id.clone(), status: "failed".to_string(), detail: code.clone() });
                return failed_stepwise(&code, &step.task_id, &code, steps);
            }
        }
    }

    AgentExecutionResult {
        success: true,
        user_message: "요청하신 작업을 순서대로 완료했습니다.".to_string(),
        summary: format!("stepwise execution completed {} task(s)", stepwise.tasks.len()),
        artifacts: HashMap::new(),
        steps,
    }
}

fn execution_error(failed_step: &str, error_code: &str, reason: &str) -> AgentExecutionResult {
    let mut artifacts = HashMap::new();
    artifacts.insert("error_code".to_string(), error_code.to_string());
    artifacts.insert("failed_step".to_string(), failed_step.to_string());
    artifacts.insert("reason".to_string(), reason.to_string());
    AgentExecutionResult {
        success: false,
        user_message: "요청을 처리하는 중 오류가 발생했습니다.".to_string(),
        summary: "stepwise execution failed".to_string(),
        artifacts,
        steps: Vec::new(),
    }
}

fn failed_stepwise(error_code: &str, failed_step: &str, reason: &str, steps: Vec<AgentExecutionStep>) -> AgentExecutionResult {
    let mut artifacts = HashMap::new();
    artifacts.insert("error_code".to_string(), error_code.to_string());
    artifacts.insert("failed_step".to_string(), failed_step.to_string());
    artifacts.insert("reason".to_string(), reason.to_string());
    artifacts.insert("retry_hint".to_string(), conduit_core::is_retryable_pipeline_error(error_code).to_string());
    AgentExecutionResult {
        success: false,
        user_message: "요청을 처리하는 중 오류가 발생했습니다.".to_string(),
        summary: "stepwise execution failed".to_string(),
        artifacts,
        steps,
    }
}

/// Dispatch `plan` to the execution mode implied by its tasks: the first
/// `PIPELINE_DAG` task wins over the DAG executor, else the first
/// `STEPWISE_PIPELINE` task runs through [`run_stepwise`], else the plan
/// runs through classical sequential execution.
#[allow(clippy::too_many_arguments)]
pub async fn execute_agent_plan(
    plan: &AgentPlan,
    user_id: &str,
    pipeline_run_id: &str,
    skills: &SkillStore,
    registry: &ToolRegistry,
    invoker: &dyn ToolInvoker,
    retry_policy: &RetryPolicy,
    link_sink: &dyn PipelineLinkSink,
    summarizer: &dyn TaskSummarizer,
    payload_builder: &dyn StepwisePayloadBuilder,
) -> AgentExecutionResult {
    // One run's invocations only need to be deduplicated against each other.
    let tracker = IdempotencyTracker::new();

    if let Some(task) = plan.tasks.iter().find(|t| t.task_type == TaskType::PipelineDag) {
        return match serde_json::from_value::<conduit_plan::PipelineDag>(task.payload.clone()) {
            Ok(dag) => {
                execute_pipeline_dag(plan, &dag, pipeline_run_id, user_id, skills, registry, invoker, retry_policy, &tracker, link_sink, HashMap::new()).await
            }
            Err(err) => execution_error(&task.id, "dag_payload_malformed", &err.to_string()),
        };
    }

    if let Some(task) = plan.tasks.iter().find(|t| t.task_type == TaskType::StepwisePipeline) {
        return run_stepwise(task, user_id, invoker, retry_policy, payload_builder).await;
    }

    run_classical(plan, user_id, registry, invoker, summarizer, &tracker).await
}
