//! Classical sequential execution (§4.13.1): runs a plan's `tasks` in
//! dependency-respecting topological order, ties broken by declaration
//! order, writing each task's output into a shared step map for
//! downstream `LLM` tasks to consume.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::Value;

use conduit_plan::{AgentExecutionResult, AgentExecutionStep, AgentPlan, AgentTask, TaskType};
use conduit_registry::ToolRegistry;

use crate::idempotency::IdempotencyTracker;
use crate::invoker::{idempotency_key, ToolInvocationOutcome, ToolInvoker};
use crate::verification::{verify_plan, ExecutedCall};

/// Summarises or transforms dependency outputs for an `LLM` task.
/// Injected rather than tied to a concrete provider, mirroring
/// `conduit-planner-llm::LlmProvider`.
#[async_trait]
pub trait TaskSummarizer: Send + Sync {
    /// Produce this `LLM` task's output from its `instruction` and the
    /// already-computed outputs of the tasks it depends on.
    async fn summarize(&self, instruction: &str, dependency_outputs: &Value) -> Result<Value, String>;
}

/// Orders `tasks` so every task follows everything in its `depends_on`,
/// breaking ties by original declaration order. Returns `None` on a
/// cycle or a `depends_on` id that does not resolve (both should already
/// be rejected by `conduit-plan-validate`, but the executor does not
/// trust that blindly).
fn topological_order(tasks: &[AgentTask]) -> Option<Vec<usize>> {
    let index_of: HashMap<&str, usize> = tasks.iter().enumerate().map(|(i, t)| (t.id.as_str(), i)).collect();
    let mut in_degree = vec![0usize; tasks.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (i, task) in tasks.iter().enumerate() {
        for dep in &task.depends_on {
            let dep_idx = *index_of.get(dep.as_str())?;
            in_degree[i] += 1;
            dependents[dep_idx].push(i);
        }
    }

    let mut ready: Vec<usize> = (0..tasks.len()).filter(|&i| in_degree[i] == 0).collect();
    ready.sort_unstable();
    let mut order = Vec::with_capacity(tasks.len());
    let mut cursor = 0;
    while cursor < ready.len() {
        let current = ready[cursor];
        cursor += 1;
        order.push(current);
        let mut newly_ready = Vec::new();
        for &dependent in &dependents[current] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                newly_ready.push(dependent);
            }
        }
        newly_ready.sort_unstable();
        ready.extend(newly_ready);
    }

    if order.len() == tasks.len() {
        Some(order)
    } else {
        None
    }
}

/// Invoke `tool_name`, reusing a cached successful outcome from `tracker`
/// when the tool's idempotency key policy yields a key already seen in
/// this run. Classical tasks carry no upstream `event_id`, so the
/// `event_id` policy never derives a key here (§4.13.4 is a no-op for it
/// in this execution mode; only `hash` applies).
async fn invoke_idempotently(
    registry: &ToolRegistry,
    invoker: &dyn ToolInvoker,
    tracker: &IdempotencyTracker,
    user_id: &str,
    tool_name: &str,
    payload: &Value,
) -> ToolInvocationOutcome {
    let key = registry.get_tool(tool_name).ok().and_then(|tool| idempotency_key(tool, payload, None));
    if let Some(key) = &key {
        if let Some(cached) = tracker.lookup(tool_name, key) {
            return cached;
        }
    }
    let outcome = invoker.invoke(user_id, tool_name, payload).await;
    if let Some(key) = &key {
        tracker.record(tool_name, key, outcome.clone());
    }
    outcome
}

/// Gather `{task_id: output}` for a task's `depends_on`, for handing to
/// an `LLM` task's summarizer.
fn dependency_context(task: &AgentTask, step_outputs: &HashMap<String, Value>) -> Value {
    let mut context = serde_json::Map::new();
    for dep in &task.depends_on {
        if let Some(output) = step_outputs.get(dep) {
            context.insert(dep.clone(), output.clone());
        }
    }
    Value::Object(context)
}

/// Run `plan`'s `tasks` sequentially, stopping at the first failure. Each
/// `TOOL` task's call is deduplicated against `tracker` by its
/// [`conduit_registry::ToolDefinition::idempotency_key_policy`] (§4.13.4);
/// `registry` resolves the tool definition the key policy is read from.
pub async fn run_classical(
    plan: &AgentPlan,
    user_id: &str,
    registry: &ToolRegistry,
    invoker: &dyn ToolInvoker,
    summarizer: &dyn TaskSummarizer,
    tracker: &IdempotencyTracker,
) -> AgentExecutionResult {
    let mut artifacts = HashMap::new();
    let mut steps = Vec::new();

    let Some(order) = topological_order(&plan.tasks) else {
        artifacts.insert("error_code".to_string(), "execution_error".to_string());
        artifacts.insert("reason".to_string(), "task_dependency_cycle".to_string());
        return AgentExecutionResult {
            success: false,
            user_message: "작업 실행 순서를 계산할 수 없습니다.".to_string(),
            summary: "classical execution failed".to_string(),
            artifacts,
            steps,
        };
    };

    let mut step_outputs: HashMap<String, Value> = HashMap::new();
    let mut executed: HashSet<String> = HashSet::new();

    for index in order {
        let task = &plan.tasks[index];
        match task.task_type {
            TaskType::Tool => {
                let Some(tool_name) = task.tool_name.as_deref() else {
                    steps.push(AgentExecutionStep { name: task.id.clone(), status: "failed".to_string(), detail: "missing_tool_name".to_string() });
                    artifacts.insert("error_code".to_string(), "execution_error".to_string());
                    artifacts.insert("failed_step".to_string(), task.id.clone());
                    artifacts.insert("reason".to_string(), "missing_tool_name".to_string());
                    return failed(artifacts, steps);
                };
                let outcome = invoke_idempotently(registry, invoker, tracker, user_id, tool_name, &task.payload).await;
                if outcome.ok {
                    let data = outcome.data.unwrap_or(Value::Null);
                    step_outputs.insert(task.id.clone(), data);
                    executed.insert(task.id.clone());
                    steps.push(AgentExecutionStep { name: task.id.clone(), status: "ok".to_string(), detail: tool_name.to_string() });
                } else {
                    let code = outcome.error_code.unwrap_or_else(|| "tool_failed".to_string());
                    steps.push(AgentExecutionStep { name: task.id.clone(), status: "failed".to_string(), detail: code.clone() });
                    let retryable = conduit_core::error::is_retryable_pipeline_error(pipeline_error_code(&code));
                    artifacts.insert("error_code".to_string(), code.clone());
                    artifacts.insert("failed_step".to_string(), task.id.clone());
                    artifacts.insert("reason".to_string(), code);
                    artifacts.insert("retry_hint".to_string(), retryable.to_string());
                    artifacts.insert("idempotent_success_reuse_count".to_string(), tracker.reuse_count().to_string());
                    return failed(artifacts, steps);
                }
            }
            TaskType::Llm => {
                let Some(instruction) = task.instruction.as_deref() else {
                    artifacts.insert("error_code".to_string(), "execution_error".to_string());
                    artifacts.insert("failed_step".to_string(), task.id.clone());
                    artifacts.insert("reason".to_string(), "missing_instruction".to_string());
                    steps.push(AgentExecutionStep { name: task.id.clone(), status: "failed".to_string(), detail: "missing_instruction".to_string() });
                    return failed(artifacts, steps);
                };
                let context = dependency_context(task, &step_outputs);
                match summarizer.summarize(instruction, &context).await {
                    Ok(output) => {
                        step_outputs.insert(task.id.clone(), output);
                        executed.insert(task.id.clone());
                        steps.push(AgentExecutionStep { name: task.id.clone(), status: "ok".to_string(), detail: "llm".to_string() });
                    }
                    Err(reason) => {
                        artifacts.insert("error_code".to_string(), "llm_autofill_failed".to_string());
                        artifacts.insert("failed_step".to_string(), task.id.clone());
                        artifacts.insert("reason".to_string(), reason.clone());
                        steps.push(AgentExecutionStep { name: task.id.clone(), status: "failed".to_string(), detail: reason });
                        return failed(artifacts, steps);
                    }
                }
            }
            TaskType::PipelineDag | TaskType::StepwisePipeline => {
                // Handled by the DAG executor; a classical run never sees these.
                steps.push(AgentExecutionStep { name: task.id.clone(), status: "skipped".to_string(), detail: "delegated_to_dag_executor".to_string() });
            }
        }
    }

    let calls: Vec<ExecutedCall> = plan
        .tasks
        .iter()
        .filter(|task| task.task_type == TaskType::Tool)
        .filter_map(|task| {
            let tool_name = task.tool_name.clone()?;
            Some(ExecutedCall { tool_name, payload: task.payload.clone(), result: step_outputs.get(&task.id).cloned() })
        })
        .collect();

    artifacts.insert("idempotent_success_reuse_count".to_string(), tracker.reuse_count().to_string());

    if let Some(reason) = verify_plan(plan, &calls) {
        artifacts.insert("error_code".to_string(), "verification_failed".to_string());
        artifacts.insert("verification_reason".to_string(), reason.to_string());
        return AgentExecutionResult {
            success: false,
            user_message: "작업은 실행됐지만 요청하신 내용이 검증되지 않았습니다.".to_string(),
            summary: "classical execution failed verification".to_string(),
            artifacts,
            steps,
        };
    }

    AgentExecutionResult {
        success: true,
        user_message: "요청하신 작업을 완료했습니다.".to_string(),
        summary: format!("classical execution completed {} task(s)", executed.len()),
        artifacts,
        steps,
    }
}

fn failed(artifacts: HashMap<String, String>, steps: Vec<AgentExecutionStep>) -> AgentExecutionResult {
    AgentExecutionResult {
        success: false,
        user_message: "요청을 처리하는 중 오류가 발생했습니다.".to_string(),
        summary: "classical execution failed".to_string(),
        artifacts,
        steps,
    }
}

/// Pull the bare pipeline error code (e.g. `TOOL_RATE_LIMITED`) out of a
/// `{tool}:{code}[|status=…]` detail string, for the retryable check.
fn pipeline_error_code(detail: &str) -> &str {
    let after_tool = detail.split(':').nth(1).unwrap_or(detail);
    after_tool.split('|').next().unwrap_or(after_tool)
}
