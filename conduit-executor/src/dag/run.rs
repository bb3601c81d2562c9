//! The DAG executor's scheduling loop (§4.13.2): single-threaded
//! cooperative execution of ready nodes in topological order, dispatching
//! by node type and threading resolved outputs through `$node_id`/`$item`
//! bindings.

use std::collections::{HashMap, HashSet};

use conduit_plan::{DagNode, ForEachNode, LlmTransformNode, PipelineDag, SkillNode, VerifyNode};
use conduit_registry::ToolRegistry;
use conduit_skills::SkillStore;
use serde_json::{json, Map, Value};

use super::compensation::SuccessfulMutation;
use super::interpolate::interpolate;
use super::retry::{retry_with_policy, RetryPolicy};
use crate::idempotency::IdempotencyTracker;
use crate::invoker::{idempotency_key, ToolInvoker};
use crate::verification::ExecutedCall;

/// Everything needed to execute a single node, bundled so the recursive
/// `for_each` case doesn't have to thread six separate parameters.
struct Ctx<'a> {
    dag: &'a PipelineDag,
    user_id: &'a str,
    skills: &'a SkillStore,
    registry: &'a ToolRegistry,
    invoker: &'a dyn ToolInvoker,
    retry_policy: &'a RetryPolicy,
    tracker: &'a IdempotencyTracker,
}

/// Everything accumulated while running a DAG, whether it ultimately
/// succeeded or failed partway through. Failures still carry this so the
/// caller can compensate and log.
#[derive(Debug, Clone, Default)]
pub struct DagRunOutcome {
    /// Each node's resolved output, keyed by node id.
    pub node_outputs: HashMap<String, Value>,
    /// Successful mutating tool calls, in execution order, for compensation.
    pub mutations: Vec<SuccessfulMutation>,
    /// Every successful `skill` node's tool call, mutating or not, for
    /// post-execution verification (§4.13.2).
    pub tool_calls: Vec<ExecutedCall>,
    /// Total tool invocations made, across `skill` nodes and `for_each` children.
    pub tool_call_count: u32,
    /// Human-readable per-node trace, in execution order.
    pub step_names: Vec<String>,
}

/// A DAG run stopped at `failed_node`, with `partial` carrying everything
/// executed before the failure.
#[derive(Debug, Clone)]
pub struct DagFailure {
    /// The node that failed.
    pub failed_node: String,
    /// Canonical pipeline error code.
    pub error_code: String,
    /// Human-readable detail.
    pub reason: String,
    /// Everything executed before the failure, for compensation.
    pub partial: DagRunOutcome,
}

const MUTATING_SUFFIXES: &[&str] = &["_create_page", "_create_issue", "_update_page", "_update_issue", "_append_block_children", "_delete"];

fn looks_mutating(tool_name: &str) -> bool {
    MUTATING_SUFFIXES.iter().any(|suffix| tool_name.ends_with(suffix))
}

/// Run every top-level node of `dag` (nodes not owned by a `for_each`'s
/// `item_node_ids`) in topological order, starting from `initial_bindings`
/// (typically just the plan's own inputs).
#[allow(clippy::too_many_arguments)]
pub async fn run_dag(
    dag: &PipelineDag,
    pipeline_run_id: &str,
    user_id: &str,
    skills: &SkillStore,
    registry: &ToolRegistry,
    invoker: &dyn ToolInvoker,
    retry_policy: &RetryPolicy,
    tracker: &IdempotencyTracker,
    initial_bindings: HashMap<String, Value>,
) -> Result<DagRunOutcome, DagFailure> {
    use tracing::Instrument;

    let ctx = Ctx { dag, user_id, skills, registry, invoker, retry_policy, tracker };

    let child_ids: HashSet<&str> = dag
        .nodes
        .iter()
        .filter_map(|n| match n {
            DagNode::ForEach(f) => Some(f.item_node_ids.iter().map(String::as_str)),
            _ => None,
        })
        .flatten()
        .collect();

    let top_level: Vec<&DagNode> = dag.nodes.iter().filter(|n| !child_ids.contains(n.id())).collect();
    let order = topological_order(&top_level);

    let mut outcome = DagRunOutcome { node_outputs: initial_bindings, ..Default::default() };

    for node in order {
        let bindings_snapshot = outcome.node_outputs.clone();
        let span = conduit_observability::dag_node_span(pipeline_run_id, node.id(), node_type_name(node));
        match execute_node(&ctx, node, &bindings_snapshot, &mut outcome).instrument(span).await {
            Ok(output) => {
                outcome.node_outputs.insert(node.id().to_string(), output);
                outcome.step_names.push(node.id().to_string());
            }
            Err((code, reason)) => {
                return Err(DagFailure { failed_node: node.id().to_string(), error_code: code, reason, partial: outcome });
            }
        }
    }

    Ok(outcome)
}

fn node_type_name(node: &DagNode) -> &'static str {
    match node {
        DagNode::Skill(_) => "skill",
        DagNode::LlmTransform(_) => "llm_transform",
        DagNode::ForEach(_) => "for_each",
        DagNode::Verify(_) => "verify",
    }
}

fn topological_order<'a>(nodes: &[&'a DagNode]) -> Vec<&'a DagNode> {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id()).collect();
    let index_of: HashMap<&str, usize> = nodes.iter().enumerate().map(|(i, n)| (n.id(), i)).collect();
    let mut in_degree = vec![0usize; nodes.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        for dep in node.depends_on() {
            if !ids.contains(dep.as_str()) {
                continue;
            }
            let dep_idx = index_of[dep.as_str()];
            in_degree[i] += 1;
            dependents[dep_idx].push(i);
        }
    }
    let mut ready: Vec<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    ready.sort_unstable();
    let mut order = Vec::with_capacity(nodes.len());
    let mut cursor = 0;
    while cursor < ready.len() {
        let current = ready[cursor];
        cursor += 1;
        order.push(nodes[current]);
        let mut newly_ready: Vec<usize> = Vec::new();
        for &dependent in &dependents[current] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                newly_ready.push(dependent);
            }
        }
        newly_ready.sort_unstable();
        ready.extend(newly_ready);
    }
    order
}

fn execute_node<'a>(
    ctx: &'a Ctx<'a>,
    node: &'a DagNode,
    bindings: &'a HashMap<String, Value>,
    outcome: &'a mut DagRunOutcome,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Value, (String, String)>> + 'a>> {
    Box::pin(async move {
        match node {
            DagNode::Skill(skill_node) => execute_skill(ctx, skill_node, bindings, outcome).await,
            DagNode::LlmTransform(transform_node) => execute_transform(transform_node, bindings),
            DagNode::ForEach(for_each_node) => execute_for_each(ctx, for_each_node, node.id(), bindings, outcome).await,
            DagNode::Verify(verify_node) => execute_verify(verify_node, bindings),
        }
    })
}

async fn execute_skill(ctx: &Ctx<'_>, node: &SkillNode, bindings: &HashMap<String, Value>, outcome: &mut DagRunOutcome) -> Result<Value, (String, String)> {
    let tool_name = ctx
        .skills
        .runtime_tools_for_skill(&node.name)
        .into_iter()
        .next()
        .ok_or_else(|| ("DSL_VALIDATION_FAILED".to_string(), format!("unresolved_skill:{}", node.name)))?;

    let payload = interpolate(&node.input, bindings).map_err(|err| ("DSL_REF_NOT_FOUND".to_string(), format!("{}.{}", err.root, err.path)))?;

    let key = ctx.registry.get_tool(&tool_name).ok().and_then(|tool| idempotency_key(tool, &payload, None));
    let cached = key.as_ref().and_then(|key| ctx.tracker.lookup(&tool_name, key));

    let result = if let Some(cached) = cached {
        outcome_to_retry_result(cached)
    } else {
        let invoked = retry_with_policy(ctx.retry_policy, || {
            let payload = &payload;
            let tool_name = &tool_name;
            async move { outcome_to_retry_result(ctx.invoker.invoke(ctx.user_id, tool_name, payload).await) }
        })
        .await;
        if let (Some(key), Ok(data)) = (&key, &invoked) {
            ctx.tracker.record(&tool_name, key, crate::invoker::ToolInvocationOutcome { ok: true, data: Some(data.clone()), error_code: None });
        }
        invoked
    };

    outcome.tool_call_count += 1;

    match result {
        Ok(data) => {
            if looks_mutating(&tool_name) {
                outcome.mutations.push(SuccessfulMutation { node_id: node.id.clone(), tool_name: tool_name.clone(), result: data.clone() });
            }
            outcome.tool_calls.push(ExecutedCall { tool_name: tool_name.clone(), payload: payload.clone(), result: Some(data.clone()) });
            Ok(data)
        }
        Err(code) => Err((pipeline_code_of(&code), code)),
    }
}

fn outcome_to_retry_result(outcome: crate::invoker::ToolInvocationOutcome) -> Result<Value, String> {
    if outcome.ok {
        Ok(outcome.data.unwrap_or(Value::Null))
    } else {
        Err(outcome.error_code.unwrap_or_else(|| "TOOL_FAILED".to_string()))
    }
}

fn pipeline_code_of(detail: &str) -> String {
    let after_tool = detail.split(':').nth(1).unwrap_or(detail);
    after_tool.split('|').next().unwrap_or(after_tool).to_string()
}

fn execute_transform(node: &LlmTransformNode, bindings: &HashMap<String, Value>) -> Result<Value, (String, String)> {
    let payload = interpolate(&node.input, bindings).map_err(|err| ("DSL_REF_NOT_FOUND".to_string(), format!("{}.{}", err.root, err.path)))?;
    let output = conduit_transform::run_transform_contract(&node.transform, &payload);
    let required = node.output_schema.get("required").and_then(Value::as_array).cloned().unwrap_or_default();
    for key in &required {
        let Some(key) = key.as_str() else { continue };
        let present = output.get(key).map(|v| !v.is_null()).unwrap_or(false);
        if !present {
            return Err(("DSL_VALIDATION_FAILED".to_string(), format!("missing_output_key:{key}")));
        }
    }
    Ok(output)
}

async fn execute_for_each(ctx: &Ctx<'_>, node: &ForEachNode, node_id: &str, bindings: &HashMap<String, Value>, outcome: &mut DagRunOutcome) -> Result<Value, (String, String)> {
    let max_fanout = ctx.dag.limits.max_fanout as usize;
    let source = interpolate(&Value::String(node.source_ref.clone()), bindings).map_err(|err| ("DSL_REF_NOT_FOUND".to_string(), format!("{}.{}", err.root, err.path)))?;
    let Value::Array(items) = source else {
        return Err(("DSL_VALIDATION_FAILED".to_string(), format!("{node_id}:source_ref_not_an_array")));
    };
    let items: Vec<Value> = items.into_iter().take(max_fanout).collect();

    let mut item_results = Vec::with_capacity(items.len());
    for item in items {
        let mut item_bindings = bindings.clone();
        item_bindings.insert("item".to_string(), item);

        let mut item_outputs = Map::new();
        for child_id in &node.item_node_ids {
            let Some(child_node) = ctx.dag.node(child_id) else {
                return Err(("DSL_VALIDATION_FAILED".to_string(), format!("{node_id}:missing_child_node:{child_id}")));
            };
            match execute_node(ctx, child_node, &item_bindings, outcome).await {
                Ok(output) => {
                    item_bindings.insert(child_id.clone(), output.clone());
                    item_outputs.insert(child_id.clone(), output);
                }
                Err((code, reason)) => {
                    return Err((code, format!("{node_id}[{child_id}]:{reason}")));
                }
            }
        }
        item_results.push(Value::Object(item_outputs));
    }

    Ok(json!({ "item_results": item_results }))
}

fn execute_verify(node: &VerifyNode, bindings: &HashMap<String, Value>) -> Result<Value, (String, String)> {
    for rule in &node.rules {
        match evaluate_rule(rule, bindings) {
            Ok(true) => continue,
            Ok(false) => return Err((rule_failure_code(rule), rule.clone())),
            Err(reason) => return Err(("DSL_REF_NOT_FOUND".to_string(), reason)),
        }
    }
    Ok(json!({ "verified": true }))
}

fn rule_failure_code(rule: &str) -> String {
    for code in ["VERIFY_COUNT_MISMATCH", "DSL_VALIDATION_FAILED", "TOOL_AUTH_ERROR"] {
        if rule.contains(code) {
            return code.to_string();
        }
    }
    "VERIFY_COUNT_MISMATCH".to_string()
}

fn evaluate_rule(rule: &str, bindings: &HashMap<String, Value>) -> Result<bool, String> {
    let rule = rule.trim();
    for op in ["!=", "=="] {
        if let Some(idx) = rule.find(op) {
            let lhs = resolve_operand(rule[..idx].trim(), bindings)?;
            let rhs = resolve_operand(rule[idx + op.len()..].trim(), bindings)?;
            return Ok(if op == "!=" { lhs != rhs } else { lhs == rhs });
        }
    }
    Ok(is_truthy(&resolve_operand(rule, bindings)?))
}

fn resolve_operand(text: &str, bindings: &HashMap<String, Value>) -> Result<Value, String> {
    if text == "null" {
        return Ok(Value::Null);
    }
    if text == "true" || text == "false" {
        return Ok(Value::Bool(text == "true"));
    }
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        return Ok(Value::String(text[1..text.len() - 1].to_string()));
    }
    if let Ok(n) = text.parse::<f64>() {
        return Ok(json!(n));
    }
    interpolate(&Value::String(text.to_string()), bindings).map_err(|err| format!("{}.{}", err.root, err.path))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
    }
}
