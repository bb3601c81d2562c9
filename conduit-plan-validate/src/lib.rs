//! # conduit-plan-validate
//!
//! Structural validation of an [`AgentPlan`] before it reaches the
//! executor. Checks shape, not feasibility: whether tool/service names
//! line up, task ids are unique, schemas are present. Feasibility
//! (scopes, connected services) is `conduit-profile`'s job.

#![deny(missing_docs)]

use std::collections::HashSet;

use conduit_plan::{AgentPlan, AgentTask, TaskType};

/// Why a plan failed validation, carrying the offending task id or tool
/// name where relevant so callers can surface a precise error.
///
/// [`PlanContractError::code`] renders each variant to the exact string
/// vocabulary the plan contract uses in logs and test fixtures.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlanContractError {
    /// No target service survived trimming/lower-casing.
    MissingTargetServices,
    /// A task-less plan selected an internal-only tool, e.g. an OAuth
    /// token exchange.
    InternalToolSelected(String),
    /// A task has no id at all.
    MissingTaskId,
    /// Two or more tasks share an id.
    DuplicateTaskId,
    /// A task's `task_type` isn't one this plan shape recognizes.
    InvalidTaskType(String),
    /// A `TOOL` task has no service.
    MissingTaskService(String),
    /// A `TOOL` task's service isn't in `target_services`.
    TaskServiceNotInTarget(String, String),
    /// A `TOOL` task has no tool name.
    MissingTaskToolName(String),
    /// A `TOOL` task's tool name doesn't start with `{service}_`.
    ToolServiceMismatch(String, String),
    /// A `TOOL` task selected an internal-only tool.
    InternalToolSelectedTask(String, String),
    /// An `LLM` task has no instruction.
    MissingLlmInstruction(String),
    /// A task's `output_schema` is missing or not a non-empty object.
    MissingOutputSchema(String),
    /// A task's `depends_on` names an id no task in the plan has.
    DependsOnNotFound(String, String),
    /// The plan has tasks but none of them actually execute anything.
    MissingToolTask,
}

impl PlanContractError {
    /// Render this error as the stable `{code}` or `{code}:{arg}` string
    /// used in logs, test fixtures, and the original contract.
    pub fn code(&self) -> String {
        match self {
            Self::MissingTargetServices => "missing_target_services".to_string(),
            Self::InternalToolSelected(name) => format!("internal_tool_selected:{name}"),
            Self::MissingTaskId => "missing_task_id".to_string(),
            Self::DuplicateTaskId => "duplicate_task_id".to_string(),
            Self::InvalidTaskType(id) => format!("invalid_task_type:{id}"),
            Self::MissingTaskService(id) => format!("missing_task_service:{id}"),
            Self::TaskServiceNotInTarget(id, service) => format!("task_service_not_in_target:{id}:{service}"),
            Self::MissingTaskToolName(id) => format!("missing_task_tool_name:{id}"),
            Self::ToolServiceMismatch(id, tool) => format!("tool_service_mismatch:{id}:{tool}"),
            Self::InternalToolSelectedTask(id, tool) => format!("internal_tool_selected:{id}:{tool}"),
            Self::MissingLlmInstruction(id) => format!("missing_llm_instruction:{id}"),
            Self::MissingOutputSchema(id) => format!("missing_output_schema:{id}"),
            Self::DependsOnNotFound(id, dep) => format!("depends_on_not_found:{id}:{dep}"),
            Self::MissingToolTask => "missing_tool_task".to_string(),
        }
    }
}

fn is_internal_tool_name(tool_name: &str) -> bool {
    let lowered = tool_name.to_lowercase();
    lowered.contains("oauth") || lowered.contains("token_exchange")
}

fn normalized_target_services(plan: &AgentPlan) -> Vec<String> {
    plan.target_services
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn validate_output_schema(task: &AgentTask) -> Result<(), PlanContractError> {
    match task.output_schema.as_object() {
        Some(map) if !map.is_empty() => Ok(()),
        _ => Err(PlanContractError::MissingOutputSchema(task.id.clone())),
    }
}

fn validate_tool_task(task: &AgentTask, target_services: &[String]) -> Result<(), PlanContractError> {
    let service = task.service.as_deref().unwrap_or("").trim().to_lowercase();
    if service.is_empty() {
        return Err(PlanContractError::MissingTaskService(task.id.clone()));
    }
    if !target_services.iter().any(|s| s == &service) {
        return Err(PlanContractError::TaskServiceNotInTarget(task.id.clone(), service));
    }
    let tool_name = task.tool_name.as_deref().unwrap_or("").trim().to_string();
    if tool_name.is_empty() {
        return Err(PlanContractError::MissingTaskToolName(task.id.clone()));
    }
    if !tool_name.starts_with(&format!("{service}_")) {
        return Err(PlanContractError::ToolServiceMismatch(task.id.clone(), tool_name));
    }
    if is_internal_tool_name(&tool_name) {
        return Err(PlanContractError::InternalToolSelectedTask(task.id.clone(), tool_name));
    }
    Ok(())
}

fn validate_llm_task(task: &AgentTask) -> Result<(), PlanContractError> {
    let instruction = task.instruction.as_deref().unwrap_or("").trim();
    if instruction.is_empty() {
        return Err(PlanContractError::MissingLlmInstruction(task.id.clone()));
    }
    Ok(())
}

/// Validate `plan`'s structural contract, returning `Ok(())` when it is
/// safe to hand to the executor.
///
/// Requires at least one non-empty `target_services` entry. A task-less
/// plan is valid unless it selected an internal-only tool (`oauth`,
/// `token_exchange`). A plan with tasks requires unique ids, per-type
/// field completeness for `TOOL`/`LLM` tasks, a non-empty `output_schema`
/// object on every task, resolvable `depends_on` ids, and at least one
/// task that actually executes something (`TOOL`, `PIPELINE_DAG`, or
/// `STEPWISE_PIPELINE` — `LLM`-only plans don't count, matching the
/// original contract's `has_tool_task` requirement).
pub fn validate_plan_contract(plan: &AgentPlan) -> Result<(), PlanContractError> {
    let target_services = normalized_target_services(plan);
    if target_services.is_empty() {
        return Err(PlanContractError::MissingTargetServices);
    }

    if plan.tasks.is_empty() {
        for tool_name in &plan.selected_tools {
            let trimmed = tool_name.trim();
            if !trimmed.is_empty() && is_internal_tool_name(trimmed) {
                return Err(PlanContractError::InternalToolSelected(tool_name.clone()));
            }
        }
        return Ok(());
    }

    let task_ids: Vec<String> = plan.tasks.iter().map(|t| t.id.trim().to_string()).collect();
    if task_ids.iter().any(|id| id.is_empty()) {
        return Err(PlanContractError::MissingTaskId);
    }
    let unique_ids: HashSet<&String> = task_ids.iter().collect();
    if unique_ids.len() != task_ids.len() {
        return Err(PlanContractError::DuplicateTaskId);
    }

    let mut has_executing_task = false;
    for task in &plan.tasks {
        match task.task_type {
            TaskType::Tool => {
                has_executing_task = true;
                validate_tool_task(task, &target_services)?;
            }
            TaskType::Llm => validate_llm_task(task)?,
            TaskType::PipelineDag | TaskType::StepwisePipeline => has_executing_task = true,
        }

        validate_output_schema(task)?;

        for dep in &task.depends_on {
            let dep_id = dep.trim();
            if !dep_id.is_empty() && !unique_ids.contains(&dep_id.to_string()) {
                return Err(PlanContractError::DependsOnNotFound(task.id.clone(), dep_id.to_string()));
            }
        }
    }

    if !has_executing_task {
        return Err(PlanContractError::MissingToolTask);
    }

    Ok(())
}
