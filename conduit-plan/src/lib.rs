//! # conduit-plan
//!
//! Shared plan, task, pipeline-DAG, and link-row types used across planners,
//! the executor, and the orchestrator. Pure data — no I/O, no validation
//! beyond what the type system expresses (see `conduit-plan-validate` for
//! contract checks).

#![deny(missing_docs)]

mod dag;
mod links;
mod plan;
mod task;

pub use dag::{DagNode, ForEachNode, LlmTransformNode, PipelineDag, PipelineLimits, SkillNode, VerifyNode};
pub use links::{CompensationStatus, LinkStatus, PipelineLinkRow};
pub use plan::{AgentExecutionResult, AgentExecutionStep, AgentPlan, AgentRequirement, AgentRunResult, Payload, PlanSource};
pub use task::{AgentTask, TaskType};
