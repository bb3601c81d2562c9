//! # conduit-observability
//!
//! Best-effort run/command/step logging plus `tracing` spans around the
//! orchestrator's hot paths.

#![deny(missing_docs)]

mod detail;
mod rows;
mod span;
mod writer;

pub use detail::{parse_detail, DetailBuilder};
pub use rows::{CommandLogRow, PipelineStepLogRow};
pub use span::{dag_node_span, run_agent_analysis_span, tool_invoke_span};
pub use writer::{InMemoryObservabilityWriter, ObservabilityWriter};
