//! `tracing` spans wired around the hot paths of a run, so any
//! `tracing-subscriber` layer (OTel, JSON, etc.) can observe the
//! orchestrator without code changes to the core crates — the same
//! bring-your-own-subscriber model `neuron-otel` uses for `gen_ai.*` spans.

use tracing::Span;

/// Span wrapping one `run_agent_analysis` call.
pub fn run_agent_analysis_span(request_id: &str, user_id: &str) -> Span {
    tracing::info_span!("run_agent_analysis", request_id = %request_id, user_id = %user_id)
}

/// Span wrapping one DAG node's execution.
pub fn dag_node_span(pipeline_run_id: &str, node_id: &str, node_type: &str) -> Span {
    tracing::info_span!(
        "dag_node",
        pipeline_run_id = %pipeline_run_id,
        node_id = %node_id,
        node_type = %node_type,
    )
}

/// Span wrapping one tool invocation.
pub fn tool_invoke_span(service: &str, tool_name: &str) -> Span {
    tracing::info_span!("tool_invoke", service = %service, tool_name = %tool_name)
}
