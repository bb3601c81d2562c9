//! Where log rows land. Writes are best-effort: a real implementation
//! catches its own I/O errors, logs them with [`tracing::warn`], and
//! returns normally — nothing about a run's user-visible outcome may
//! depend on whether a log write succeeded.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::rows::{CommandLogRow, PipelineStepLogRow};

/// Records [`CommandLogRow`]s and [`PipelineStepLogRow`]s. Implementations
/// must not return an error to the caller; swallow and log instead.
#[async_trait]
pub trait ObservabilityWriter: Send + Sync {
    /// Record one `run_agent_analysis` call.
    async fn write_command_log(&self, row: CommandLogRow);
    /// Record one DAG node's outcome.
    async fn write_pipeline_step_log(&self, row: PipelineStepLogRow);
}

/// In-process reference writer, for tests and local development.
#[derive(Default)]
pub struct InMemoryObservabilityWriter {
    command_logs: RwLock<Vec<CommandLogRow>>,
    pipeline_step_logs: RwLock<Vec<PipelineStepLogRow>>,
}

impl InMemoryObservabilityWriter {
    /// An empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every command log written so far, oldest first.
    pub async fn command_logs(&self) -> Vec<CommandLogRow> {
        self.command_logs.read().await.clone()
    }

    /// Snapshot of every pipeline step log written so far, oldest first.
    pub async fn pipeline_step_logs(&self) -> Vec<PipelineStepLogRow> {
        self.pipeline_step_logs.read().await.clone()
    }
}

#[async_trait]
impl ObservabilityWriter for InMemoryObservabilityWriter {
    async fn write_command_log(&self, row: CommandLogRow) {
        self.command_logs.write().await.push(row);
    }

    async fn write_pipeline_step_log(&self, row: PipelineStepLogRow) {
        self.pipeline_step_logs.write().await.push(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command_row() -> CommandLogRow {
        CommandLogRow {
            user_id: "user-1".to_string(),
            command: "agent_plan".to_string(),
            status: "ok".to_string(),
            final_status: "ok".to_string(),
            plan_source: "rule".to_string(),
            execution_mode: "classical".to_string(),
            error_code: None,
            verification_reason: None,
            autonomous_fallback_reason: None,
            detail: "services=notion".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn writes_accumulate_in_order() {
        let writer = InMemoryObservabilityWriter::new();
        writer.write_command_log(command_row()).await;
        let mut second = command_row();
        second.status = "validation_error".to_string();
        writer.write_command_log(second).await;
        let logs = writer.command_logs().await;
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].status, "validation_error");
    }
}
