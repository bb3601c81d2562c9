//! The [`PipelineLinkRow`] record, owned by the pipeline links writer (C15).

use serde::{Deserialize, Serialize};

/// Outcome status of one pipeline run, recorded against `(user_id, event_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// All mutations for this event succeeded.
    Succeeded,
    /// The run failed and compensation did not fully resolve it.
    Failed,
    /// Compensation itself failed; a human must reconcile state manually.
    ManualRequired,
}

/// Whether compensation ran, and whether it succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationStatus {
    /// No mutation happened, so nothing needed compensating.
    NotRequired,
    /// Every inverse operation succeeded.
    Completed,
    /// At least one inverse operation failed.
    Failed,
}

impl CompensationStatus {
    /// The `snake_case` string used by this enum's serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompensationStatus::NotRequired => "not_required",
            CompensationStatus::Completed => "completed",
            CompensationStatus::Failed => "failed",
        }
    }
}

/// A cross-service link record: one row per `(user_id, event_id)`, upserted
/// on conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineLinkRow {
    /// Owning user.
    pub user_id: String,
    /// Upstream event id this run was triggered by. Non-empty.
    pub event_id: String,
    /// Notion page id produced by this run, if any.
    #[serde(default)]
    pub notion_page_id: Option<String>,
    /// Linear issue id produced by this run, if any.
    #[serde(default)]
    pub linear_issue_id: Option<String>,
    /// Id of the pipeline run that produced this row.
    pub run_id: String,
    /// Outcome status.
    pub status: LinkStatus,
    /// Canonical error code, present when `status != succeeded`.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Compensation outcome.
    pub compensation_status: CompensationStatus,
    /// RFC 3339 timestamp of the last upsert.
    pub updated_at: String,
}

impl PipelineLinkRow {
    /// The upsert key: `(user_id, event_id)`.
    pub fn key(&self) -> (&str, &str) {
        (&self.user_id, &self.event_id)
    }
}
