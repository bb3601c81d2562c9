//! Where pipeline link rows get upserted. The original implementation
//! talks to a managed Postgres table; this crate only models the
//! upsert-on-`(user_id, event_id)` contract and ships an in-memory
//! reference sink, matching the dual in-memory/durable split
//! `conduit-pending` uses for its own store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use conduit_plan::PipelineLinkRow;

/// Failure writing link rows to a sink.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LinksError {
    /// The underlying store rejected the write.
    #[error("write failed: {0}")]
    WriteFailed(String),
    /// Any other failure, wrapped for context.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Persists [`PipelineLinkRow`]s, upserted on `(user_id, event_id)`.
#[async_trait]
pub trait PipelineLinkSink: Send + Sync {
    /// Upsert every row in `links`. A failure partway through leaves
    /// previously-applied rows in place; callers treat any `Err` as "retry
    /// the whole batch later", matching the original's all-or-nothing
    /// `upsert(..).execute()` call.
    async fn upsert_many(&self, links: &[PipelineLinkRow]) -> Result<(), LinksError>;

    /// Read back the row currently stored for `(user_id, event_id)`, for
    /// tests and diagnostics.
    async fn get(&self, user_id: &str, event_id: &str) -> Option<PipelineLinkRow>;
}

/// In-process reference sink, keyed by `(user_id, event_id)`.
#[derive(Default)]
pub struct InMemoryPipelineLinkSink {
    rows: RwLock<HashMap<(String, String), PipelineLinkRow>>,
}

impl InMemoryPipelineLinkSink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in an `Arc` for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl PipelineLinkSink for InMemoryPipelineLinkSink {
    async fn upsert_many(&self, links: &[PipelineLinkRow]) -> Result<(), LinksError> {
        let mut rows = self.rows.write().await;
        for link in links {
            rows.insert((link.user_id.clone(), link.event_id.clone()), link.clone());
        }
        Ok(())
    }

    async fn get(&self, user_id: &str, event_id: &str) -> Option<PipelineLinkRow> {
        self.rows.read().await.get(&(user_id.to_string(), event_id.to_string())).cloned()
    }
}
