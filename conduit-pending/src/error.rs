//! Errors from pending-action store backends.

use thiserror::Error;

/// Errors raised while reading, writing, or clearing a pending action.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PendingStoreError {
    /// `user_id` was empty or all whitespace.
    #[error("user_id_required")]
    UserIdRequired,

    /// The backend could not serialize or deserialize a stored entry.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The durable backend failed to write (e.g. filesystem error).
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
