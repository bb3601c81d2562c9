//! # conduit-core
//!
//! Shared ids, error taxonomy, canonical hashing, and JSON path resolution
//! used across the conduit orchestration engine. Every other crate in the
//! workspace depends on this one; it depends on nothing but `serde` and
//! `serde_json`.

#![deny(missing_docs)]

pub mod canonical;
pub mod duration;
pub mod error;
pub mod id;
pub mod refpath;

pub use canonical::sha256_hex;
pub use duration::DurationMs;
pub use error::{is_retryable_pipeline_error, BusinessErrorCode, PipelineErrorCode};
pub use id::{NodeId, RequestId, RunId, TaskId, UserId};
pub use refpath::{get_path, is_reference, parse_reference, Reference};
