//! # conduit-links
//!
//! Extracts cross-service identifiers (a Notion page id, a Linear issue
//! id) produced by one pipeline run and upserts them as rows keyed by
//! `(user_id, event_id)`, so later runs can recognize "we already handled
//! this calendar event" and skip or compensate accordingly.

#![deny(missing_docs)]

mod extract;
mod sink;

pub use extract::{build_failure_link, extract_pipeline_links};
pub use sink::{InMemoryPipelineLinkSink, LinksError, PipelineLinkSink};
