//! The [`ToolDefinition`] type and its small supporting enum.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How an executor should derive an idempotency key for a tool call.
///
/// Mirrors the three policies the executor understands (spec §4.13.4):
/// no key at all, the caller-supplied event id, or a hash of the canonical
/// request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdempotencyKeyPolicy {
    /// Every call is treated as non-idempotent.
    None,
    /// The key is the caller-supplied `event_id`.
    EventId,
    /// The key is a SHA-256 hash of the canonicalized request payload.
    Hash,
}

impl Default for IdempotencyKeyPolicy {
    fn default() -> Self {
        Self::None
    }
}

/// A single callable tool, flattened from its service spec at load time.
///
/// `base_url` lives on the service spec in the source JSON and is copied
/// onto every tool of that service so `ToolRegistry::get_tool` can return a
/// self-contained value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Lower-cased service identifier, e.g. `notion`.
    pub service: String,
    /// Fully-qualified tool name, conventionally `{service}_{verb}`.
    pub tool_name: String,
    /// Human-readable description surfaced to planners and LLM tool use.
    pub description: String,
    /// HTTP method, upper-cased (`GET`, `POST`, ...).
    pub http_method: String,
    /// Path template relative to `base_url`, e.g. `/pages/{page_id}`.
    pub path_template: String,
    /// Base URL of the owning service, copied from the service spec.
    pub base_url: String,
    /// Name of the adapter function that implements the call outside of
    /// the generic HTTP invoker, if any.
    pub adapter_function: String,
    /// JSON-Schema (subset) describing the tool's input payload.
    pub input_schema: Value,
    /// OAuth scopes the caller must hold against `service` to invoke this
    /// tool. Empty means no scope check.
    pub required_scopes: Vec<String>,
    /// How the executor should derive an idempotency key for this tool.
    pub idempotency_key_policy: IdempotencyKeyPolicy,
    /// Upstream error code to business error code mapping, consulted by
    /// the executor before falling back to a generic `UPSTREAM_ERROR`.
    pub error_map: HashMap<String, String>,
}

impl ToolDefinition {
    /// Project this definition into the shape an LLM function-calling
    /// request expects: name, description, and input schema only.
    pub fn to_llm_tool(&self) -> Value {
        serde_json::json!({
            "name": self.tool_name,
            "description": self.description,
            "input_schema": self.input_schema,
        })
    }
}
