//! The [`SkillContract`] type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provider section of a skill contract: which service backs it and which
/// OAuth scopes it needs from that service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillProvider {
    /// Service identifier, must equal the prefix of the contract's `name`.
    pub service: String,
    /// OAuth scopes required against `service`. Defaults to empty.
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// One declarative skill: a named capability backed by an ordered set of
/// runtime tools, with typed input/output and autofill hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillContract {
    /// `{service}.{verb}`, e.g. `notion.page_create`.
    pub name: String,
    /// Contract version string, opaque to this crate.
    pub version: String,
    /// Human-readable summary.
    pub summary: String,
    /// Backing service and required scopes.
    pub provider: SkillProvider,
    /// Autofill hints consulted by planners, opaque to this crate.
    pub autofill: Value,
    /// JSON-Schema (subset) for the skill's input.
    pub input_schema: Value,
    /// JSON-Schema (subset) for the skill's output.
    pub output_schema: Value,
    /// Non-empty list of example invocations, opaque to this crate.
    pub examples: Vec<Value>,
    /// Non-empty ordered list of tool names this skill drives at runtime.
    pub runtime_tools: Vec<String>,
}

impl SkillContract {
    /// The service prefix of `name` (everything before the first `.`).
    pub fn service_prefix(&self) -> &str {
        self.name.split_once('.').map(|(prefix, _)| prefix).unwrap_or(&self.name)
    }
}
