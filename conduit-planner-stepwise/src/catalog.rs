//! The restricted tool catalog a stepwise pipeline is allowed to draw from.

use conduit_registry::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One tool entry in the stepwise catalog, the subset of a
/// [`conduit_registry::ToolDefinition`] the planner and the LLM prompt
/// need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTool {
    /// Owning service.
    pub service: String,
    /// Fully-qualified tool name.
    pub tool_name: String,
    /// Human-readable description.
    pub description: String,
    /// Required input field names, from the tool's `input_schema`.
    pub required_fields: Vec<String>,
}

/// Whether `tool_name` may appear in a stepwise pipeline. Excludes OAuth
/// token-exchange tools, which must never be reachable from a plan.
pub fn is_tool_allowed_for_stepwise(tool_name: &str) -> bool {
    let normalized = tool_name.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    if normalized.starts_with("notion_oauth_token_") {
        return false;
    }
    if normalized.contains("_oauth_") {
        return false;
    }
    true
}

fn required_fields_of(tool: &conduit_registry::ToolDefinition) -> Vec<String> {
    tool.input_schema
        .get("required")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

/// Build the stepwise catalog: every tool connected and allowed for
/// `connected_services`, filtered to `enabled_api_ids` (the risk/scope
/// policy gate's output) and to [`is_tool_allowed_for_stepwise`].
pub fn build_tool_catalog(registry: &ToolRegistry, connected_services: &[String], enabled_api_ids: &HashSet<String>) -> Vec<CatalogTool> {
    registry
        .list_available_tools(connected_services, None)
        .into_iter()
        .filter(|tool| is_tool_allowed_for_stepwise(&tool.tool_name) && enabled_api_ids.contains(&tool.tool_name))
        .map(|tool| CatalogTool {
            service: tool.service.clone(),
            tool_name: tool.tool_name.clone(),
            description: tool.description.clone(),
            required_fields: required_fields_of(tool),
        })
        .collect()
}
