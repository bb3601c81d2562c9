//! # conduit-registry
//!
//! Loads and validates per-service JSON tool specs from a directory and
//! exposes them as typed [`ToolDefinition`]s through [`ToolRegistry`].
//!
//! A tool spec file declares one external service: its base URL, required
//! OAuth scopes, and a non-empty list of tools. Every `*.json` file under
//! the specs directory is loaded except `schema.json`, which documents the
//! shape but is not itself a spec.

#![deny(missing_docs)]

mod definition;
mod load;

pub use definition::{IdempotencyKeyPolicy, ToolDefinition};
pub use load::ToolSpecError;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

/// Registry of tools, immutable once loaded.
#[derive(Debug)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Build a registry from already-validated tool definitions. Prefer
    /// [`ToolRegistry::load_from_dir`] in production; this constructor is
    /// for tests that assemble definitions in-memory.
    pub fn from_tools(tools: Vec<ToolDefinition>) -> Self {
        let by_name = tools
            .iter()
            .enumerate()
            .map(|(idx, tool)| (tool.tool_name.clone(), idx))
            .collect();
        Self { tools, by_name }
    }

    /// Load every `*.json` spec (excluding `schema.json`) under `dir`,
    /// validating each before any tool is exposed. Fails the whole load on
    /// the first invalid spec, naming the offending file and field.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ToolSpecError> {
        load::load_from_dir(dir)
    }

    /// All distinct service identifiers present in the registry, sorted.
    pub fn list_services(&self) -> Vec<String> {
        let mut services: Vec<String> = self.tools.iter().map(|t| t.service.clone()).collect();
        services.sort();
        services.dedup();
        services
    }

    /// Tools for a single service, or every tool when `service` is `None`.
    pub fn list_tools(&self, service: Option<&str>) -> Vec<&ToolDefinition> {
        match service {
            None => self.tools.iter().collect(),
            Some(service) => {
                let normalized = service.trim().to_lowercase();
                self.tools
                    .iter()
                    .filter(|t| t.service == normalized)
                    .collect()
            }
        }
    }

    /// Look up a single tool by its fully-qualified name.
    pub fn get_tool(&self, tool_name: &str) -> Result<&ToolDefinition, ToolSpecError> {
        self.by_name
            .get(tool_name)
            .map(|idx| &self.tools[*idx])
            .ok_or_else(|| ToolSpecError::UnknownTool(tool_name.to_string()))
    }

    /// Tools whose service is connected and whose `required_scopes` are a
    /// subset of the caller's granted scopes for that service (tools with
    /// no required scopes always pass).
    pub fn list_available_tools(
        &self,
        connected_services: &[String],
        granted_scopes: Option<&HashMap<String, HashSet<String>>>,
    ) -> Vec<&ToolDefinition> {
        let connected: HashSet<String> = connected_services
            .iter()
            .map(|s| s.trim().to_lowercase())
            .collect();
        self.tools
            .iter()
            .filter(|tool| {
                if !connected.contains(&tool.service) {
                    return false;
                }
                if tool.required_scopes.is_empty() {
                    return true;
                }
                match granted_scopes.and_then(|m| m.get(&tool.service)) {
                    None => true,
                    Some(granted) => tool.required_scopes.iter().all(|s| granted.contains(s)),
                }
            })
            .collect()
    }

    /// Project available tools into the `(name, description, input_schema)`
    /// shape an LLM function-calling request expects.
    pub fn list_llm_tools(
        &self,
        connected_services: &[String],
        granted_scopes: Option<&HashMap<String, HashSet<String>>>,
    ) -> Vec<LlmToolView> {
        self.list_available_tools(connected_services, granted_scopes)
            .into_iter()
            .map(LlmToolView::from)
            .collect()
    }
}

/// Projection of a [`ToolDefinition`] for LLM function-calling payloads.
#[derive(Debug, Clone, serde::Serialize)]
pub struct LlmToolView {
    /// Tool name, e.g. `notion_create_page`.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON-Schema input shape.
    pub input_schema: serde_json::Value,
}

impl From<&ToolDefinition> for LlmToolView {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            name: tool.tool_name.clone(),
            description: tool.description.clone(),
            input_schema: tool.input_schema.clone(),
        }
    }
}

static REGISTRY_CACHE: OnceLock<Mutex<Option<(PathBuf, Arc<ToolRegistry>)>>> = OnceLock::new();

fn cache() -> &'static Mutex<Option<(PathBuf, Arc<ToolRegistry>)>> {
    REGISTRY_CACHE.get_or_init(|| Mutex::new(None))
}

/// Load the registry from `dir`, memoizing by directory path. Subsequent
/// calls with the same path return the cached `Arc` without touching disk.
pub fn load_registry(dir: &Path) -> Result<Arc<ToolRegistry>, ToolSpecError> {
    let mut guard = cache().lock().expect("registry cache mutex poisoned");
    if let Some((cached_dir, registry)) = guard.as_ref() {
        if cached_dir == dir {
            return Ok(Arc::clone(registry));
        }
    }
    let registry = Arc::new(ToolRegistry::load_from_dir(dir)?);
    *guard = Some((dir.to_path_buf(), Arc::clone(&registry)));
    Ok(registry)
}

/// Clear the memoized registry so the next [`load_registry`] call re-reads
/// from disk.
pub fn reload_registry() {
    let mut guard = cache().lock().expect("registry cache mutex poisoned");
    *guard = None;
}
