//! Disk loading and validation of tool spec files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::definition::{IdempotencyKeyPolicy, ToolDefinition};
use crate::ToolRegistry;

/// Everything that can go wrong loading or looking up tools.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ToolSpecError {
    /// The specs directory itself could not be read.
    #[error("failed to read tool specs directory {path}: {source}")]
    ReadDir {
        /// Directory that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A spec file could not be read.
    #[error("failed to read tool spec {path}: {source}")]
    ReadFile {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A spec file was not valid JSON.
    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        /// File containing the malformed JSON.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A required field was missing or had the wrong shape.
    #[error("{path}: '{field}' {detail}")]
    InvalidField {
        /// File the bad field was found in.
        path: PathBuf,
        /// Dotted field path, e.g. `tools[2].input_schema`.
        field: String,
        /// What was wrong with it.
        detail: String,
    },

    /// A lookup by name found nothing.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Wraps any other error that doesn't fit the cases above.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ToolSpecError {
    fn invalid_field(path: &Path, field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidField {
            path: path.to_path_buf(),
            field: field.into(),
            detail: detail.into(),
        }
    }
}

fn require_str<'a>(
    spec: &'a Value,
    key: &str,
    path: &Path,
) -> Result<&'a str, ToolSpecError> {
    match spec.get(key).and_then(Value::as_str) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ToolSpecError::invalid_field(
            path,
            key,
            "must be a non-empty string",
        )),
    }
}

fn require_str_array(spec: &Value, key: &str, path: &Path) -> Result<Vec<String>, ToolSpecError> {
    match spec.get(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ToolSpecError::invalid_field(path, key, "must be an array of strings"))
            })
            .collect(),
        Some(_) => Err(ToolSpecError::invalid_field(path, key, "must be an array")),
    }
}

/// Load every `*.json` spec under `dir`, excluding `schema.json`, in
/// lexicographic file-name order so the resulting tool order is stable.
pub(crate) fn load_from_dir(dir: &Path) -> Result<ToolRegistry, ToolSpecError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| ToolSpecError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .filter(|path| path.file_name().and_then(|n| n.to_str()) != Some("schema.json"))
        .collect();
    entries.sort();

    let mut tools = Vec::new();
    for path in entries {
        tools.extend(load_spec_file(&path)?);
    }
    Ok(ToolRegistry::from_tools(tools))
}

fn load_spec_file(path: &Path) -> Result<Vec<ToolDefinition>, ToolSpecError> {
    let text = fs::read_to_string(path).map_err(|source| ToolSpecError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let spec: Value = serde_json::from_str(&text).map_err(|source| ToolSpecError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })?;

    let service = require_str(&spec, "service", path)?.trim().to_lowercase();
    require_str(&spec, "version", path)?;
    let base_url = require_str(&spec, "base_url", path)?.trim().to_string();

    let auth = spec
        .get("auth")
        .ok_or_else(|| ToolSpecError::invalid_field(path, "auth", "must be an object"))?;
    if !auth.is_object() {
        return Err(ToolSpecError::invalid_field(path, "auth", "must be an object"));
    }
    require_str_array(auth, "required_scopes", path)?;

    let tools_value = spec
        .get("tools")
        .and_then(Value::as_array)
        .filter(|arr| !arr.is_empty())
        .ok_or_else(|| ToolSpecError::invalid_field(path, "tools", "must be a non-empty array"))?;

    let mut tools = Vec::with_capacity(tools_value.len());
    for (idx, item) in tools_value.iter().enumerate() {
        let field_prefix = format!("tools[{idx}]");
        if !item.is_object() {
            return Err(ToolSpecError::invalid_field(
                path,
                field_prefix,
                "must be an object",
            ));
        }
        let tool_name = require_str(item, "tool_name", path)?.trim().to_string();
        let description = require_str(item, "description", path)?.trim().to_string();
        let http_method = require_str(item, "method", path)?.trim().to_uppercase();
        let path_template = require_str(item, "path", path)?.trim().to_string();
        let adapter_function = require_str(item, "adapter_function", path)?.trim().to_string();
        let input_schema = item
            .get("input_schema")
            .filter(|v| v.is_object())
            .cloned()
            .ok_or_else(|| {
                ToolSpecError::invalid_field(
                    path,
                    format!("{field_prefix}.input_schema"),
                    "must be an object",
                )
            })?;
        let required_scopes = require_str_array(item, "required_scopes", path)?;
        let idempotency_key_policy = match item.get("idempotency_key_policy").and_then(Value::as_str) {
            None | Some("none") => IdempotencyKeyPolicy::None,
            Some("event_id") => IdempotencyKeyPolicy::EventId,
            Some("hash") => IdempotencyKeyPolicy::Hash,
            Some(other) => {
                return Err(ToolSpecError::invalid_field(
                    path,
                    format!("{field_prefix}.idempotency_key_policy"),
                    format!("unknown policy '{other}'"),
                ))
            }
        };
        let error_map: HashMap<String, String> = match item.get("error_map") {
            None => HashMap::new(),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| {
                    v.as_str()
                        .map(|s| (k.clone(), s.to_string()))
                        .ok_or_else(|| {
                            ToolSpecError::invalid_field(
                                path,
                                format!("{field_prefix}.error_map"),
                                "values must be strings",
                            )
                        })
                })
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(ToolSpecError::invalid_field(
                    path,
                    format!("{field_prefix}.error_map"),
                    "must be an object",
                ))
            }
        };

        if !tool_name.starts_with(&format!("{service}_")) {
            return Err(ToolSpecError::invalid_field(
                path,
                format!("{field_prefix}.tool_name"),
                format!("must start with '{service}_'"),
            ));
        }

        tools.push(ToolDefinition {
            service: service.clone(),
            tool_name,
            description,
            http_method,
            path_template,
            base_url: base_url.clone(),
            adapter_function,
            input_schema,
            required_scopes,
            idempotency_key_policy,
            error_map,
        });
    }

    Ok(tools)
}
