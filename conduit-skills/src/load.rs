//! Disk loading and validation of skill contract files.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::contract::SkillContract;

/// Everything that can go wrong loading or validating skill contracts.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SkillContractError {
    /// The contracts directory itself could not be read.
    #[error("failed to read skill contracts directory {path}: {source}")]
    ReadDir {
        /// Directory that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A contract file could not be read.
    #[error("failed to read skill contract {path}: {source}")]
    ReadFile {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A contract file was not a valid JSON object.
    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        /// File containing the malformed JSON.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A contract failed one or more structural checks.
    #[error("{path}: {}", .errors.join("; "))]
    Invalid {
        /// File the contract was loaded from.
        path: PathBuf,
        /// Every validation failure found, not just the first.
        errors: Vec<String>,
    },

    /// A lookup by name found nothing.
    #[error("unknown skill: {0}")]
    UnknownSkill(String),

    /// Wraps any other error that doesn't fit the cases above.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

const REQUIRED_TOP_KEYS: &[&str] = &[
    "name",
    "version",
    "summary",
    "provider",
    "autofill",
    "input_schema",
    "output_schema",
    "examples",
    "runtime_tools",
];

/// Check `contract` against the structural rules a contract must satisfy,
/// returning every violation found (not just the first). `path`, when
/// given, also checks the file-name/service cross-check.
pub fn validate_contract(contract: &Value, path: Option<&Path>) -> Vec<String> {
    let mut errors = Vec::new();

    let mut missing: Vec<&str> = REQUIRED_TOP_KEYS
        .iter()
        .copied()
        .filter(|key| contract.get(key).is_none())
        .collect();
    missing.sort_unstable();
    if !missing.is_empty() {
        errors.push(format!("missing keys: {}", missing.join(", ")));
    }

    let name = contract.get("name").and_then(Value::as_str).unwrap_or("").trim();
    if name.is_empty() || !name.contains('.') {
        errors.push("name must include service prefix (e.g., notion.page_create)".to_string());
    }

    match contract.get("provider") {
        Some(Value::Object(provider)) => {
            let service = provider.get("service").and_then(Value::as_str).unwrap_or("").trim();
            if !service.is_empty() && !name.is_empty() {
                let name_prefix = name.split_once('.').map(|(p, _)| p).unwrap_or(name);
                if name_prefix != service {
                    errors.push("name/service prefix mismatch".to_string());
                }
            }
        }
        _ => errors.push("provider must be object".to_string()),
    }

    match contract.get("runtime_tools") {
        Some(Value::Array(items)) if !items.is_empty() => {
            if items.iter().any(|item| item.as_str().map(|s| s.trim().is_empty()).unwrap_or(true)) {
                errors.push("runtime_tools items must be non-empty strings".to_string());
            }
        }
        _ => errors.push("runtime_tools must be non-empty array".to_string()),
    }

    for schema_key in ["input_schema", "output_schema"] {
        match contract.get(schema_key) {
            Some(Value::Object(schema)) => {
                if schema.get("type").and_then(Value::as_str) != Some("object") {
                    errors.push(format!("{schema_key}.type must be 'object'"));
                }
            }
            _ => errors.push(format!("{schema_key} must be object")),
        }
    }

    match contract.get("examples") {
        Some(Value::Array(items)) if !items.is_empty() => {}
        _ => errors.push("examples must be non-empty array".to_string()),
    }

    if let Some(path) = path {
        let expected_prefix = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .replace('_', ".");
        let expected_service = expected_prefix.split_once('.').map(|(p, _)| p).unwrap_or(&expected_prefix);
        if !name.is_empty() && !expected_service.is_empty() && !name.starts_with(expected_service) {
            errors.push("file name/service mismatch".to_string());
        }
    }

    errors
}

/// Load every `*.json` contract under `dir`, in lexicographic file-name
/// order, validating each before it is exposed.
pub(crate) fn load_from_dir(dir: &Path) -> Result<Vec<SkillContract>, SkillContractError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| SkillContractError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect();
    entries.sort();

    let mut contracts = Vec::with_capacity(entries.len());
    for path in entries {
        contracts.push(load_one(&path)?);
    }
    Ok(contracts)
}

fn load_one(path: &Path) -> Result<SkillContract, SkillContractError> {
    let text = fs::read_to_string(path).map_err(|source| SkillContractError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: Value = serde_json::from_str(&text).map_err(|source| SkillContractError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })?;

    let errors = validate_contract(&raw, Some(path));
    if !errors.is_empty() {
        return Err(SkillContractError::Invalid {
            path: path.to_path_buf(),
            errors,
        });
    }

    serde_json::from_value(raw).map_err(|source| SkillContractError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}
