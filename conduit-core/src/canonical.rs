//! Stable, order-independent hashing of JSON payloads.
//!
//! Used by the runtime catalog cache (identical payload → identical
//! `catalog_id` regardless of key order, §4.7 / property 5) and by the
//! executor's `hash` idempotency-key policy (§4.13.4).

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Serialize `value` with object keys sorted recursively and no
/// insignificant whitespace, then return the lowercase hex SHA-256 digest.
pub fn sha256_hex(value: &Value) -> String {
    let canonical = canonicalize(value);
    let encoded = serde_json::to_string(&canonical).expect("canonicalized value always serializes");
    let mut hasher = Sha256::new();
    hasher.update(encoded.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Recursively sort object keys so two semantically-identical payloads with
/// differently-ordered keys hash the same. `serde_json::Map` already
/// preserves insertion order; this rebuilds it sorted.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = serde_json::Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
