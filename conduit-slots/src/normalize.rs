//! Alias normalization and full slot validation.

use std::collections::HashMap;

use serde_json::Value;

use crate::rule::validate_single_slot;
use crate::schema::ActionSlotSchema;

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

/// Resolve every key in `collected` to its canonical slot name via the
/// schema's alias table, leaving unrecognized keys untouched.
///
/// An explicit canonical key always wins over an alias that would map onto
/// the same slot: once `normalized` holds a value for a canonical name, a
/// later alias for that same slot is dropped rather than overwriting it.
/// Applying this twice is idempotent, since every key it produces is
/// already canonical (either a known slot name or passed through as-is)
/// and feeding a canonical-only map back through alias resolution is a
/// no-op.
pub fn normalize_slots(schema: Option<&ActionSlotSchema>, collected: &HashMap<String, Value>) -> HashMap<String, Value> {
    let Some(schema) = schema else {
        return collected.clone();
    };

    let mut alias_to_slot: HashMap<String, String> = HashMap::new();
    for (slot_name, names) in &schema.aliases {
        for alias in names {
            alias_to_slot.insert(alias.trim().to_lowercase(), slot_name.clone());
        }
    }

    let mut normalized = HashMap::new();
    for (key, value) in collected {
        let raw_key = key.trim();
        let canonical = alias_to_slot
            .get(&raw_key.to_lowercase())
            .cloned()
            .unwrap_or_else(|| raw_key.to_string());
        if normalized.contains_key(&canonical) && raw_key != canonical {
            continue;
        }
        normalized.insert(canonical, value.clone());
    }
    normalized
}

/// Normalize `collected`, then check required-slot presence and per-slot
/// validation rules.
///
/// Returns `(normalized, missing_required_slots, validation_errors)`.
/// `validation_errors` entries are `{slot_name}:{reason}` codes (see
/// [`validate_single_slot`](crate::rule::validate_single_slot)). Missing
/// optional slots are never validated or reported.
pub fn validate_slots(
    schema: Option<&ActionSlotSchema>,
    collected: &HashMap<String, Value>,
) -> (HashMap<String, Value>, Vec<String>, Vec<String>) {
    let normalized = normalize_slots(schema, collected);
    let Some(schema) = schema else {
        return (normalized, Vec::new(), Vec::new());
    };

    let missing: Vec<String> = schema
        .required_slots
        .iter()
        .filter(|name| is_missing(normalized.get(name.as_str())))
        .cloned()
        .collect();

    let mut errors = Vec::new();
    for (slot_name, rule) in &schema.validation_rules {
        let Some(value) = normalized.get(slot_name) else {
            continue;
        };
        if is_missing(Some(value)) {
            continue;
        }
        if let Some(error) = validate_single_slot(slot_name, value, rule) {
            errors.push(error);
        }
    }
    errors.sort();

    (normalized, missing, errors)
}
