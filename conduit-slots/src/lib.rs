//! # conduit-slots
//!
//! Action slot schemas for the slot-collection state machine: required and
//! optional slots per action, alias resolution (Korean/English synonyms
//! onto canonical names), and validation rules.

#![deny(missing_docs)]

mod normalize;
mod rule;
mod schema;

pub use normalize::{normalize_slots, validate_slots};
pub use rule::{validate_single_slot, RuleKind, ValidationRule};
pub use schema::{builtin_schemas, ActionSlotSchema};

use std::collections::HashMap;
use std::sync::OnceLock;

static SCHEMAS: OnceLock<HashMap<String, ActionSlotSchema>> = OnceLock::new();

fn schemas() -> &'static HashMap<String, ActionSlotSchema> {
    SCHEMAS.get_or_init(builtin_schemas)
}

/// Look up the built-in schema for `action`, if one exists.
pub fn get_action_slot_schema(action: &str) -> Option<&'static ActionSlotSchema> {
    schemas().get(action.trim())
}

/// List every built-in action slot schema.
pub fn list_action_slot_schemas() -> Vec<&'static ActionSlotSchema> {
    schemas().values().collect()
}
