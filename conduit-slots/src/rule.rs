//! Per-slot validation rules and the single-value validator.

use serde_json::Value;

/// The shape a slot value must have, beyond the generic enum constraint.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// A string, optionally length-bounded and/or pattern-matched.
    String {
        /// Minimum length in characters, inclusive.
        min_length: Option<usize>,
        /// Maximum length in characters, inclusive.
        max_length: Option<usize>,
        /// A regex the value's full extent must match.
        pattern: Option<String>,
    },
    /// An integer, optionally range-bounded.
    Integer {
        /// Minimum value, inclusive.
        min: Option<i64>,
        /// Maximum value, inclusive.
        max: Option<i64>,
    },
    /// A boolean.
    Boolean,
}

/// A validation rule for one slot: a required shape plus an optional set
/// of allowed values.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    /// The required shape.
    pub kind: RuleKind,
    /// When present, the value must equal one of these.
    pub enum_values: Option<Vec<Value>>,
}

impl ValidationRule {
    /// A bounded string rule with no pattern.
    pub fn string(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Self {
            kind: RuleKind::String {
                min_length,
                max_length,
                pattern: None,
            },
            enum_values: None,
        }
    }

    /// A pattern-matched string rule.
    pub fn pattern(pattern: &str) -> Self {
        Self {
            kind: RuleKind::String {
                min_length: None,
                max_length: None,
                pattern: Some(pattern.to_string()),
            },
            enum_values: None,
        }
    }

    /// A bounded string rule with an enum constraint.
    pub fn string_enum(values: &[&str]) -> Self {
        Self {
            kind: RuleKind::String {
                min_length: None,
                max_length: None,
                pattern: None,
            },
            enum_values: Some(values.iter().map(|v| Value::String(v.to_string())).collect()),
        }
    }

    /// A range-bounded integer rule.
    pub fn integer(min: Option<i64>, max: Option<i64>) -> Self {
        Self {
            kind: RuleKind::Integer { min, max },
            enum_values: None,
        }
    }

    /// An integer rule with an enum constraint.
    pub fn integer_enum(values: &[i64]) -> Self {
        Self {
            kind: RuleKind::Integer { min: None, max: None },
            enum_values: Some(values.iter().map(|v| Value::from(*v)).collect()),
        }
    }

    /// A boolean rule.
    pub fn boolean() -> Self {
        Self {
            kind: RuleKind::Boolean,
            enum_values: None,
        }
    }
}

/// Validate one slot's value against `rule`, returning an error code of the
/// form `{slot_name}:{reason}` on failure.
///
/// Callers skip this entirely for missing values; a missing value is only
/// an error when the slot is required (see `validate_slots`).
pub fn validate_single_slot(slot_name: &str, value: &Value, rule: &ValidationRule) -> Option<String> {
    match &rule.kind {
        RuleKind::String {
            min_length,
            max_length,
            pattern,
        } => {
            let Some(text) = value.as_str() else {
                return Some(format!("{slot_name}:type:string"));
            };
            let len = text.chars().count();
            if let Some(min_length) = min_length {
                if len < *min_length {
                    return Some(format!("{slot_name}:min_length:{min_length}"));
                }
            }
            if let Some(max_length) = max_length {
                if len > *max_length {
                    return Some(format!("{slot_name}:max_length:{max_length}"));
                }
            }
            if let Some(pattern) = pattern {
                let compiled = regex::Regex::new(pattern).expect("built-in patterns are valid regex");
                if !compiled.is_match(text) {
                    return Some(format!("{slot_name}:pattern"));
                }
            }
        }
        RuleKind::Integer { min, max } => {
            let Some(number) = value.as_i64() else {
                return Some(format!("{slot_name}:type:integer"));
            };
            if let Some(min) = min {
                if number < *min {
                    return Some(format!("{slot_name}:min:{min}"));
                }
            }
            if let Some(max) = max {
                if number > *max {
                    return Some(format!("{slot_name}:max:{max}"));
                }
            }
        }
        RuleKind::Boolean => {
            if !value.is_boolean() {
                return Some(format!("{slot_name}:type:boolean"));
            }
        }
    }

    if let Some(enum_values) = &rule.enum_values {
        if !enum_values.contains(value) {
            return Some(format!("{slot_name}:enum"));
        }
    }

    None
}
