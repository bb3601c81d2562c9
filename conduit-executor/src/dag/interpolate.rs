//! Reference interpolation (§4.13.2): replaces `$node_id.path` (and,
//! inside `for_each` children, `$item.path`) strings found anywhere
//! inside a node's `input` with the referenced value.

use std::collections::HashMap;

use serde_json::{Map, Value};

use conduit_core::refpath::{get_path, is_reference, parse_reference};

/// A reference inside a node's `input` did not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// The binding name the reference pointed at (`node_id` or `item`).
    pub root: String,
    /// The dotted path under that binding.
    pub path: String,
}

/// Walk `input`, replacing every reference string with the value it
/// points to in `bindings`. Non-reference strings, numbers, and other
/// scalars pass through unchanged; objects and arrays are interpolated
/// recursively.
pub fn interpolate(input: &Value, bindings: &HashMap<String, Value>) -> Result<Value, UnresolvedReference> {
    match input {
        Value::String(text) if is_reference(text) => {
            let reference = parse_reference(text).expect("is_reference implies parse_reference succeeds");
            let root_value = bindings.get(&reference.root).ok_or_else(|| UnresolvedReference {
                root: reference.root.clone(),
                path: reference.path.clone(),
            })?;
            get_path(root_value, &reference.path).cloned().ok_or(UnresolvedReference {
                root: reference.root,
                path: reference.path,
            })
        }
        Value::Array(items) => {
            let resolved: Result<Vec<Value>, UnresolvedReference> = items.iter().map(|item| interpolate(item, bindings)).collect();
            resolved.map(Value::Array)
        }
        Value::Object(fields) => {
            let mut resolved = Map::with_capacity(fields.len());
            for (key, value) in fields {
                resolved.insert(key.clone(), interpolate(value, bindings)?);
            }
            Ok(Value::Object(resolved))
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replaces_a_reference_string_with_its_target() {
        let mut bindings = HashMap::new();
        bindings.insert("n1".to_string(), json!({"data": {"id": "page-1"}}));
        let input = json!({"page_id": "$n1.data.id", "archived": true});
        let resolved = interpolate(&input, &bindings).unwrap();
        assert_eq!(resolved, json!({"page_id": "page-1", "archived": true}));
    }

    #[test]
    fn resolves_item_bindings_inside_for_each_children() {
        let mut bindings = HashMap::new();
        bindings.insert("item".to_string(), json!({"event_id": "evt-1"}));
        let input = json!({"id": "$item.event_id"});
        assert_eq!(interpolate(&input, &bindings).unwrap(), json!({"id": "evt-1"}));
    }

    #[test]
    fn missing_binding_is_an_unresolved_reference() {
        let bindings = HashMap::new();
        let err = interpolate(&json!("$n1.data.id"), &bindings).unwrap_err();
        assert_eq!(err, UnresolvedReference { root: "n1".to_string(), path: "data.id".to_string() });
    }

    #[test]
    fn missing_path_inside_an_existing_binding_is_unresolved() {
        let mut bindings = HashMap::new();
        bindings.insert("n1".to_string(), json!({"data": {}}));
        let err = interpolate(&json!("$n1.data.id"), &bindings).unwrap_err();
        assert_eq!(err.path, "data.id");
    }

    #[test]
    fn literal_strings_pass_through_unchanged() {
        let bindings = HashMap::new();
        assert_eq!(interpolate(&json!("plain text"), &bindings).unwrap(), json!("plain text"));
    }
}
