//! Path resolution over a typed [`serde_json::Value`], used by the DAG
//! executor to interpolate `$node_id.field.path` and `$item.field.path`
//! references in node inputs.

use serde_json::Value;

/// Look up a dotted path (`"a.b.c"`) inside a JSON value.
///
/// Object keys and array indices (decimal) are both accepted as path
/// segments, so `"items.0.id"` walks into the first array element. Returns
/// `None` the moment a segment can't be resolved — callers map that to
/// `DSL_REF_NOT_FOUND` together with the node id and path that produced it.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    if path.is_empty() {
        return Some(current);
    }
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// A single `$node_id.path` or `$item.path` reference found in a node's
/// `input`. `root` is the part before the first `.`; `path` is everything
/// after (possibly empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The referenced binding: a node id, or the literal `item`.
    pub root: String,
    /// The dotted path inside that binding's value. Empty means "the whole value".
    pub path: String,
}

/// Parse a string of the form `$root` or `$root.path.to.field` into a
/// [`Reference`]. Returns `None` if `text` does not start with `$` or the
/// root segment is empty.
pub fn parse_reference(text: &str) -> Option<Reference> {
    let rest = text.strip_prefix('$')?;
    if rest.is_empty() {
        return None;
    }
    match rest.split_once('.') {
        Some((root, path)) if !root.is_empty() => Some(Reference {
            root: root.to_string(),
            path: path.to_string(),
        }),
        Some(_) => None,
        None => Some(Reference {
            root: rest.to_string(),
            path: String::new(),
        }),
    }
}

/// Whether `text` looks like a reference at all (starts with `$` and has a
/// non-empty root). Used to distinguish literal strings from references
/// before attempting full resolution.
pub fn is_reference(text: &str) -> bool {
    parse_reference(text).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_path_walks_objects_and_arrays() {
        let value = json!({"a": {"b": [1, 2, {"c": "deep"}]}});
        assert_eq!(get_path(&value, "a.b.2.c"), Some(&json!("deep")));
        assert_eq!(get_path(&value, "a.b.0"), Some(&json!(1)));
        assert_eq!(get_path(&value, ""), Some(&value));
    }

    #[test]
    fn get_path_missing_segment_is_none() {
        let value = json!({"a": 1});
        assert_eq!(get_path(&value, "a.b"), None);
        assert_eq!(get_path(&value, "missing"), None);
    }

    #[test]
    fn parse_reference_splits_root_and_path() {
        assert_eq!(
            parse_reference("$n1.data.id"),
            Some(Reference {
                root: "n1".to_string(),
                path: "data.id".to_string(),
            })
        );
        assert_eq!(
            parse_reference("$item"),
            Some(Reference {
                root: "item".to_string(),
                path: String::new(),
            })
        );
        assert_eq!(parse_reference("not_a_ref"), None);
        assert_eq!(parse_reference("$"), None);
    }

    #[test]
    fn is_reference_detects_dollar_prefix() {
        assert!(is_reference("$n1.data"));
        assert!(!is_reference("literal"));
    }
}
