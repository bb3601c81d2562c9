//! Best-effort JSON object extraction from an LLM's free-form response.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn brace_span_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"))
}

/// Parse `text` as a whole JSON object; if that fails, fall back to the
/// first greedy `{...}` span. Returns `None` if neither yields a JSON
/// object (arrays, scalars, and unparsable text are all rejected).
pub fn extract_json_object(text: &str) -> Option<Value> {
    let candidate = text.trim();
    if candidate.is_empty() {
        return None;
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(candidate) {
        if parsed.is_object() {
            return Some(parsed);
        }
    }
    let span = brace_span_pattern().find(candidate)?;
    let parsed: Value = serde_json::from_str(span.as_str()).ok()?;
    if parsed.is_object() {
        Some(parsed)
    } else {
        None
    }
}
