//! `filter_meeting_events`: keep only events that look like meetings.

use serde_json::{json, Map, Value};

use crate::event::normalize_event;

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn is_meeting_event(title: &str, description: &str, include: &[String], exclude: &[String]) -> bool {
    let merged = format!("{} {}", title.to_lowercase(), description.to_lowercase());
    let merged = merged.trim();
    if !include.is_empty() {
        let include_ok = include.iter().any(|token| merged.contains(&token.to_lowercase()));
        if !include_ok {
            return false;
        }
    }
    if exclude.iter().any(|token| merged.contains(&token.to_lowercase())) {
        return false;
    }
    true
}

/// Filter `payload.events` down to ones whose title/description match
/// `keyword_include` (default `["회의", "meeting"]` when empty) and none
/// of `keyword_exclude`.
pub fn filter_meeting_events(payload: &Value) -> Value {
    let events = payload.get("events").and_then(Value::as_array).cloned().unwrap_or_default();
    let mut include = string_list(payload.get("keyword_include"));
    let exclude = string_list(payload.get("keyword_exclude"));
    if include.is_empty() {
        include = vec!["회의".to_string(), "meeting".to_string()];
    }

    let normalized: Vec<(Map<String, Value>, String, String)> = events
        .iter()
        .filter_map(Value::as_object)
        .map(|event| {
            let normalized = normalize_event(event);
            let entry = json!({
                "id": normalized.id,
                "title": normalized.title,
                "description": normalized.description,
                "start": normalized.start,
                "end": normalized.end,
                "attendees": normalized.attendees,
            });
            (entry.as_object().cloned().unwrap_or_default(), normalized.title.clone(), normalized.description.clone())
        })
        .collect();

    let source_count = normalized.len();
    let meeting_events: Vec<Value> = normalized
        .into_iter()
        .filter(|(_, title, description)| is_meeting_event(title, description, &include, &exclude))
        .map(|(entry, _, _)| Value::Object(entry))
        .collect();

    json!({
        "meeting_events": meeting_events.clone(),
        "meeting_count": meeting_events.len(),
        "source_count": source_count,
    })
}
