//! Shared calendar-event shape the minutes/issue formatters normalize
//! their input through.

use serde_json::{Map, Value};

/// A calendar event reduced to the fields the formatters need.
pub struct NormalizedEvent {
    /// Event id, or empty string when absent.
    pub id: String,
    /// Title, falling back to `summary` when `title` is absent.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Raw `start` object (`dateTime`/`date` keys), or an empty object.
    pub start: Map<String, Value>,
    /// Raw `end` object.
    pub end: Map<String, Value>,
    /// Raw attendee objects, each expected to carry an `email` field.
    pub attendees: Vec<Value>,
}

fn as_object(value: Option<&Value>) -> Map<String, Value> {
    value.and_then(Value::as_object).cloned().unwrap_or_default()
}

fn as_array(value: Option<&Value>) -> Vec<Value> {
    value.and_then(Value::as_array).cloned().unwrap_or_default()
}

fn string_field(object: &Map<String, Value>, key: &str) -> String {
    object.get(key).and_then(Value::as_str).unwrap_or("").trim().to_string()
}

/// Reduce a raw calendar-event JSON object to a [`NormalizedEvent`],
/// preferring `title` over `summary`.
pub fn normalize_event(event: &Map<String, Value>) -> NormalizedEvent {
    let title = {
        let title = string_field(event, "title");
        if title.is_empty() {
            string_field(event, "summary")
        } else {
            title
        }
    };
    NormalizedEvent {
        id: string_field(event, "id"),
        title,
        description: string_field(event, "description"),
        start: as_object(event.get("start")),
        end: as_object(event.get("end")),
        attendees: as_array(event.get("attendees")),
    }
}

/// `dateTime` if present, else `date`, else `"-"`.
pub fn date_or_time_text(object: &Map<String, Value>) -> String {
    let text = string_field(object, "dateTime");
    if !text.is_empty() {
        return text;
    }
    let text = string_field(object, "date");
    if text.is_empty() {
        "-".to_string()
    } else {
        text
    }
}

/// Comma-joined attendee emails, or `"-"` when there are none.
pub fn attendee_emails_text(attendees: &[Value]) -> String {
    let emails: Vec<String> = attendees
        .iter()
        .filter_map(|item| item.as_object())
        .map(|item| string_field(item, "email"))
        .filter(|email| !email.is_empty())
        .collect();
    if emails.is_empty() {
        "-".to_string()
    } else {
        emails.join(", ")
    }
}

/// Resolve the event a formatter should work on: `payload.event` when
/// it's a non-empty object, else `payload` itself treated as the event.
pub fn resolve_event(payload: &Value) -> NormalizedEvent {
    match payload.get("event").and_then(Value::as_object) {
        Some(event) if !event.is_empty() => normalize_event(event),
        _ => normalize_event(&as_object(Some(payload))),
    }
}

/// Truncate `text` to at most `max_chars` Unicode scalar values, matching
/// Python's `text[:n]` character-count slicing rather than a byte count.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
