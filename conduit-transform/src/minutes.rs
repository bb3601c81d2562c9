//! `format_detailed_minutes`: render a Notion page body drafting meeting
//! minutes from a calendar event.

use serde_json::{json, Value};

use crate::event::{attendee_emails_text, date_or_time_text, resolve_event, truncate_chars};

const MAX_BLOCKS: usize = 80;
const MAX_BLOCK_CHARS: usize = 1800;
const MAX_TITLE_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 1200;

fn paragraph_block(line: &str) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": {
            "rich_text": [{
                "type": "text",
                "text": {"content": truncate_chars(line, MAX_BLOCK_CHARS)},
            }],
        },
    })
}

/// Build a Notion-ready meeting-minutes draft: a title, up to
/// [`MAX_BLOCKS`] paragraph blocks, and the source event id.
pub fn format_detailed_minutes(payload: &Value) -> Value {
    let event = resolve_event(payload);
    let title = if event.title.is_empty() { "제목 없음 회의".to_string() } else { event.title };
    let start_text = date_or_time_text(&event.start);
    let end_text = date_or_time_text(&event.end);
    let attendees_text = attendee_emails_text(&event.attendees);
    let description = if event.description.is_empty() { "-".to_string() } else { event.description };

    let lines = vec![
        format!("회의명: {title}"),
        format!("시작: {start_text}"),
        format!("종료: {end_text}"),
        format!("참석자: {attendees_text}"),
        String::new(),
        "회의 목적:".to_string(),
        "- ".to_string(),
        "논의 내용:".to_string(),
        "- ".to_string(),
        "결정 사항:".to_string(),
        "- ".to_string(),
        "액션 아이템:".to_string(),
        "- [ ] ".to_string(),
        String::new(),
        format!("원본 설명: {}", truncate_chars(&description, MAX_DESCRIPTION_CHARS)),
    ];

    let children: Vec<Value> = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .take(MAX_BLOCKS)
        .map(|line| paragraph_block(line))
        .collect();

    json!({
        "title": truncate_chars(&format!("회의록 초안 - {title}"), MAX_TITLE_CHARS),
        "children": children,
        "source_event_id": event.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_title_with_fallback_when_event_title_missing() {
        let payload = json!({"event": {"id": "e1"}});
        let result = format_detailed_minutes(&payload);
        assert_eq!(result["title"], "회의록 초안 - 제목 없음 회의");
        assert_eq!(result["source_event_id"], "e1");
    }

    #[test]
    fn blank_lines_are_not_emitted_as_blocks() {
        let payload = json!({"event": {"title": "주간 회의"}});
        let result = format_detailed_minutes(&payload);
        let children = result["children"].as_array().unwrap();
        assert!(children.iter().all(|block| {
            block["paragraph"]["rich_text"][0]["text"]["content"].as_str().unwrap() != ""
        }));
    }

    #[test]
    fn accepts_payload_without_nested_event_key() {
        let payload = json!({"title": "플랫 이벤트"});
        let result = format_detailed_minutes(&payload);
        assert_eq!(result["title"], "회의록 초안 - 플랫 이벤트");
    }
}
