//! `format_linear_meeting_issue`: render a Linear issue drafting meeting
//! minutes from a calendar event.

use serde_json::{json, Value};

use crate::event::{attendee_emails_text, date_or_time_text, resolve_event, truncate_chars};

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 7800;
const MAX_SOURCE_DESCRIPTION_CHARS: usize = 3000;

/// Build a Linear-ready meeting-issue draft: a title and a Markdown
/// description, both length-capped, plus the source event id.
pub fn format_linear_meeting_issue(payload: &Value) -> Value {
    let event = resolve_event(payload);
    let title = if event.title.is_empty() { "제목 없음 회의".to_string() } else { event.title };
    let start_text = date_or_time_text(&event.start);
    let end_text = date_or_time_text(&event.end);
    let attendees_text = attendee_emails_text(&event.attendees);
    let description = if event.description.is_empty() { "-".to_string() } else { event.description };

    let lines = vec![
        "Google Calendar 회의에서 자동 생성된 이슈입니다.".to_string(),
        format!("- 회의명: {title}"),
        format!("- 시작: {start_text}"),
        format!("- 종료: {end_text}"),
        format!("- 참석자: {attendees_text}"),
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
        format!("원본 설명: {}", truncate_chars(&description, MAX_SOURCE_DESCRIPTION_CHARS)),
    ];

    let merged_description = truncate_chars(&lines.join("\n"), MAX_DESCRIPTION_CHARS);

    json!({
        "title": truncate_chars(&format!("[회의] {title}"), MAX_TITLE_CHARS),
        "description": merged_description,
        "source_event_id": event.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn title_is_bracketed_with_meeting_tag() {
        let payload = json!({"event": {"title": "온보딩 회의", "id": "e9"}});
        let result = format_linear_meeting_issue(&payload);
        assert_eq!(result["title"], "[회의] 온보딩 회의");
        assert_eq!(result["source_event_id"], "e9");
    }

    #[test]
    fn description_includes_attendee_line() {
        let payload = json!({
            "event": {
                "title": "기획 회의",
                "attendees": [{"email": "a@x.com"}, {"email": "b@x.com"}],
            },
        });
        let result = format_linear_meeting_issue(&payload);
        let description = result["description"].as_str().unwrap();
        assert!(description.contains("a@x.com, b@x.com"));
    }
}
