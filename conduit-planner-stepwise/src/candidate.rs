//! Deciding whether a request is a good fit for the stepwise pipeline.

use conduit_intent::{is_create_intent, is_read_intent, is_update_intent};

fn service_aliases(service: &str) -> Option<&'static [&'static str]> {
    match service {
        "google" => Some(&["google", "calendar", "캘린더", "구글캘린더", "일정", "회의"]),
        "notion" => Some(&["notion", "노션", "페이지", "문서", "회의록"]),
        "linear" => Some(&["linear", "리니어", "이슈", "issue"]),
        _ => None,
    }
}

/// Whether `user_text` both carries a create/read/update intent and names
/// a keyword of one of `connected_services`' alias families.
pub fn is_stepwise_candidate(user_text: &str, connected_services: &[String]) -> bool {
    if !(is_create_intent(user_text) || is_read_intent(user_text) || is_update_intent(user_text)) {
        return false;
    }
    let lowered = user_text.to_lowercase();
    for service in connected_services {
        let key = service.trim().to_lowercase();
        let Some(aliases) = service_aliases(&key) else {
            continue;
        };
        if aliases.iter().any(|token| user_text.contains(token) || lowered.contains(token)) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_both_intent_and_service_keyword() {
        let connected = vec!["notion".to_string()];
        assert!(is_stepwise_candidate("노션 페이지 생성해줘", &connected));
        assert!(!is_stepwise_candidate("오늘 날씨 어때", &connected));
    }

    #[test]
    fn unconnected_service_keyword_does_not_count() {
        let connected = vec!["linear".to_string()];
        assert!(!is_stepwise_candidate("노션 페이지 생성해줘", &connected));
    }
}
