//! Structured slot extractors over free-form bilingual user text.
//!
//! Every extractor returns `None` when the text is ambiguous rather than
//! guessing. A handful of the source patterns rely on a lookahead
//! assertion (`"...(?=delimiter|$)"`) to bound a non-greedy capture; the
//! `regex` crate has no lookaround, so those are reproduced as a label
//! match followed by a search for the first delimiter occurrence in the
//! remainder (equivalent to what the lookahead bounds).

use regex::Regex;

fn quoted_token(text: &str) -> Option<String> {
    let re = Regex::new(r#""([^"]+)"|'([^']+)'"#).expect("valid regex");
    for caps in re.captures_iter(text) {
        let candidate = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().trim());
        if let Some(candidate) = candidate {
            if !candidate.is_empty() {
                return Some(candidate.to_string());
            }
        }
    }
    None
}

/// Capture the text between `label_re`'s match and the first occurrence of
/// `delimiter_re` after it (or end of string, if `delimiter_re` never
/// matches). Equivalent to the source's `(.+?)(?=delimiter|$)` pattern.
fn capture_until_delimiter(text: &str, label_re: &Regex, delimiter_re: &Regex) -> Option<String> {
    let label_match = label_re.find(text)?;
    let remainder = &text[label_match.end()..];
    let end = delimiter_re.find(remainder).map(|m| m.start()).unwrap_or(remainder.len());
    let candidate = remainder[..end].trim();
    if candidate.is_empty() {
        None
    } else {
        Some(candidate.to_string())
    }
}

fn sanitize_title(candidate: Option<&str>, max_len: usize) -> Option<String> {
    let value = candidate?.trim_matches(|c: char| c.is_whitespace() || "\"'`".contains(c));
    if value.is_empty() {
        return None;
    }
    let lowered = value.to_lowercase();
    if matches!(value, "에" | "의" | "에서") || matches!(lowered.as_str(), "at" | "in" | "on") {
        return None;
    }
    if value.chars().count() < 2 {
        return None;
    }
    Some(value.chars().take(max_len).collect())
}

/// Extract a Linear issue reference: an `ABC-123`-style key first, else the
/// first quoted token.
pub fn extract_linear_issue_reference(text: &str) -> Option<String> {
    let re = Regex::new(r"\b([A-Za-z]{2,10}-\d{1,6})\b").expect("valid regex");
    if let Some(caps) = re.captures(text) {
        return Some(caps[1].to_string());
    }
    quoted_token(text)
}

/// Extract a bare Notion page title reference: a quoted token first, else
/// `"notion/노션 (에서|의) <title> 페이지"`.
pub fn extract_notion_page_title(text: &str) -> Option<String> {
    if let Some(quoted) = quoted_token(text) {
        return Some(quoted);
    }
    let re = Regex::new(r"(?i)(?:notion|노션)(?:에서|의)?\s*(.+?)\s*페이지").expect("valid regex");
    re.captures(text.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_matches(|c: char| c.is_whitespace() || "\"'`".contains(c)).to_string())
        .filter(|s| !s.is_empty())
}

fn normalize_whitespace(text: &str) -> String {
    text.trim().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract a Notion page title for a create action, bounded to 100 chars.
/// Tries, in order: a `제목:`/`title:`-labelled segment, a `페이지 제목:`
/// labelled segment, a quoted-before-페이지 phrasing, a prefix-before-
/// 페이지-생성 phrasing, then falls back to [`extract_notion_page_title`].
pub fn extract_notion_page_title_for_create(text: &str) -> Option<String> {
    let normalized = normalize_whitespace(text);

    let label_re = Regex::new(r#"(?i)(?:제목은|title is|제목|title)\s*[:：]?\s*['"“”]?"#).expect("valid regex");
    let delimiter_re = Regex::new(r"(?i)\s*(?:이고|이며|,|\.)?\s*(?:내용|본문|설명|description)\s*[:：]").expect("valid regex");
    if let Some(candidate) = capture_until_delimiter(&normalized, &label_re, &delimiter_re) {
        if let Some(sanitized) = sanitize_title(Some(&candidate), 100) {
            return Some(sanitized);
        }
    }

    let page_label_re = Regex::new(r#"(?i)(?:페이지\s*제목|page\s*title)\s*[:：]?\s*['"“”]?"#).expect("valid regex");
    if let Some(candidate) = capture_until_delimiter(&normalized, &page_label_re, &delimiter_re) {
        if let Some(sanitized) = sanitize_title(Some(&candidate), 100) {
            return Some(sanitized);
        }
    }

    for pattern in [
        r#"(?i)(?:notion|노션)(?:에서|에|의)?\s*["“]([^"”]+)["”]\s*페이지"#,
        r"(?i)(?:notion|노션)(?:에서|에|의)?\s*'([^']+)'\s*페이지",
        r#"(?i)["“]([^"”]+)["”]\s*(?:페이지)\s*(?:생성|만들|작성|create)"#,
    ] {
        let re = Regex::new(pattern).expect("valid regex");
        if let Some(caps) = re.captures(text.trim()) {
            if let Some(sanitized) = sanitize_title(caps.get(1).map(|m| m.as_str()), 100) {
                return Some(sanitized);
            }
        }
    }

    let prefix_re = Regex::new(
        r"(?i)^\s*(.+?)\s*(?:을|를)\s*(?:notion|노션)(?:에서|에|의)?.*(?:페이지).*(?:생성|만들|작성|create)",
    )
    .expect("valid regex");
    if let Some(caps) = prefix_re.captures(&normalized) {
        let raw = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let strip_noise = Regex::new(r"(?i)^(?:기사|문서|내용)\s*").expect("valid regex");
        let candidate = strip_noise.replace(raw, "").trim().to_string();
        if let Some(sanitized) = sanitize_title(Some(&candidate), 100) {
            return Some(sanitized);
        }
    }

    sanitize_title(extract_notion_page_title(text).as_deref(), 100)
}

/// Extract a new title for a Notion page update, bounded to 100 chars.
pub fn extract_notion_update_new_title(text: &str) -> Option<String> {
    let normalized = normalize_whitespace(text);
    let patterns = [
        r#"(?i)(?:페이지\s*)?(?:제목|title)(?:을|를)?\s*["“]?([^"”]+?)["”]?\s*(?:로|으로)?\s*(?:업데이트|수정|변경|바꿔|rename)"#,
        r#"(?i)(?:새\s*제목|new\s*title)\s*[:：]?\s*["“]?([^"”]+?)["”]?(?:\s|$)"#,
        r#"(?i)(?:제목|title)\s*[:：]\s*["“]?([^"”]+?)["”]?(?:\s|$)"#,
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).expect("valid regex");
        if let Some(caps) = re.captures(&normalized) {
            let candidate = caps.get(1).map(|m| m.as_str()).unwrap_or("").trim_matches(|c: char| c.is_whitespace() || "\"'`.,".contains(c));
            if !candidate.is_empty() {
                return Some(candidate.chars().take(100).collect());
            }
        }
    }
    None
}

/// Extract replacement body text for a Notion page update, bounded to
/// 1800 chars.
pub fn extract_notion_update_body_text(text: &str) -> Option<String> {
    let raw = normalize_whitespace(text);
    let patterns = [
        r"(?i)(?:본문\s*업데이트|본문\s*수정|content\s*update|내용\s*업데이트)\s*[:：]\s*(.+)$",
        r"(?i)(?:본문|내용)\s*[:：]\s*(.+)$",
        r#"(?i)(?:본문|내용)에\s*["“]?(.+?)["”]?\s*(?:추가|append|넣어|작성)"#,
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).expect("valid regex");
        if let Some(caps) = re.captures(&raw) {
            let candidate = caps.get(1).map(|m| m.as_str()).unwrap_or("").trim_matches(|c: char| c.is_whitespace() || "\"'`".contains(c));
            if !candidate.is_empty() {
                return Some(candidate.chars().take(1800).collect());
            }
        }
    }
    None
}

/// Extract a Linear team reference following `팀:`/`team:`.
pub fn extract_linear_team_reference(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)(?:팀|team)\s*[:：]?\s*([^\s,]+)").expect("valid regex");
    let caps = re.captures(text.trim())?;
    let candidate = caps.get(1)?.as_str().trim_matches(|c: char| c.is_whitespace() || "\"'`".contains(c));
    if candidate.is_empty() {
        None
    } else {
        Some(candidate.to_string())
    }
}

/// Extract an issue title for a Linear create action, bounded to 120 chars.
pub fn extract_linear_issue_title_for_create(text: &str) -> Option<String> {
    let normalized = normalize_whitespace(text);

    let label_re = Regex::new(r#"(?i)(?:제목은|title is|제목|title)\s*[:：]?\s*['"“”]?"#).expect("valid regex");
    let delimiter_re = Regex::new(
        r"(?i)\s+(?:설명|내용|description|본문|priority|우선순위|라벨|label|담당자|assignee)\s*[:：]",
    )
    .expect("valid regex");
    if let Some(candidate) = capture_until_delimiter(&normalized, &label_re, &delimiter_re) {
        let trimmed = candidate.trim_matches(|c: char| c.is_whitespace() || "\"'`.,".contains(c));
        if !trimmed.is_empty() {
            return Some(trimmed.chars().take(120).collect());
        }
    }

    if let Some(quoted) = quoted_token(text) {
        return Some(quoted);
    }

    let service_first_re = Regex::new(
        r"(?i)(?:linear|리니어)(?:에서|에|의)?\s*(.+?)\s*(?:이슈)\s*(?:생성|만들|작성|create)",
    )
    .expect("valid regex");
    if let Some(caps) = service_first_re.captures(&normalized) {
        let raw = caps.get(1).map(|m| m.as_str()).unwrap_or("").trim_matches(|c: char| c.is_whitespace() || "\"'`.,".contains(c));
        let strip_team = Regex::new(r"(?i)^(?:팀|team)\s*[:：]?\s*[^\s,]+\s*").expect("valid regex");
        let candidate = strip_team.replace(raw, "").trim().to_string();
        if !candidate.is_empty() {
            return Some(candidate.chars().take(120).collect());
        }
    }

    let fallback_re = Regex::new(r"(?i)(.+?)\s*(?:linear|리니어).*(?:이슈).*(?:생성|만들|작성|create)").expect("valid regex");
    if let Some(caps) = fallback_re.captures(text.trim()) {
        let raw = caps.get(1).map(|m| m.as_str()).unwrap_or("").trim_matches(|c: char| c.is_whitespace() || "\"'`".contains(c));
        let strip_prefix = Regex::new(r"(?i)^(?:linear|리니어)(?:의|에서)?\s*").expect("valid regex");
        let candidate = strip_prefix.replace(raw, "").trim().to_string();
        if !candidate.is_empty() {
            return Some(candidate.chars().take(120).collect());
        }
    }

    None
}

/// Extract a new title for a Linear issue update, bounded to 120 chars.
pub fn extract_linear_update_new_title(text: &str) -> Option<String> {
    let normalized = normalize_whitespace(text);
    let patterns = [
        r#"(?i)(?:이슈\s*)?(?:제목|title)(?:을|를)?\s*["“]?([^"”]+?)["”]?\s*(?:로|으로)?\s*(?:업데이트|수정|변경|바꿔|rename)"#,
        r#"(?i)(?:새\s*제목|new\s*title)\s*[:：]?\s*['"“”]?(.+?)['"“”]?(?:\s|$)"#,
        r#"(?i)(?:제목|title)\s*[:：]\s*['"“”]?(.+?)['"“”]?(?:\s|$)"#,
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).expect("valid regex");
        if let Some(caps) = re.captures(&normalized) {
            let candidate = caps.get(1).map(|m| m.as_str()).unwrap_or("").trim_matches(|c: char| c.is_whitespace() || "\"'`.,".contains(c));
            if !candidate.is_empty() {
                return Some(candidate.chars().take(120).collect());
            }
        }
    }
    None
}

/// Extract new description text for a Linear issue update, bounded to
/// 5000 chars.
pub fn extract_linear_update_description_text(text: &str) -> Option<String> {
    let raw = normalize_whitespace(text);
    let patterns = [
        r"(?i)(?:설명|description|내용|본문)\s*(?:업데이트|수정|변경)?\s*[:：]\s*(.+)$",
        r#"(?i)(?:설명|description|내용|본문)에\s*["“]?(.+?)["”]?\s*(?:추가|append|넣어|작성|반영)"#,
        r"(?i)(?:설명|description|내용|본문)(?:을|를)?\s*(.+?)\s*(?:으로|로)\s*(?:업데이트|수정|변경|바꿔|바꿔줘|수정해줘|업데이트해줘|수정하세요|변경해줘)",
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).expect("valid regex");
        if let Some(caps) = re.captures(&raw) {
            let candidate = caps.get(1).map(|m| m.as_str()).unwrap_or("").trim_matches(|c: char| c.is_whitespace() || "\"'`".contains(c));
            if !candidate.is_empty() {
                return Some(candidate.chars().take(5000).collect());
            }
        }
    }
    None
}

/// Extract a Linear workflow state id following `state_id:`/`상태id:`.
pub fn extract_linear_update_state_id(text: &str) -> Option<String> {
    let normalized = normalize_whitespace(text);
    let re = Regex::new(r"(?i)(?:state_id|state id|상태id|상태_id)\s*[:：]\s*([^\s,]+)").expect("valid regex");
    let caps = re.captures(&normalized)?;
    let candidate = caps.get(1)?.as_str().trim_matches(|c: char| c.is_whitespace() || "\"'`.,".contains(c));
    if candidate.is_empty() {
        None
    } else {
        Some(candidate.to_string())
    }
}

/// Extract a priority (0-4) following `priority:`/`우선순위:`.
pub fn extract_linear_update_priority(text: &str) -> Option<u8> {
    let normalized = normalize_whitespace(text);
    let re = Regex::new(r"(?i)(?:priority|우선순위)\s*[:：]\s*([0-4])").expect("valid regex");
    re.captures(&normalized)?.get(1)?.as_str().parse().ok()
}

/// Extract a bounded count/limit, defaulting to `default` and clamped to
/// `[minimum, maximum]`.
pub fn extract_count_limit(text: &str, default: u32, minimum: u32, maximum: u32) -> u32 {
    let count_re = Regex::new(r"(?i)(\d{1,3})\s*(?:개|건|items?)").expect("valid regex");
    let value = count_re
        .captures(text)
        .or_else(|| Regex::new(r"(?i)\bfirst\s*[:=]?\s*(\d{1,3})\b").expect("valid regex").captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());
    match value {
        None => default,
        Some(value) => value.clamp(minimum, maximum),
    }
}
