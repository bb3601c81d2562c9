//! Bilingual (Korean/English) keyword tables and substring-based intent checks.

/// Keywords signalling the user wants something created.
pub const CREATE_KEYWORDS: &[&str] = &[
    "생성", "만들", "작성", "작성해", "작성해줘", "등록", "등록해", "등록해줘", "발행", "올려", "올려줘", "기입", "저장",
    "create", "save",
];

/// Keywords signalling the user wants to read/look something up.
pub const READ_KEYWORDS: &[&str] = &[
    "조회", "검색", "찾", "목록", "보여", "불러", "가져와", "가져와줘", "확인", "읽어", "알려줘", "list", "search", "show",
];

/// Keywords signalling the user wants a summary.
pub const SUMMARY_KEYWORDS: &[&str] = &["요약", "summary", "정리", "핵심 정리", "압축", "한줄요약"];

/// Keywords signalling the user wants something updated.
pub const UPDATE_KEYWORDS: &[&str] = &["수정", "변경", "갱신", "바꿔", "고쳐", "편집", "반영", "update"];

/// Keywords signalling the user wants something deleted or archived.
pub const DELETE_KEYWORDS: &[&str] = &["삭제", "지워", "아카이브", "휴지통", "제거", "없애", "archive", "remove", "delete"];

/// Keywords signalling the user wants content appended.
pub const APPEND_KEYWORDS: &[&str] = &["추가", "append", "덧붙여", "붙여", "넣어", "본문에"];

/// Keywords signalling the user is referring to a database/data source.
pub const DATA_SOURCE_KEYWORDS: &[&str] = &["데이터소스", "data source", "data_source", "데이터베이스", "database", "db"];

/// Keywords signalling the user is referring to a Linear issue.
pub const LINEAR_ISSUE_KEYWORDS: &[&str] = &["이슈", "issue", "ticket", "티켓"];

/// Keywords signalling the user is referring to Linear itself.
pub const LINEAR_SERVICE_KEYWORDS: &[&str] = &["linear", "리니어"];

/// Case-insensitive substring test against any of `keywords`.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|keyword| lower.contains(&keyword.to_lowercase()))
}

/// Whether `text` expresses a create intent.
pub fn is_create_intent(text: &str) -> bool {
    contains_any(text, CREATE_KEYWORDS)
}

/// Whether `text` expresses a read intent.
pub fn is_read_intent(text: &str) -> bool {
    contains_any(text, READ_KEYWORDS)
}

/// Whether `text` expresses a summary intent.
pub fn is_summary_intent(text: &str) -> bool {
    contains_any(text, SUMMARY_KEYWORDS)
}

/// Whether `text` expresses an update intent.
pub fn is_update_intent(text: &str) -> bool {
    contains_any(text, UPDATE_KEYWORDS)
}

/// Whether `text` expresses a delete/archive intent.
pub fn is_delete_intent(text: &str) -> bool {
    contains_any(text, DELETE_KEYWORDS)
}

/// Whether `text` expresses an append intent.
pub fn is_append_intent(text: &str) -> bool {
    contains_any(text, APPEND_KEYWORDS)
}

/// Whether `text` refers to a data source / database.
pub fn is_data_source_intent(text: &str) -> bool {
    contains_any(text, DATA_SOURCE_KEYWORDS)
}

/// Whether `text` asks to create a Linear issue specifically, beyond the
/// generic create+issue-keyword overlap: either an explicit "register"-style
/// verb alongside an issue keyword, or an issue/create verb pair adjacent in
/// either order.
pub fn is_linear_issue_create_intent(text: &str) -> bool {
    if !(is_create_intent(text) && contains_any(text, LINEAR_ISSUE_KEYWORDS)) {
        return false;
    }
    let lower = text.to_lowercase();
    if contains_any(&lower, &["등록", "발행", "올려", "기입"]) && contains_any(&lower, LINEAR_ISSUE_KEYWORDS) {
        return true;
    }
    let forward = regex::Regex::new(r"(?:이슈|issue|티켓|ticket)\s*(?:생성|create|만들|작성)").expect("valid regex");
    let backward = regex::Regex::new(r"(?:생성|create|만들|작성)\s*(?:이슈|issue|티켓|ticket)").expect("valid regex");
    forward.is_match(&lower) || backward.is_match(&lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_intent_matches_korean_and_english() {
        assert!(is_create_intent("새 페이지를 생성해줘"));
        assert!(is_create_intent("please create a page"));
        assert!(!is_create_intent("오늘 날씨 어때"));
    }

    #[test]
    fn linear_issue_create_intent_requires_create_and_issue_keyword() {
        assert!(is_linear_issue_create_intent("linear에 새로운 이슈를 등록해줘"));
        assert!(is_linear_issue_create_intent("create an issue in linear"));
        assert!(!is_linear_issue_create_intent("linear에서 이슈를 검색해줘"));
    }
}
