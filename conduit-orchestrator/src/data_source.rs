//! The data-source-query short-circuit (§4.17 step 1): before planning
//! anything, recognise a request that names a Notion data source by id
//! and reject it early with a helpful message if that id is missing or
//! not a UUID, rather than letting it fall through to a planner that has
//! no tool for "guess the id".

use std::sync::OnceLock;

use regex::Regex;

const QUERY_VERB_KEYWORDS: [&str; 7] = ["조회", "목록", "검색", "불러", "보여", "최근", "상위"];

/// Outcome of checking whether `user_text` looks like a data-source query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceQueryState {
    /// The text doesn't mention a data source at all; nothing to validate.
    NotApplicable,
    /// A data-source id was present and parses as a UUID.
    Ok,
    /// The data-source keyword appeared with no id token after it.
    Missing,
    /// An id token was present but isn't UUID-shaped.
    Invalid,
}

impl DataSourceQueryState {
    /// Whether this should be treated as a data-source query at all, i.e.
    /// whether `"missing"`/`"invalid"` should short-circuit the caller.
    pub fn is_data_source_query(self) -> bool {
        !matches!(self, Self::NotApplicable)
    }
}

fn uuid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[0-9a-fA-F]{8}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{12}").unwrap())
}

fn id_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(?:데이터소스|data[_ ]source)\s+(\S+)").unwrap())
}

fn mentions_data_source(user_text: &str) -> bool {
    let lowered = user_text.to_lowercase();
    user_text.contains("데이터소스") || lowered.contains("data source") || lowered.contains("data_source")
}

fn mentions_query_verb(user_text: &str) -> bool {
    QUERY_VERB_KEYWORDS.iter().any(|verb| user_text.contains(verb))
}

/// Strip leading/trailing punctuation a user might have typed around an id
/// (quotes, trailing periods, Korean particles attached with a dash).
fn strip_candidate_punctuation(candidate: &str) -> &str {
    candidate.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Mirrors the original loop's `_parse_data_source_query_state`: decide
/// whether `user_text` is a data-source query, and if so whether its id
/// is present and well-formed.
pub fn parse_data_source_query_state(user_text: &str) -> DataSourceQueryState {
    if !(mentions_data_source(user_text) && mentions_query_verb(user_text)) {
        return DataSourceQueryState::NotApplicable;
    }

    if uuid_pattern().is_match(user_text) {
        return DataSourceQueryState::Ok;
    }

    let Some(captures) = id_token_pattern().captures(user_text) else {
        return DataSourceQueryState::Missing;
    };
    let candidate = strip_candidate_punctuation(&captures[1]);
    if candidate.is_empty() || QUERY_VERB_KEYWORDS.contains(&candidate) {
        return DataSourceQueryState::Missing;
    }

    DataSourceQueryState::Invalid
}

/// The `(user_message, detail)` pair for a `"missing"` data-source id.
pub fn missing_id_message() -> (&'static str, &'static str) {
    ("데이터소스 조회를 위해 ID가 필요합니다.\n예: '노션 데이터소스 <id> 최근 5개 조회'", "id_missing")
}

/// The `(user_message, detail)` pair for an `"invalid"` data-source id.
pub fn invalid_id_message() -> (&'static str, &'static str) {
    (
        "데이터소스 ID 형식이 올바르지 않습니다.\nUUID 형식으로 입력해주세요.\n예: '노션 데이터소스 12345678-1234-1234-1234-1234567890ab 최근 5개 조회'",
        "id_invalid_format",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_data_source_query_is_not_applicable() {
        assert_eq!(parse_data_source_query_state("노션에 페이지 만들어줘"), DataSourceQueryState::NotApplicable);
    }

    #[test]
    fn dashed_uuid_is_ok() {
        let state = parse_data_source_query_state("노션 데이터소스 12345678-1234-1234-1234-1234567890ab 최근 5개 조회");
        assert_eq!(state, DataSourceQueryState::Ok);
    }

    #[test]
    fn undashed_uuid_is_ok() {
        let state = parse_data_source_query_state("data source 123456781234123412341234567890ab 조회해줘");
        assert_eq!(state, DataSourceQueryState::Ok);
    }

    #[test]
    fn missing_id_token_is_missing() {
        let state = parse_data_source_query_state("데이터소스 최근 5개 조회");
        assert_eq!(state, DataSourceQueryState::Missing);
    }

    #[test]
    fn non_uuid_token_is_invalid() {
        let state = parse_data_source_query_state("데이터소스 내프로젝트 조회해줘");
        assert_eq!(state, DataSourceQueryState::Invalid);
    }

    #[test]
    fn query_without_verb_is_not_applicable() {
        assert_eq!(parse_data_source_query_state("데이터소스 12345678-1234-1234-1234-1234567890ab"), DataSourceQueryState::NotApplicable);
    }
}
