//! # conduit-intent
//!
//! Bilingual (Korean/English) keyword-based intent classification and
//! structured slot extraction over free-form user text. Every `is_*_intent`
//! check is a case-insensitive substring test; every `extract_*` function
//! returns `None` rather than guessing when the text is ambiguous.

#![deny(missing_docs)]

mod extractors;
mod keywords;

pub use extractors::{
    extract_count_limit, extract_linear_issue_reference, extract_linear_issue_title_for_create,
    extract_linear_team_reference, extract_linear_update_description_text, extract_linear_update_new_title,
    extract_linear_update_priority, extract_linear_update_state_id, extract_notion_page_title,
    extract_notion_page_title_for_create, extract_notion_update_body_text, extract_notion_update_new_title,
};
pub use keywords::{
    contains_any, is_append_intent, is_create_intent, is_data_source_intent, is_delete_intent,
    is_linear_issue_create_intent, is_read_intent, is_summary_intent, is_update_intent, APPEND_KEYWORDS,
    CREATE_KEYWORDS, DATA_SOURCE_KEYWORDS, DELETE_KEYWORDS, LINEAR_ISSUE_KEYWORDS, LINEAR_SERVICE_KEYWORDS,
    READ_KEYWORDS, SUMMARY_KEYWORDS, UPDATE_KEYWORDS,
};

/// Clamp a loosely-parsed integer into `[minimum, maximum]`, falling back
/// to `default` when `raw` doesn't parse.
pub fn safe_int(raw: &str, default: u32, minimum: u32, maximum: u32) -> u32 {
    raw.trim().parse::<u32>().unwrap_or(default).clamp(minimum, maximum)
}
