//! Built-in action slot schemas.

use std::collections::HashMap;

use crate::rule::ValidationRule;

const NOTION_ID_PATTERN: &str = r"^[0-9a-fA-F-]{32,36}$";
const UUID_PATTERN: &str = r"^[0-9a-fA-F]{8}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{12}$";
const LINEAR_ID_PATTERN: &str = r"^[A-Za-z0-9_-]{2,64}$";

/// Required/optional slots, alias table, and validation rules for one
/// named action.
#[derive(Debug, Clone)]
pub struct ActionSlotSchema {
    /// The action this schema governs, e.g. `notion_create_page`.
    pub action: String,
    /// Slots that must be present (after normalization) before the action
    /// can run.
    pub required_slots: Vec<String>,
    /// Slots that may be present but aren't required.
    pub optional_slots: Vec<String>,
    /// Alternate names (often Korean) that normalize onto a canonical slot.
    pub aliases: HashMap<String, Vec<String>>,
    /// Per-slot validation rules, keyed by canonical slot name.
    pub validation_rules: HashMap<String, ValidationRule>,
}

impl ActionSlotSchema {
    /// `required_slots` followed by `optional_slots`.
    pub fn all_slots(&self) -> Vec<String> {
        self.required_slots
            .iter()
            .chain(self.optional_slots.iter())
            .cloned()
            .collect()
    }
}

fn aliases(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
    pairs
        .iter()
        .map(|(slot, names)| (slot.to_string(), names.iter().map(|n| n.to_string()).collect()))
        .collect()
}

fn rules(pairs: Vec<(&str, ValidationRule)>) -> HashMap<String, ValidationRule> {
    pairs.into_iter().map(|(slot, rule)| (slot.to_string(), rule)).collect()
}

fn strs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Build the registry's fixed set of built-in action slot schemas, keyed by
/// action name, matching the nine actions the slot-collection state machine
/// understands.
pub fn builtin_schemas() -> HashMap<String, ActionSlotSchema> {
    let mut map = HashMap::new();

    map.insert(
        "notion_search".to_string(),
        ActionSlotSchema {
            action: "notion_search".to_string(),
            required_slots: strs(&["query"]),
            optional_slots: strs(&["page_size"]),
            aliases: aliases(&[("query", &["검색어", "키워드", "title"]), ("page_size", &["개수", "수", "limit", "top"])]),
            validation_rules: rules(vec![
                ("query", ValidationRule::string(Some(1), Some(200))),
                ("page_size", ValidationRule::integer(Some(1), Some(20))),
            ]),
        },
    );

    map.insert(
        "notion_create_page".to_string(),
        ActionSlotSchema {
            action: "notion_create_page".to_string(),
            required_slots: Vec::new(),
            optional_slots: strs(&["title", "title_hint", "parent_page_id", "properties"]),
            aliases: aliases(&[
                ("title", &["제목", "name"]),
                ("title_hint", &["title_hint", "제목힌트"]),
                ("parent_page_id", &["상위페이지", "parent_page_id"]),
            ]),
            validation_rules: rules(vec![
                ("title", ValidationRule::string(Some(1), Some(100))),
                ("title_hint", ValidationRule::string(Some(1), Some(100))),
                ("parent_page_id", ValidationRule::pattern(NOTION_ID_PATTERN)),
            ]),
        },
    );

    map.insert(
        "notion_append_block_children".to_string(),
        ActionSlotSchema {
            action: "notion_append_block_children".to_string(),
            required_slots: strs(&["block_id"]),
            optional_slots: strs(&["children", "content", "content_type"]),
            aliases: aliases(&[
                ("block_id", &["페이지", "page", "대상페이지", "target_page", "page_id", "block_id"]),
                ("children", &["children", "블록목록"]),
                ("content", &["본문", "내용", "text"]),
                ("content_type", &["형식", "타입", "type"]),
            ]),
            validation_rules: rules(vec![
                ("block_id", ValidationRule::pattern(NOTION_ID_PATTERN)),
                ("content", ValidationRule::string(Some(1), Some(4000))),
                ("content_type", ValidationRule::string_enum(&["paragraph", "bulleted_list_item", "to_do"])),
            ]),
        },
    );

    map.insert(
        "notion_update_page".to_string(),
        ActionSlotSchema {
            action: "notion_update_page".to_string(),
            required_slots: strs(&["page_id"]),
            optional_slots: strs(&["title", "archived", "parent_page_id"]),
            aliases: aliases(&[
                ("page_id", &["페이지", "page", "target_page"]),
                ("title", &["제목", "새제목", "new_title"]),
                ("archived", &["삭제", "아카이브", "archive"]),
                ("parent_page_id", &["상위페이지", "이동할페이지", "parent"]),
            ]),
            validation_rules: rules(vec![
                ("page_id", ValidationRule::pattern(NOTION_ID_PATTERN)),
                ("title", ValidationRule::string(Some(1), Some(100))),
                ("archived", ValidationRule::boolean()),
                ("parent_page_id", ValidationRule::pattern(NOTION_ID_PATTERN)),
            ]),
        },
    );

    map.insert(
        "notion_query_data_source".to_string(),
        ActionSlotSchema {
            action: "notion_query_data_source".to_string(),
            required_slots: strs(&["data_source_id"]),
            optional_slots: strs(&["page_size", "query"]),
            aliases: aliases(&[
                ("data_source_id", &["데이터소스", "datasource", "data_source"]),
                ("page_size", &["개수", "수", "limit"]),
                ("query", &["검색어", "키워드"]),
            ]),
            validation_rules: rules(vec![
                ("data_source_id", ValidationRule::pattern(UUID_PATTERN)),
                ("page_size", ValidationRule::integer(Some(1), Some(50))),
                ("query", ValidationRule::string(Some(1), Some(200))),
            ]),
        },
    );

    map.insert(
        "linear_search_issues".to_string(),
        ActionSlotSchema {
            action: "linear_search_issues".to_string(),
            required_slots: strs(&["query"]),
            optional_slots: strs(&["first", "team_id"]),
            aliases: aliases(&[
                ("query", &["검색어", "키워드", "이슈"]),
                ("first", &["개수", "수", "limit"]),
                ("team_id", &["팀", "team"]),
            ]),
            validation_rules: rules(vec![
                ("query", ValidationRule::string(Some(1), Some(200))),
                ("first", ValidationRule::integer(Some(1), Some(20))),
                ("team_id", ValidationRule::pattern(LINEAR_ID_PATTERN)),
            ]),
        },
    );

    map.insert(
        "linear_create_issue".to_string(),
        ActionSlotSchema {
            action: "linear_create_issue".to_string(),
            required_slots: strs(&["title", "team_id"]),
            optional_slots: strs(&["description", "priority"]),
            aliases: aliases(&[
                ("title", &["제목", "name"]),
                ("team_id", &["팀", "team"]),
                ("description", &["본문", "설명", "내용"]),
                ("priority", &["우선순위", "priority"]),
            ]),
            validation_rules: rules(vec![
                ("title", ValidationRule::string(Some(1), Some(200))),
                ("team_id", ValidationRule::pattern(LINEAR_ID_PATTERN)),
                ("description", ValidationRule::string(None, Some(8000))),
                ("priority", ValidationRule::integer_enum(&[0, 1, 2, 3, 4])),
            ]),
        },
    );

    map.insert(
        "linear_update_issue".to_string(),
        ActionSlotSchema {
            action: "linear_update_issue".to_string(),
            required_slots: strs(&["issue_id"]),
            optional_slots: strs(&["title", "description", "state_id", "priority"]),
            aliases: aliases(&[
                ("issue_id", &["이슈", "issue", "이슈ID"]),
                ("title", &["제목", "name"]),
                ("description", &["본문", "설명", "내용"]),
                ("state_id", &["상태", "state"]),
                ("priority", &["우선순위", "priority"]),
            ]),
            validation_rules: rules(vec![
                ("issue_id", ValidationRule::pattern(LINEAR_ID_PATTERN)),
                ("title", ValidationRule::string(Some(1), Some(200))),
                ("description", ValidationRule::string(None, Some(8000))),
                ("state_id", ValidationRule::pattern(LINEAR_ID_PATTERN)),
                ("priority", ValidationRule::integer_enum(&[0, 1, 2, 3, 4])),
            ]),
        },
    );

    map.insert(
        "linear_create_comment".to_string(),
        ActionSlotSchema {
            action: "linear_create_comment".to_string(),
            required_slots: strs(&["issue_id", "body"]),
            optional_slots: Vec::new(),
            aliases: aliases(&[
                ("issue_id", &["이슈", "issue", "이슈ID"]),
                ("body", &["코멘트", "댓글", "내용", "본문"]),
            ]),
            validation_rules: rules(vec![
                ("issue_id", ValidationRule::pattern(LINEAR_ID_PATTERN)),
                ("body", ValidationRule::string(Some(1), Some(4000))),
            ]),
        },
    );

    map
}
