use std::collections::HashMap;

use conduit_slots::{get_action_slot_schema, normalize_slots};
use proptest::prelude::*;

const ACTIONS: &[&str] = &[
    "notion_search",
    "notion_create_page",
    "notion_append_block_children",
    "notion_update_page",
    "notion_query_data_source",
    "linear_search_issues",
    "linear_create_issue",
    "linear_update_issue",
    "linear_create_comment",
];

fn arb_action() -> impl Strategy<Value = &'static str> {
    prop::sample::select(ACTIONS)
}

fn arb_collected() -> impl Strategy<Value = HashMap<String, serde_json::Value>> {
    prop::collection::hash_map(
        "[a-zA-Z_가-힣]{1,12}",
        prop::string::string_regex("[a-zA-Z0-9 ]{0,20}").unwrap().prop_map(serde_json::Value::String),
        0..6,
    )
}

proptest! {
    // Property 4 (spec §8): normalizing an already-normalized slot map is a
    // no-op, regardless of which action schema or which arbitrary keys were
    // supplied.
    #[test]
    fn normalize_slots_is_idempotent(action in arb_action(), collected in arb_collected()) {
        let schema = get_action_slot_schema(action);
        let once = normalize_slots(schema, &collected);
        let twice = normalize_slots(schema, &once);
        prop_assert_eq!(once, twice);
    }
}
