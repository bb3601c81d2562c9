use std::path::PathBuf;

use conduit_skills::SkillStore;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("skill_contracts")
}

#[test]
fn loads_every_fixture_contract() {
    let store = SkillStore::load_from_dir(&fixtures_dir()).expect("fixtures are valid");
    assert_eq!(store.all().len(), 3);
    assert!(store.get("notion.page_create").is_some());
    assert!(store.get("linear.issue_create").is_some());
}

#[test]
fn list_by_service_filters_correctly() {
    let store = SkillStore::load_from_dir(&fixtures_dir()).expect("fixtures are valid");
    let notion_skills = store.list_by_service("notion");
    assert_eq!(notion_skills.len(), 1);
    assert_eq!(notion_skills[0].name, "notion.page_create");
}

#[test]
fn required_scopes_for_skill_matches_provider() {
    let store = SkillStore::load_from_dir(&fixtures_dir()).expect("fixtures are valid");
    assert_eq!(
        store.required_scopes_for_skill("linear.issue_create"),
        vec!["linear.write".to_string()]
    );
    assert!(store.required_scopes_for_skill("unknown.skill").is_empty());
}

#[test]
fn infer_skill_from_single_runtime_tool() {
    let store = SkillStore::load_from_dir(&fixtures_dir()).expect("fixtures are valid");
    let inferred = store.infer_skill_name(&["notion_create_page".to_string()]);
    assert_eq!(inferred.as_deref(), Some("notion.page_create"));
}

#[test]
fn rejects_contract_missing_service_prefix() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("bad.json"),
        r#"{
            "name": "no_dot_here",
            "version": "1",
            "summary": "x",
            "provider": {"service": "notion"},
            "autofill": {},
            "input_schema": {"type": "object"},
            "output_schema": {"type": "object"},
            "examples": [{}],
            "runtime_tools": ["notion_search"]
        }"#,
    )
    .expect("write fixture");

    let err = SkillStore::load_from_dir(dir.path()).expect_err("must fail validation");
    assert!(err.to_string().contains("service prefix"));
}

#[test]
fn missing_contracts_dir_loads_empty() {
    let store = SkillStore::load_from_dir(std::path::Path::new("/no/such/dir")).expect("missing dir is not an error");
    assert!(store.all().is_empty());
}
