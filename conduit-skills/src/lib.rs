//! # conduit-skills
//!
//! Loads and validates skill contracts — declarative bundles of a name, an
//! input/output schema, and an ordered list of runtime tools — and exposes
//! lookup, per-service listing, and skill inference from a selected tool set.

#![deny(missing_docs)]

mod contract;
mod load;

pub use contract::{SkillContract, SkillProvider};
pub use load::{validate_contract, SkillContractError};

use std::collections::HashSet;
use std::path::Path;

/// In-memory store of skill contracts, immutable once loaded.
#[derive(Debug)]
pub struct SkillStore {
    contracts: Vec<SkillContract>,
}

impl SkillStore {
    /// Build a store from already-validated contracts. Prefer
    /// [`SkillStore::load_from_dir`] in production; this constructor is for
    /// tests that assemble contracts in-memory.
    pub fn from_contracts(contracts: Vec<SkillContract>) -> Self {
        Self { contracts }
    }

    /// Load every `*.json` contract under `dir`. A missing directory loads
    /// as an empty store rather than an error.
    pub fn load_from_dir(dir: &Path) -> Result<Self, SkillContractError> {
        Ok(Self {
            contracts: load::load_from_dir(dir)?,
        })
    }

    /// All loaded contracts, in load order.
    pub fn all(&self) -> &[SkillContract] {
        &self.contracts
    }

    /// Look up a contract by its exact `name`.
    pub fn get(&self, name: &str) -> Option<&SkillContract> {
        let name = name.trim();
        self.contracts.iter().find(|c| c.name == name)
    }

    /// Contracts whose `provider.service` equals `service` (case-insensitive).
    pub fn list_by_service(&self, service: &str) -> Vec<&SkillContract> {
        let service = service.trim().to_lowercase();
        self.contracts
            .iter()
            .filter(|c| c.provider.service.to_lowercase() == service)
            .collect()
    }

    /// Deduplicated, order-preserving runtime tool names for one skill.
    /// Unknown skill names yield an empty list.
    pub fn runtime_tools_for_skill(&self, skill_name: &str) -> Vec<String> {
        match self.get(skill_name) {
            None => Vec::new(),
            Some(contract) => dedup_nonempty(&contract.runtime_tools),
        }
    }

    /// Deduplicated, order-preserving OAuth scopes required by one skill.
    /// Unknown skill names yield an empty list.
    pub fn required_scopes_for_skill(&self, skill_name: &str) -> Vec<String> {
        match self.get(skill_name) {
            None => Vec::new(),
            Some(contract) => dedup_nonempty(&contract.provider.scopes),
        }
    }

    /// Deduplicated, order-preserving union of runtime tools across every
    /// skill whose `provider.service` is one of `services`.
    pub fn runtime_tools_for_services(&self, services: &[String]) -> Vec<String> {
        let target: HashSet<String> = services
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().to_lowercase())
            .collect();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for contract in &self.contracts {
            if !target.contains(&contract.provider.service.to_lowercase()) {
                continue;
            }
            for tool in &contract.runtime_tools {
                let tool = tool.trim();
                if !tool.is_empty() && seen.insert(tool.to_string()) {
                    out.push(tool.to_string());
                }
            }
        }
        out
    }

    /// Infer the unique skill whose `runtime_tools` is the smallest
    /// superset of `selected_tools`. Returns `None` when `selected_tools`
    /// is empty, no skill's tools are a superset, or more than one skill
    /// ties for the smallest superset size.
    pub fn infer_skill_name(&self, selected_tools: &[String]) -> Option<String> {
        let requested: HashSet<&str> = selected_tools
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if requested.is_empty() {
            return None;
        }

        let mut candidates: Vec<(&str, usize)> = Vec::new();
        for contract in &self.contracts {
            if contract.name.trim().is_empty() || contract.runtime_tools.is_empty() {
                continue;
            }
            let tool_set: HashSet<&str> = contract
                .runtime_tools
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            if requested.is_subset(&tool_set) {
                candidates.push((contract.name.as_str(), tool_set.len()));
            }
        }

        let smallest_size = candidates.iter().map(|(_, size)| *size).min()?;
        let smallest: Vec<&str> = candidates
            .into_iter()
            .filter(|(_, size)| *size == smallest_size)
            .map(|(name, _)| name)
            .collect();
        match smallest.as_slice() {
            [single] => Some(single.to_string()),
            _ => None,
        }
    }
}

fn dedup_nonempty(items: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let item = item.trim();
        if !item.is_empty() && seen.insert(item.to_string()) {
            out.push(item.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contract(name: &str, service: &str, runtime_tools: &[&str]) -> SkillContract {
        SkillContract {
            name: name.to_string(),
            version: "1".to_string(),
            summary: "test".to_string(),
            provider: SkillProvider {
                service: service.to_string(),
                scopes: vec![format!("{service}.read")],
            },
            autofill: json!({}),
            input_schema: json!({"type": "object"}),
            output_schema: json!({"type": "object"}),
            examples: vec![json!({})],
            runtime_tools: runtime_tools.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn get_finds_by_exact_name() {
        let store = SkillStore::from_contracts(vec![contract("notion.page_create", "notion", &["notion_create_page"])]);
        assert!(store.get("notion.page_create").is_some());
        assert!(store.get("notion.page_update").is_none());
    }

    #[test]
    fn infer_skill_picks_unique_smallest_superset() {
        let store = SkillStore::from_contracts(vec![
            contract("notion.page_create", "notion", &["notion_create_page"]),
            contract(
                "notion.page_create_and_notify",
                "notion",
                &["notion_create_page", "notion_search"],
            ),
        ]);
        let inferred = store.infer_skill_name(&["notion_create_page".to_string()]);
        assert_eq!(inferred.as_deref(), Some("notion.page_create"));
    }

    #[test]
    fn infer_skill_ties_return_none() {
        let store = SkillStore::from_contracts(vec![
            contract("notion.a", "notion", &["notion_search", "notion_create_page"]),
            contract("notion.b", "notion", &["notion_search", "notion_update_page"]),
        ]);
        let inferred = store.infer_skill_name(&["notion_search".to_string()]);
        assert_eq!(inferred, None);
    }

    #[test]
    fn infer_skill_empty_selection_is_none() {
        let store = SkillStore::from_contracts(vec![contract("notion.page_create", "notion", &["notion_create_page"])]);
        assert_eq!(store.infer_skill_name(&[]), None);
    }

    #[test]
    fn runtime_tools_for_services_deduplicates_across_skills() {
        let store = SkillStore::from_contracts(vec![
            contract("notion.a", "notion", &["notion_search", "notion_create_page"]),
            contract("notion.b", "notion", &["notion_search", "notion_update_page"]),
        ]);
        let tools = store.runtime_tools_for_services(&["notion".to_string()]);
        assert_eq!(
            tools,
            vec![
                "notion_search".to_string(),
                "notion_create_page".to_string(),
                "notion_update_page".to_string(),
            ]
        );
    }
}
