//! # conduit-profile
//!
//! Builds the risk/scope policy gate's output: which registered tools a
//! connected user may call right now, and why every other tool was blocked.

#![deny(missing_docs)]

use std::collections::{HashMap, HashSet};

use conduit_registry::ToolRegistry;
use serde::{Deserialize, Serialize};

fn scope_aliases() -> HashMap<&'static str, HashMap<&'static str, &'static str>> {
    HashMap::from([(
        "google",
        HashMap::from([
            ("https://www.googleapis.com/auth/calendar.readonly", "calendar.read"),
            ("https://www.googleapis.com/auth/calendar", "calendar.read"),
        ]),
    )])
}

fn canonical_scope(provider: &str, scope: &str) -> Option<String> {
    let value = scope.trim();
    if value.is_empty() {
        return None;
    }
    let provider = provider.trim().to_lowercase();
    let aliases = scope_aliases();
    let resolved = aliases
        .get(provider.as_str())
        .and_then(|map| map.get(value))
        .map(|s| s.to_string())
        .unwrap_or_else(|| value.to_string());
    Some(resolved)
}

fn is_high_risk_tool(tool_name: &str) -> bool {
    let lowered = tool_name.trim().to_lowercase();
    ["delete", "archive", "remove", "purge"].iter().any(|token| lowered.contains(token))
}

fn scope_allowed(service: &str, required_scopes: &[String], granted_scopes: Option<&HashMap<String, HashSet<String>>>) -> bool {
    let required: HashSet<String> = required_scopes.iter().filter_map(|s| canonical_scope(service, s)).collect();
    if required.is_empty() {
        return true;
    }
    let Some(granted_scopes) = granted_scopes else {
        return false;
    };
    let provider = service.trim().to_lowercase();
    let Some(granted_raw) = granted_scopes.get(&provider) else {
        return false;
    };
    let granted: HashSet<String> = granted_raw.iter().filter_map(|s| canonical_scope(&provider, s)).collect();
    required.is_subset(&granted)
}

/// Why a tool was excluded from the enabled set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiBlockReason {
    /// The blocked tool's name.
    pub api_id: String,
    /// `tenant_policy_blocked`, `missing_required_scope`, or `risk_policy_blocked`.
    pub reason: String,
}

/// Tenant-level overrides: tools explicitly denied regardless of scope.
#[derive(Debug, Clone, Default)]
pub struct TenantPolicy {
    /// Tool names this tenant has explicitly blocked.
    pub blocked_tools: HashSet<String>,
}

/// Risk gate configuration.
#[derive(Debug, Clone, Default)]
pub struct RiskPolicy {
    /// Whether tools whose name implies a destructive operation
    /// (`delete`, `archive`, `remove`, `purge`) may run at all.
    pub allow_high_risk: bool,
}

/// Which registered tools are callable right now, and why every other one
/// was blocked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeApiProfile {
    /// Tool names enabled for this caller, sorted.
    pub enabled_api_ids: Vec<String>,
    /// Tool names blocked for this caller, in registry order.
    pub blocked_api_ids: Vec<String>,
    /// One reason per blocked tool, same order as `blocked_api_ids`.
    pub blocked_reason: Vec<ApiBlockReason>,
}

/// Build a [`RuntimeApiProfile`] for one caller.
///
/// For every registered tool: drop it silently if its service isn't
/// connected; block with `tenant_policy_blocked` if the tenant has
/// blocklisted it; block with `missing_required_scope` if its required
/// scopes (after per-provider scope aliasing) aren't a subset of the
/// caller's granted scopes; block with `risk_policy_blocked` if it looks
/// destructive and high-risk tools aren't allowed. Everything else is
/// enabled.
pub fn build_runtime_api_profile(
    registry: &ToolRegistry,
    connected_services: &[String],
    granted_scopes: Option<&HashMap<String, HashSet<String>>>,
    tenant_policy: &TenantPolicy,
    risk_policy: &RiskPolicy,
) -> RuntimeApiProfile {
    let connected: HashSet<String> = connected_services
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let mut enabled = Vec::new();
    let mut blocked = Vec::new();

    for tool in registry.list_tools(None) {
        if !connected.contains(&tool.service) {
            continue;
        }
        if tenant_policy.blocked_tools.contains(&tool.tool_name) {
            blocked.push(ApiBlockReason {
                api_id: tool.tool_name.clone(),
                reason: "tenant_policy_blocked".to_string(),
            });
            continue;
        }
        if !scope_allowed(&tool.service, &tool.required_scopes, granted_scopes) {
            blocked.push(ApiBlockReason {
                api_id: tool.tool_name.clone(),
                reason: "missing_required_scope".to_string(),
            });
            continue;
        }
        if is_high_risk_tool(&tool.tool_name) && !risk_policy.allow_high_risk {
            blocked.push(ApiBlockReason {
                api_id: tool.tool_name.clone(),
                reason: "risk_policy_blocked".to_string(),
            });
            continue;
        }
        enabled.push(tool.tool_name.clone());
    }

    enabled.sort();
    let blocked_api_ids = blocked.iter().map(|b| b.api_id.clone()).collect();
    RuntimeApiProfile {
        enabled_api_ids: enabled,
        blocked_api_ids,
        blocked_reason: blocked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_registry::{IdempotencyKeyPolicy, ToolDefinition};

    fn tool(service: &str, name: &str, scopes: &[&str]) -> ToolDefinition {
        ToolDefinition {
            service: service.to_string(),
            tool_name: name.to_string(),
            description: "t".to_string(),
            http_method: "POST".to_string(),
            path_template: "/x".to_string(),
            base_url: "https://example.test".to_string(),
            adapter_function: "noop".to_string(),
            input_schema: serde_json::json!({"type": "object"}),
            required_scopes: scopes.iter().map(|s| s.to_string()).collect(),
            idempotency_key_policy: IdempotencyKeyPolicy::None,
            error_map: HashMap::new(),
        }
    }

    #[test]
    fn blocks_disconnected_service_silently() {
        let registry = ToolRegistry::from_tools(vec![tool("notion", "notion_search", &[])]);
        let profile = build_runtime_api_profile(&registry, &[], None, &TenantPolicy::default(), &RiskPolicy::default());
        assert!(profile.enabled_api_ids.is_empty());
        assert!(profile.blocked_api_ids.is_empty());
    }

    #[test]
    fn blocks_missing_scope() {
        let registry = ToolRegistry::from_tools(vec![tool("notion", "notion_create_page", &["notion.write"])]);
        let profile = build_runtime_api_profile(
            &registry,
            &["notion".to_string()],
            None,
            &TenantPolicy::default(),
            &RiskPolicy::default(),
        );
        assert_eq!(profile.blocked_api_ids, vec!["notion_create_page".to_string()]);
        assert_eq!(profile.blocked_reason[0].reason, "missing_required_scope");
    }

    #[test]
    fn high_risk_tool_blocked_unless_allowed() {
        let registry = ToolRegistry::from_tools(vec![tool("notion", "notion_delete_page", &[])]);
        let connected = vec!["notion".to_string()];

        let blocked = build_runtime_api_profile(&registry, &connected, None, &TenantPolicy::default(), &RiskPolicy::default());
        assert_eq!(blocked.blocked_reason[0].reason, "risk_policy_blocked");

        let allowed = build_runtime_api_profile(
            &registry,
            &connected,
            None,
            &TenantPolicy::default(),
            &RiskPolicy { allow_high_risk: true },
        );
        assert_eq!(allowed.enabled_api_ids, vec!["notion_delete_page".to_string()]);
    }

    #[test]
    fn google_scope_alias_maps_oauth_url_to_canonical_scope() {
        let registry = ToolRegistry::from_tools(vec![tool("google", "google_calendar_list_events", &["calendar.read"])]);
        let mut granted = HashMap::new();
        granted.insert(
            "google".to_string(),
            HashSet::from(["https://www.googleapis.com/auth/calendar.readonly".to_string()]),
        );
        let profile = build_runtime_api_profile(
            &registry,
            &["google".to_string()],
            Some(&granted),
            &TenantPolicy::default(),
            &RiskPolicy::default(),
        );
        assert_eq!(profile.enabled_api_ids, vec!["google_calendar_list_events".to_string()]);
    }

    #[test]
    fn tenant_blocklist_wins_over_scope_check() {
        let registry = ToolRegistry::from_tools(vec![tool("notion", "notion_search", &[])]);
        let tenant = TenantPolicy {
            blocked_tools: HashSet::from(["notion_search".to_string()]),
        };
        let profile = build_runtime_api_profile(&registry, &["notion".to_string()], None, &tenant, &RiskPolicy::default());
        assert_eq!(profile.blocked_reason[0].reason, "tenant_policy_blocked");
    }
}
