//! # conduit-resolver
//!
//! Infers which connected services a user's request is about, by scoring
//! each service's keyword overlap against the request text. Keywords come
//! from a static table plus terms synthesized from each connected
//! service's own tool names and descriptions.

#![deny(missing_docs)]

use std::collections::{HashMap, HashSet};

use conduit_registry::ToolRegistry;

/// Static keyword table for the services this system knows about
/// independent of any registered tools.
pub fn static_service_keywords() -> HashMap<&'static str, &'static [&'static str]> {
    HashMap::from([
        ("notion", ["notion", "노션", "페이지", "문서", "데이터베이스", "회의록"].as_slice()),
        ("spotify", ["spotify", "스포티파이", "플레이리스트", "노래", "음악", "트랙"].as_slice()),
        ("google", ["google", "구글", "gmail", "캘린더", "드라이브"].as_slice()),
        ("github", ["github", "깃허브", "repo", "pull request", "이슈"].as_slice()),
        ("slack", ["slack", "슬랙", "채널", "메시지"].as_slice()),
    ])
}

const STOP_TOKENS: &[&str] = &["tool", "api", "call"];

fn split_tokens(text: &str) -> Vec<String> {
    text.replace('-', " ").replace('_', " ").split_whitespace().map(str::to_string).collect()
}

/// Build the keyword map used for one resolution call: the static table,
/// extended for every service in `connected` with the service identifier
/// itself and tokens (length >= 3, excluding `tool`/`api`/`call`) drawn
/// from that service's tool names and descriptions in `registry`.
///
/// `registry` being `None` mirrors the source falling back to the static
/// table alone when the registry fails to load.
pub fn build_dynamic_keywords(connected: &HashSet<String>, registry: Option<&ToolRegistry>) -> HashMap<String, HashSet<String>> {
    let mut keyword_map: HashMap<String, HashSet<String>> = static_service_keywords()
        .into_iter()
        .map(|(service, keywords)| (service.to_string(), keywords.iter().map(|k| k.to_string()).collect()))
        .collect();

    let Some(registry) = registry else {
        return keyword_map;
    };

    for service in connected {
        if service.is_empty() {
            continue;
        }
        let terms = keyword_map.entry(service.clone()).or_default();
        terms.insert(service.clone());
        for token in split_tokens(service) {
            if token.chars().count() >= 2 {
                terms.insert(token);
            }
        }

        for tool in registry.list_tools(Some(service)) {
            let combined = format!("{} {}", tool.tool_name, tool.description).to_lowercase();
            for token in split_tokens(&combined) {
                if token.chars().count() >= 3 && !STOP_TOKENS.contains(&token.as_str()) {
                    terms.insert(token);
                }
            }
        }
    }

    keyword_map
}

/// Infer relevant services from `user_text`, highest-scored first.
///
/// Scores each service by the number of its keywords found as a substring
/// of the lower-cased text, then adds 1 to every already-matched service
/// that is also connected. When `connected_services` is non-empty, results
/// are restricted to it; when nothing matched and exactly one service is
/// connected, that service is returned as a single-element fallback.
/// `max_services <= 0` returns every ranked service; otherwise the result
/// is truncated to `max_services`.
pub fn resolve_services(
    user_text: &str,
    connected_services: &[String],
    max_services: i64,
    registry: Option<&ToolRegistry>,
) -> Vec<String> {
    let normalized = user_text.trim().to_lowercase();
    let connected: HashSet<String> = connected_services
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let keyword_universe: HashSet<String> = if connected.is_empty() {
        static_service_keywords().keys().map(|s| s.to_string()).collect()
    } else {
        connected.clone()
    };
    let keyword_map = build_dynamic_keywords(&keyword_universe, registry);

    let mut scores: HashMap<String, i64> = HashMap::new();
    for (service, keywords) in &keyword_map {
        let mut matched = 0i64;
        for keyword in keywords {
            if normalized.contains(keyword.as_str()) {
                matched += 1;
            }
        }
        if matched > 0 {
            scores.insert(service.clone(), matched);
        }
    }

    for service in scores.clone().keys() {
        if connected.contains(service) {
            *scores.get_mut(service).expect("key just read") += 1;
        }
    }

    let mut ranked: Vec<(String, i64)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let mut resolved: Vec<String> = ranked.into_iter().map(|(service, _)| service).collect();

    if !connected.is_empty() {
        resolved.retain(|service| connected.contains(service));
    }

    if resolved.is_empty() && connected.len() == 1 {
        return connected.into_iter().collect();
    }

    if max_services <= 0 {
        resolved
    } else {
        resolved.truncate(max_services as usize);
        resolved
    }
}

/// The single highest-scored service, or `None` if nothing resolved.
pub fn resolve_primary_service(user_text: &str, connected_services: &[String], registry: Option<&ToolRegistry>) -> Option<String> {
    resolve_services(user_text, connected_services, 1, registry).into_iter().next()
}
