//! # conduit-catalog
//!
//! Process-wide TTL cache that maps a user's large tool-result payload to a
//! short, stable `catalog_id` so later turns can reference it without
//! resending the whole thing. Identical payloads for the same user collapse
//! to the same id (content-addressed, §4.7 / property 5); entries expire on
//! their own TTL and are swept lazily on every call.

#![deny(missing_docs)]

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, SystemTime};

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

const DEFAULT_TTL: Duration = Duration::from_secs(1800);
const MIN_TTL: Duration = Duration::from_secs(60);

/// Errors raised while creating or reading catalog entries.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CatalogError {
    /// `user_id` was empty or all whitespace.
    #[error("user_id_required")]
    UserIdRequired,

    /// The payload to catalog was not a JSON object.
    #[error("catalog_payload_must_be_object")]
    PayloadMustBeObject,

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    user_id: String,
    payload: Value,
    expires_at: SystemTime,
}

#[derive(Debug, Default)]
struct CatalogStore {
    by_id: HashMap<String, CatalogEntry>,
    by_user: HashMap<String, HashSet<String>>,
}

impl CatalogStore {
    fn cleanup_expired(&mut self, now: SystemTime) {
        let expired: Vec<String> = self
            .by_id
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(id, _)| id.clone())
            .collect();
        for catalog_id in expired {
            if let Some(entry) = self.by_id.remove(&catalog_id) {
                if let Some(ids) = self.by_user.get_mut(&entry.user_id) {
                    ids.remove(&catalog_id);
                    if ids.is_empty() {
                        self.by_user.remove(&entry.user_id);
                    }
                }
            }
        }
    }
}

static CATALOG_STORE: OnceLock<Mutex<CatalogStore>> = OnceLock::new();

fn store() -> &'static Mutex<CatalogStore> {
    CATALOG_STORE.get_or_init(|| Mutex::new(CatalogStore::default()))
}

fn catalog_id_for(user_id: &str, payload_hash: &str) -> String {
    let basis = format!("{user_id}:{payload_hash}");
    let mut hasher = Sha256::new();
    hasher.update(basis.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("catalog_{}", &digest[..20])
}

/// Look up an existing, unexpired catalog entry for `(user_id,
/// catalog_payload)`, or create one with `ttl` (floored to
/// [`MIN_TTL`]). Returns `(catalog_id, created)`; `created` is `false` when
/// an existing entry was found and its expiry extended.
pub fn get_or_create_catalog_id(user_id: &str, catalog_payload: &Value, ttl: Duration) -> Result<(String, bool), CatalogError> {
    let normalized_user_id = user_id.trim();
    if normalized_user_id.is_empty() {
        return Err(CatalogError::UserIdRequired);
    }
    if !catalog_payload.is_object() {
        return Err(CatalogError::PayloadMustBeObject);
    }

    let now = SystemTime::now();
    let mut guard = store().lock().expect("catalog store mutex poisoned");
    guard.cleanup_expired(now);

    let payload_hash = conduit_core::sha256_hex(catalog_payload);
    let catalog_id = catalog_id_for(normalized_user_id, &payload_hash);
    let effective_ttl = ttl.max(MIN_TTL);

    if let Some(entry) = guard.by_id.get_mut(&catalog_id) {
        if entry.expires_at > now {
            entry.expires_at = now + effective_ttl;
            return Ok((catalog_id, false));
        }
    }

    guard.by_id.insert(
        catalog_id.clone(),
        CatalogEntry {
            user_id: normalized_user_id.to_string(),
            payload: catalog_payload.clone(),
            expires_at: now + effective_ttl,
        },
    );
    guard.by_user.entry(normalized_user_id.to_string()).or_default().insert(catalog_id.clone());
    Ok((catalog_id, true))
}

/// Fetch a catalog entry's payload by id, or `None` if it doesn't exist or
/// has expired.
pub fn get_catalog(catalog_id: &str) -> Option<Value> {
    let key = catalog_id.trim();
    if key.is_empty() {
        return None;
    }
    let now = SystemTime::now();
    let mut guard = store().lock().expect("catalog store mutex poisoned");
    guard.cleanup_expired(now);
    guard.by_id.get(key).map(|entry| entry.payload.clone())
}

/// Drop every catalog entry belonging to `user_id`, returning the number of
/// entries removed.
pub fn invalidate_catalog(user_id: &str) -> usize {
    let normalized_user_id = user_id.trim();
    if normalized_user_id.is_empty() {
        return 0;
    }
    let mut guard = store().lock().expect("catalog store mutex poisoned");
    guard.cleanup_expired(SystemTime::now());
    let Some(ids) = guard.by_user.remove(normalized_user_id) else {
        return 0;
    };
    let mut removed = 0;
    for catalog_id in ids {
        if guard.by_id.remove(&catalog_id).is_some() {
            removed += 1;
        }
    }
    removed
}

/// The default TTL applied when a caller doesn't specify one.
pub fn default_ttl() -> Duration {
    DEFAULT_TTL
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn unique_user(label: &str) -> String {
        format!("catalog-test-{label}-{}", COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[test]
    fn rejects_blank_user_id() {
        let err = get_or_create_catalog_id("   ", &json!({"a": 1}), DEFAULT_TTL).unwrap_err();
        assert!(matches!(err, CatalogError::UserIdRequired));
    }

    #[test]
    fn rejects_non_object_payload() {
        let err = get_or_create_catalog_id("u1", &json!([1, 2]), DEFAULT_TTL).unwrap_err();
        assert!(matches!(err, CatalogError::PayloadMustBeObject));
    }

    #[test]
    fn identical_payload_same_user_collapses_to_same_id() {
        let user = unique_user("collapse");
        let payload = json!({"b": 2, "a": 1});
        let reordered = json!({"a": 1, "b": 2});
        let (id_one, created_one) = get_or_create_catalog_id(&user, &payload, DEFAULT_TTL).unwrap();
        let (id_two, created_two) = get_or_create_catalog_id(&user, &reordered, DEFAULT_TTL).unwrap();
        assert_eq!(id_one, id_two);
        assert!(created_one);
        assert!(!created_two);
    }

    #[test]
    fn roundtrips_through_get_catalog() {
        let user = unique_user("roundtrip");
        let payload = json!({"items": [1, 2, 3]});
        let (catalog_id, _) = get_or_create_catalog_id(&user, &payload, DEFAULT_TTL).unwrap();
        assert_eq!(get_catalog(&catalog_id), Some(payload));
    }

    #[test]
    fn unknown_catalog_id_returns_none() {
        assert_eq!(get_catalog("catalog_does_not_exist"), None);
    }

    #[test]
    fn invalidate_removes_all_entries_for_user() {
        let user = unique_user("invalidate");
        let (catalog_id, _) = get_or_create_catalog_id(&user, &json!({"x": 1}), DEFAULT_TTL).unwrap();
        assert_eq!(invalidate_catalog(&user), 1);
        assert_eq!(get_catalog(&catalog_id), None);
        assert_eq!(invalidate_catalog(&user), 0);
    }

    #[test]
    fn expired_entry_is_swept_on_next_access() {
        let user = unique_user("expire");
        let (catalog_id, _) = get_or_create_catalog_id(&user, &json!({"x": 1}), MIN_TTL).unwrap();
        {
            let mut guard = store().lock().unwrap();
            if let Some(entry) = guard.by_id.get_mut(&catalog_id) {
                entry.expires_at = SystemTime::now() - Duration::from_secs(1);
            }
        }
        assert_eq!(get_catalog(&catalog_id), None);
    }
}
