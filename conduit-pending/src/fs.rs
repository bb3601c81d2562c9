//! Filesystem-backed `PendingActionStore`.
//!
//! One JSON file per user under a root directory. Provides persistence
//! across process restarts without a database.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::action::PendingAction;
use crate::error::PendingStoreError;
use crate::store::PendingActionStore;

/// Filesystem-backed pending-action store.
///
/// Directory layout: `root/<url-encoded-user-id>.json`.
pub struct FsPendingStore {
    root: PathBuf,
}

impl FsPendingStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        self.root.join(key_to_filename(user_id))
    }
}

fn key_to_filename(key: &str) -> String {
    let mut encoded = String::new();
    for ch in key.chars() {
        match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => encoded.push(ch),
            _ => {
                for byte in ch.to_string().as_bytes() {
                    encoded.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }
    format!("{encoded}.json")
}

fn normalize_user_id(user_id: &str) -> Result<String, PendingStoreError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(PendingStoreError::UserIdRequired);
    }
    Ok(trimmed.to_string())
}

#[async_trait]
impl PendingActionStore for FsPendingStore {
    async fn get(&self, user_id: &str) -> Result<Option<PendingAction>, PendingStoreError> {
        let user_id = normalize_user_id(user_id)?;
        let path = self.path_for(&user_id);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PendingStoreError::WriteFailed(e.to_string())),
        };
        let action: PendingAction = serde_json::from_str(&contents).map_err(|e| PendingStoreError::Serialization(e.to_string()))?;
        if action.is_expired() {
            let _ = tokio::fs::remove_file(&path).await;
            return Ok(None);
        }
        Ok(Some(action))
    }

    async fn set(&self, action: PendingAction) -> Result<(), PendingStoreError> {
        let user_id = normalize_user_id(&action.user_id)?;
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| PendingStoreError::WriteFailed(e.to_string()))?;
        let path = self.path_for(&user_id);
        let contents = serde_json::to_string_pretty(&action).map_err(|e| PendingStoreError::Serialization(e.to_string()))?;
        tokio::fs::write(&path, contents).await.map_err(|e| PendingStoreError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<(), PendingStoreError> {
        let user_id = normalize_user_id(user_id)?;
        let path = self.path_for(&user_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PendingStoreError::WriteFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::default_ttl;
    use conduit_plan::{AgentPlan, PlanSource};
    use std::collections::HashMap;

    fn sample_plan() -> AgentPlan {
        AgentPlan {
            user_text: "test".to_string(),
            requirements: vec![],
            target_services: vec![],
            selected_tools: vec![],
            workflow_steps: vec![],
            tasks: vec![],
            notes: vec![],
        }
    }

    #[tokio::test]
    async fn write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPendingStore::new(dir.path());
        let action = PendingAction::new(
            "u1",
            "intent",
            "action",
            "task-1",
            sample_plan(),
            PlanSource::Rule,
            HashMap::new(),
            vec!["title".to_string()],
            default_ttl(),
        );
        store.set(action).await.unwrap();
        let fetched = store.get("u1").await.unwrap().unwrap();
        assert_eq!(fetched.missing_slots, vec!["title".to_string()]);
    }

    #[tokio::test]
    async fn read_missing_user_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPendingStore::new(dir.path());
        assert!(store.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPendingStore::new(dir.path());
        let action = PendingAction::new(
            "u2",
            "intent",
            "action",
            "task-2",
            sample_plan(),
            PlanSource::Rule,
            HashMap::new(),
            vec![],
            default_ttl(),
        );
        store.set(action).await.unwrap();
        store.clear("u2").await.unwrap();
        assert!(store.get("u2").await.unwrap().is_none());
    }
}
