//! The `PendingActionStore` protocol and its in-memory backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::action::PendingAction;
use crate::error::PendingStoreError;

/// How a user's pending action is persisted across turns.
///
/// Deliberately minimal — get/set/clear, mirroring the slot-collection
/// state machine's only three operations on this store.
#[async_trait]
pub trait PendingActionStore: Send + Sync {
    /// Fetch the user's pending action, or `None` if there isn't one or it
    /// has expired (an expired entry is also removed as a side effect).
    async fn get(&self, user_id: &str) -> Result<Option<PendingAction>, PendingStoreError>;

    /// Store `action`, replacing any existing pending action for its user.
    async fn set(&self, action: PendingAction) -> Result<(), PendingStoreError>;

    /// Remove the user's pending action, if any. No-op if there isn't one.
    async fn clear(&self, user_id: &str) -> Result<(), PendingStoreError>;
}

fn normalize_user_id(user_id: &str) -> Result<String, PendingStoreError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(PendingStoreError::UserIdRequired);
    }
    Ok(trimmed.to_string())
}

/// In-memory pending-action store backed by a `HashMap` behind a `RwLock`.
///
/// Ephemeral: entries are lost on process restart. Suitable for testing and
/// as the fallback tier of [`crate::AutoPendingStore`].
#[derive(Debug, Default)]
pub struct MemoryPendingStore {
    data: RwLock<HashMap<String, PendingAction>>,
}

impl MemoryPendingStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PendingActionStore for MemoryPendingStore {
    async fn get(&self, user_id: &str) -> Result<Option<PendingAction>, PendingStoreError> {
        let key = normalize_user_id(user_id)?;
        let item = self.data.read().await.get(&key).cloned();
        match item {
            Some(action) if action.is_expired() => {
                self.data.write().await.remove(&key);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn set(&self, action: PendingAction) -> Result<(), PendingStoreError> {
        let key = normalize_user_id(&action.user_id)?;
        self.data.write().await.insert(key, action);
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<(), PendingStoreError> {
        let key = normalize_user_id(user_id)?;
        self.data.write().await.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::default_ttl;
    use conduit_plan::{AgentPlan, PlanSource};

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
    async fn set_then_get_roundtrips() {
        let store = MemoryPendingStore::new();
        let action = PendingAction::new(
            "u1",
            "notion_create_page",
            "create",
            "task-1",
            sample_plan(),
            PlanSource::Rule,
            HashMap::new(),
            vec!["title".to_string()],
            default_ttl(),
        );
        store.set(action).await.unwrap();
        let fetched = store.get("u1").await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().missing_slots, vec!["title".to_string()]);
    }

    #[tokio::test]
    async fn clear_removes_entry() {
        let store = MemoryPendingStore::new();
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

    #[tokio::test]
    async fn blank_user_id_is_rejected() {
        let store = MemoryPendingStore::new();
        assert!(matches!(store.get("  ").await, Err(PendingStoreError::UserIdRequired)));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_none() {
        let store = MemoryPendingStore::new();
        let mut action = PendingAction::new(
            "u3",
            "intent",
            "action",
            "task-3",
            sample_plan(),
            PlanSource::Rule,
            HashMap::new(),
            vec![],
            default_ttl(),
        );
        action.expires_at_unix = 0.0;
        store.set(action).await.unwrap();
        assert!(store.get("u3").await.unwrap().is_none());
    }
}
