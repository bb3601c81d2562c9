//! `auto` mode: prefer the durable backend, degrade gracefully to memory.

use async_trait::async_trait;

use crate::action::PendingAction;
use crate::error::PendingStoreError;
use crate::fs::FsPendingStore;
use crate::store::{MemoryPendingStore, PendingActionStore};

/// Tries [`FsPendingStore`] first; if a write to it fails, falls back to an
/// in-memory store for that entry rather than surfacing the error. Reads
/// check the filesystem tier first, then the memory fallback tier.
pub struct AutoPendingStore {
    durable: FsPendingStore,
    fallback: MemoryPendingStore,
}

impl AutoPendingStore {
    /// Build an auto store with `root` as the durable filesystem tier.
    pub fn new(root: &std::path::Path) -> Self {
        Self {
            durable: FsPendingStore::new(root),
            fallback: MemoryPendingStore::new(),
        }
    }
}

#[async_trait]
impl PendingActionStore for AutoPendingStore {
    async fn get(&self, user_id: &str) -> Result<Option<PendingAction>, PendingStoreError> {
        if let Some(action) = self.durable.get(user_id).await? {
            return Ok(Some(action));
        }
        self.fallback.get(user_id).await
    }

    async fn set(&self, action: PendingAction) -> Result<(), PendingStoreError> {
        match self.durable.set(action.clone()).await {
            Ok(()) => Ok(()),
            Err(_) => self.fallback.set(action).await,
        }
    }

    async fn clear(&self, user_id: &str) -> Result<(), PendingStoreError> {
        self.durable.clear(user_id).await?;
        self.fallback.clear(user_id).await
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
    async fn writes_land_on_durable_tier_when_writable() {
        let dir = tempfile::tempdir().unwrap();
        let store = AutoPendingStore::new(dir.path());
        let action = PendingAction::new(
            "u1",
            "intent",
            "action",
            "task-1",
            sample_plan(),
            PlanSource::Rule,
            HashMap::new(),
            vec![],
            default_ttl(),
        );
        store.set(action).await.unwrap();
        assert!(store.durable.get("u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn falls_back_to_memory_when_durable_root_is_unwritable() {
        let store = AutoPendingStore::new(std::path::Path::new("/dev/null/not-a-real-dir"));
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
        let fetched = store.get("u2").await.unwrap();
        assert!(fetched.is_some());
    }
}
