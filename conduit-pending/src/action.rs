//! The pending action record itself.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use conduit_plan::{AgentPlan, PlanSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MIN_TTL: Duration = Duration::from_secs(60);
const DEFAULT_TTL: Duration = Duration::from_secs(900);

/// A plan awaiting the slots the user still needs to supply before it can
/// run, keyed by user id in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    /// The user this pending action belongs to.
    pub user_id: String,
    /// The classified intent that produced this plan.
    pub intent: String,
    /// The action name within that intent (e.g. `notion_create_page`).
    pub action: String,
    /// Id correlating this pending action to its originating task.
    pub task_id: String,
    /// The plan waiting to resume once slots are filled.
    pub plan: AgentPlan,
    /// Which planner produced `plan`.
    pub plan_source: PlanSource,
    /// Slot values collected so far.
    #[serde(default)]
    pub collected_slots: HashMap<String, Value>,
    /// Slot names still required before the plan can execute.
    #[serde(default)]
    pub missing_slots: Vec<String>,
    /// Unix timestamp (seconds) after which this entry is considered gone.
    pub expires_at_unix: f64,
}

impl PendingAction {
    /// Build a new pending action expiring `ttl` from now, floored to
    /// [`MIN_TTL`].
    pub fn new(
        user_id: impl Into<String>,
        intent: impl Into<String>,
        action: impl Into<String>,
        task_id: impl Into<String>,
        plan: AgentPlan,
        plan_source: PlanSource,
        collected_slots: HashMap<String, Value>,
        missing_slots: Vec<String>,
        ttl: Duration,
    ) -> Self {
        let effective_ttl = ttl.max(MIN_TTL);
        let expires_at = SystemTime::now() + effective_ttl;
        let expires_at_unix = expires_at
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        Self {
            user_id: user_id.into(),
            intent: intent.into(),
            action: action.into(),
            task_id: task_id.into(),
            plan,
            plan_source,
            collected_slots,
            missing_slots,
            expires_at_unix,
        }
    }

    /// Whether this entry's TTL has elapsed as of `now`.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        let now_unix = now.duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default().as_secs_f64();
        self.expires_at_unix < now_unix
    }

    /// Whether this entry's TTL has elapsed as of now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }
}

/// The default pending-action TTL, applied when a caller doesn't specify
/// one.
pub fn default_ttl() -> Duration {
    DEFAULT_TTL
}
