//! # conduit-rollout
//!
//! One deterministic bucketing controller feeding every staged rollout
//! (`autonomous_execution`, `skill_v2`, `atomic_overhaul`, …) instead of a
//! bespoke `decide_*_rollout` script per feature.

#![deny(missing_docs)]

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One feature's rollout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloutSettings {
    /// Master switch; `false` always yields `disabled`.
    pub enabled: bool,
    /// Whether excluded-from-rollout traffic still runs the feature
    /// without being served its result ("dark launch").
    pub shadow_mode: bool,
    /// User ids always served regardless of `traffic_percent`, or
    /// shadow-excluded when absent from this set.
    #[serde(default)]
    pub allowlist: Option<HashSet<String>>,
    /// Percentage (0..=100) of the deterministic per-user bucket space
    /// that gets served.
    pub traffic_percent: u8,
    /// Whether callers may still fall back to the pre-rollout code path
    /// when this feature misses. `false` at `traffic_percent == 0` forces
    /// a serve, since there is nothing left to fall back to.
    pub legacy_fallback_enabled: bool,
}

/// The outcome of a rollout decision, plus the stable reason code it was
/// made for (used verbatim in `command_logs.detail`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutDecision {
    /// Whether the caller should serve this feature's result to the user.
    pub serve: bool,
    /// Whether the caller should still execute the feature, without
    /// surfacing its result, for comparison logging.
    pub shadow: bool,
    /// Stable reason code.
    pub reason: String,
}

/// Stable per-user bucket in `0..100`: the low 16 bits of
/// `SHA-256(user_id + feature_name)`, reduced mod 100.
pub fn rollout_bucket(user_id: &str, feature_name: &str) -> u8 {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(feature_name.as_bytes());
    let digest = hasher.finalize();
    let low16 = u16::from_be_bytes([digest[digest.len() - 2], digest[digest.len() - 1]]);
    (low16 % 100) as u8
}

/// Decide whether `user_id` should see `feature_name` under `settings`.
pub fn decide_rollout(user_id: &str, feature_name: &str, settings: &RolloutSettings) -> RolloutDecision {
    if !settings.enabled {
        return RolloutDecision { serve: false, shadow: false, reason: "disabled".to_string() };
    }

    if let Some(allowlist) = &settings.allowlist {
        if allowlist.contains(user_id) {
            return RolloutDecision { serve: true, shadow: false, reason: "allowlist".to_string() };
        }
        if settings.shadow_mode {
            return RolloutDecision { serve: false, shadow: true, reason: "allowlist_excluded_shadow".to_string() };
        }
    }

    let percent = settings.traffic_percent.min(100);
    let bucket = rollout_bucket(user_id, feature_name);
    if (bucket as u16) < percent as u16 {
        return RolloutDecision { serve: true, shadow: false, reason: format!("rollout_{percent}") };
    }

    if percent == 0 && !settings.legacy_fallback_enabled {
        return RolloutDecision { serve: true, shadow: false, reason: "forced_no_legacy_rollout_0_miss".to_string() };
    }

    if settings.shadow_mode {
        RolloutDecision { serve: false, shadow: true, reason: "shadow".to_string() }
    } else {
        RolloutDecision { serve: false, shadow: false, reason: "miss".to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(traffic_percent: u8) -> RolloutSettings {
        RolloutSettings {
            enabled: true,
            shadow_mode: false,
            allowlist: None,
            traffic_percent,
            legacy_fallback_enabled: true,
        }
    }

    #[test]
    fn disabled_feature_never_serves() {
        let mut s = settings(100);
        s.enabled = false;
        let decision = decide_rollout("user-1", "skill_v2", &s);
        assert_eq!(decision, RolloutDecision { serve: false, shadow: false, reason: "disabled".to_string() });
    }

    #[test]
    fn full_rollout_always_serves() {
        let decision = decide_rollout("user-1", "skill_v2", &settings(100));
        assert!(decision.serve);
        assert_eq!(decision.reason, "rollout_100");
    }

    #[test]
    fn zero_percent_with_legacy_fallback_is_a_miss() {
        let decision = decide_rollout("user-1", "skill_v2", &settings(0));
        assert_eq!(decision, RolloutDecision { serve: false, shadow: false, reason: "miss".to_string() });
    }

    #[test]
    fn zero_percent_without_legacy_fallback_force_serves() {
        let mut s = settings(0);
        s.legacy_fallback_enabled = false;
        let decision = decide_rollout("user-1", "skill_v2", &s);
        assert_eq!(
            decision,
            RolloutDecision { serve: true, shadow: false, reason: "forced_no_legacy_rollout_0_miss".to_string() }
        );
    }

    #[test]
    fn allowlisted_user_always_served() {
        let mut s = settings(0);
        s.allowlist = Some(["user-1".to_string()].into_iter().collect());
        let decision = decide_rollout("user-1", "skill_v2", &s);
        assert_eq!(decision, RolloutDecision { serve: true, shadow: false, reason: "allowlist".to_string() });
    }

    #[test]
    fn excluded_user_in_shadow_mode_with_allowlist_is_shadowed() {
        let mut s = settings(0);
        s.shadow_mode = true;
        s.allowlist = Some(["someone-else".to_string()].into_iter().collect());
        let decision = decide_rollout("user-1", "skill_v2", &s);
        assert_eq!(decision, RolloutDecision { serve: false, shadow: true, reason: "allowlist_excluded_shadow".to_string() });
    }

    #[test]
    fn bucketing_is_stable_for_the_same_user_and_feature() {
        let a = rollout_bucket("user-42", "atomic_overhaul");
        let b = rollout_bucket("user-42", "atomic_overhaul");
        assert_eq!(a, b);
        assert!(a < 100);
    }

    #[test]
    fn miss_outside_rollout_without_shadow_mode() {
        let s = settings(0);
        let decision = decide_rollout("user-1", "skill_v2", &s);
        assert!(!decision.serve && !decision.shadow);
    }

    #[test]
    fn shadow_outside_rollout_with_shadow_mode_enabled() {
        let mut s = settings(0);
        s.shadow_mode = true;
        s.legacy_fallback_enabled = true;
        let decision = decide_rollout("user-1", "skill_v2", &s);
        assert_eq!(decision, RolloutDecision { serve: false, shadow: true, reason: "shadow".to_string() });
    }
}
