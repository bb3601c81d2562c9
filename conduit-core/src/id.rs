//! Typed ID wrappers for users, runs, tasks, and nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed IDs are plain strings underneath. No format is enforced here —
/// callers that need UUIDs or other shapes validate at their own boundary.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to `String`.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a chat-ingress user.");
typed_id!(RunId, "Unique identifier for one pipeline DAG execution.");
typed_id!(RequestId, "Unique identifier for one orchestrator call.");
typed_id!(TaskId, "Identifier of an `AgentTask` within a plan.");
typed_id!(NodeId, "Identifier of a node within a `PipelineDag`.");
