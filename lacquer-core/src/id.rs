//! Typed ID wrappers for run, step, and agent identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers prevent mixing up agent IDs, session IDs, etc.
/// These are just strings underneath — no UUID enforcement, no format
/// requirement. The protocol doesn't care what your IDs look like.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to String.
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

typed_id!(
    RunId,
    "Globally unique identifier assigned to one execution of a workflow."
);
typed_id!(StepId, "Unique identifier for a step within a workflow.");
typed_id!(AgentId, "Name of an agent configuration within a workflow.");

impl RunId {
    /// Generate a fresh, globally-unique run id: a random 64-bit suffix,
    /// falling back to wall-clock time mixed with the process id if the
    /// platform's entropy source is ever unavailable.
    pub fn generate() -> Self {
        let suffix = Self::random_suffix().unwrap_or_else(Self::fallback_suffix);
        Self(format!("run-{suffix:016x}"))
    }

    fn random_suffix() -> Option<u64> {
        Some(rand::random::<u64>())
    }

    fn fallback_suffix() -> u64 {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        let pid = std::process::id() as u64;
        nanos ^ pid.rotate_left(32)
    }
}
