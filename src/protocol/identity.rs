//! Broadcaster identity type
//!
//! The opaque token issued by the registration authority. It is the sole
//! key used for registry lookup and message matching.

use serde::{Deserialize, Serialize};

/// Unique identity assigned to a subscriber by the registration authority
///
/// Opaque and immutable once assigned to a connection. Matching is exact
/// string equality against the elements of an upstream message key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BroadcasterId(String);

impl BroadcasterId {
    /// Create a new broadcaster identity
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// View the identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BroadcasterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BroadcasterId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for BroadcasterId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
