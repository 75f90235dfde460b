//! Registry error types
//!
//! Error types for connection registry operations.

use thiserror::Error;

use crate::protocol::BroadcasterId;

/// Error type for registry operations
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The identity is already registered to a live connection
    ///
    /// The authority must never issue the same identity twice, so this is
    /// surfaced as a protocol violation rather than silently overwritten.
    #[error("identity already registered: {0}")]
    DuplicateIdentity(BroadcasterId),
}
