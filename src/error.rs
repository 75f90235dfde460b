//! Crate-level error type
//!
//! Component-specific errors live next to their components
//! ([`crate::registry::RegistryError`], [`crate::registration::RegistrationError`],
//! [`crate::protocol::KeyError`]); this aggregate covers the connection and
//! server paths where transport, protocol, and registration failures meet.

use thiserror::Error;

/// Error type for server and connection operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on the listener or a socket
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket protocol or transport error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Undecodable JSON payload (subscription or acknowledgment)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Registration with the authority failed
    #[error(transparent)]
    Registration(#[from] crate::registration::RegistrationError),

    /// Registry rejected the connection
    #[error(transparent)]
    Registry(#[from] crate::registry::RegistryError),

    /// No subscription frame arrived within the registration window
    #[error("no subscription received within the registration window")]
    SubscriptionTimeout,

    /// The peer went away before registration completed
    #[error("connection closed before registration completed")]
    ClosedBeforeRegistration,
}

/// Result type for server and connection operations
pub type Result<T> = std::result::Result<T, Error>;
