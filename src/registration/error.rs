//! Registration error types

use thiserror::Error;

/// Error obtaining a broadcaster identity from the registration authority
///
/// Every variant is terminal for the attempt; retry policy belongs to the
/// caller.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Transport-level failure reaching the authority (includes timeout)
    #[error("registration request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The authority answered with a non-success status
    #[error("registration rejected by authority (status {status})")]
    Rejected {
        /// HTTP status code returned by the authority
        status: u16,
    },

    /// The authority's response body did not contain a broadcaster identity
    #[error("malformed registration response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}
