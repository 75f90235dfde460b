//! Registration client configuration

use std::time::Duration;

/// Configuration for the HTTP registration client
///
/// The authority's base URL is explicit constructor state, never a
/// process-wide global, so the client can be built against a fake
/// authority in tests.
#[derive(Debug, Clone)]
pub struct RegistrarConfig {
    /// Base URL of the registration authority (e.g. "http://localhost:8889")
    pub base_url: String,

    /// Per-attempt request timeout; the client never hangs past this
    pub request_timeout: Duration,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8889".to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl RegistrarConfig {
    /// Create a config for the given authority base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the per-attempt request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
