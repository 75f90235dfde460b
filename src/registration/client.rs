//! Registration authority client
//!
//! A connection hands its subscription payload to the authority exactly
//! once, before it becomes eligible for matching, and receives the
//! broadcaster identity it will be routed under.

use async_trait::async_trait;
use reqwest::Client;

use crate::protocol::{BroadcasterId, RegistrationAck, Subscription};

use super::config::RegistrarConfig;
use super::error::RegistrationError;

/// Obtains broadcaster identities for new subscribers
///
/// The trait is the seam between the connection handler and the external
/// authority; tests install a fake implementation instead of an HTTP
/// endpoint. Each call is a single attempt — bounded retry with backoff
/// belongs to the caller.
#[async_trait]
pub trait Registrar: Send + Sync + 'static {
    /// Register a subscriber and return its assigned identity
    async fn register(
        &self,
        subscription: &Subscription,
    ) -> Result<BroadcasterId, RegistrationError>;
}

/// HTTP client for the registration authority
///
/// Posts the subscription payload to `{base_url}/broadcaster/register` and
/// expects a JSON body carrying the assigned identity. The request timeout
/// guarantees an attempt never hangs.
pub struct HttpRegistrar {
    client: Client,
    config: RegistrarConfig,
}

impl HttpRegistrar {
    /// Create a client for the configured authority
    pub fn new(config: RegistrarConfig) -> Result<Self, RegistrationError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self { client, config })
    }

    /// Get the client configuration
    pub fn config(&self) -> &RegistrarConfig {
        &self.config
    }
}

#[async_trait]
impl Registrar for HttpRegistrar {
    async fn register(
        &self,
        subscription: &Subscription,
    ) -> Result<BroadcasterId, RegistrationError> {
        let url = format!("{}/broadcaster/register", self.config.base_url);

        let response = self.client.post(&url).json(subscription).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistrationError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let ack: RegistrationAck = serde_json::from_str(&body)?;

        tracing::debug!(identity = %ack.broadcaster_id, "Registration granted");

        Ok(ack.broadcaster_id)
    }
}
