//! Upstream message type and recipient-key decoding
//!
//! One upstream event consists of a key naming the recipients and an opaque
//! payload. The key is a JSON array of address strings; the payload bytes
//! are never inspected, only relayed.

use bytes::Bytes;
use thiserror::Error;

use super::identity::BroadcasterId;

/// Error decoding the recipient list from an upstream message key
#[derive(Debug, Error)]
pub enum KeyError {
    /// Key is not a JSON array of strings
    #[error("malformed recipient key: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One event from the upstream broker
///
/// Consumed exactly once by the router and not retained after dispatch.
/// `Bytes` keeps the payload reference-counted so a single message fans
/// out to any number of subscribers without copying.
#[derive(Debug, Clone)]
pub struct UpstreamMessage {
    /// Recipient addresses, encoded as a JSON array of strings
    pub key: Bytes,

    /// Opaque payload, relayed verbatim to each matched subscriber
    pub value: Bytes,
}

impl UpstreamMessage {
    /// Create a message from raw key and payload bytes
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Decode the recipient addresses from the key
    ///
    /// Returns every address named by the key, in key order. Duplicates
    /// are preserved here; the registry match is responsible for not
    /// delivering twice.
    pub fn recipients(&self) -> Result<Vec<BroadcasterId>, KeyError> {
        let addresses: Vec<String> = serde_json::from_slice(&self.key)?;
        Ok(addresses.into_iter().map(BroadcasterId::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipients_decode() {
        let msg = UpstreamMessage::new(r#"["bc-1", "bc-2"]"#, r#"{"test_val":"bc-1"}"#);
        let recipients = msg.recipients().unwrap();
        assert_eq!(
            recipients,
            vec![BroadcasterId::new("bc-1"), BroadcasterId::new("bc-2")]
        );
    }

    #[test]
    fn test_recipients_empty_key() {
        let msg = UpstreamMessage::new("[]", "payload");
        assert!(msg.recipients().unwrap().is_empty());
    }

    #[test]
    fn test_recipients_malformed_key() {
        let not_json = UpstreamMessage::new("bc-1,bc-2", "payload");
        assert!(matches!(not_json.recipients(), Err(KeyError::Malformed(_))));

        let wrong_shape = UpstreamMessage::new(r#"{"to": "bc-1"}"#, "payload");
        assert!(wrong_shape.recipients().is_err());
    }

    #[test]
    fn test_payload_untouched() {
        let msg = UpstreamMessage::new(r#"["bc-1"]"#, &b"\x00\x01\xff"[..]);
        assert_eq!(msg.value.as_ref(), b"\x00\x01\xff");
    }
}
