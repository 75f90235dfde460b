//! Registration wire format
//!
//! The first inbound frame of every connection is a subscription payload;
//! the first outbound frame on success is an acknowledgment carrying the
//! assigned broadcaster identity.

use serde::{Deserialize, Serialize};

use super::identity::BroadcasterId;

/// A watched address entry in the subscription payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedAddress {
    /// The "to" address of interest
    pub to_address: String,
}

/// Registration payload sent by a subscriber as its first frame
///
/// The watch list is forwarded opaquely to the registration authority;
/// routing itself only ever consults the identity the authority assigns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Connection type tag (e.g. "ws")
    pub connection_type: String,

    /// Delivery endpoint descriptor, used only for external registration
    pub endpoint: String,

    /// Watched addresses, subscriber-defined
    pub transaction_events: Vec<WatchedAddress>,
}

/// Acknowledgment frame sent back once registration succeeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationAck {
    /// The identity assigned by the registration authority
    pub broadcaster_id: BroadcasterId,
}

impl RegistrationAck {
    /// Create an acknowledgment for an assigned identity
    pub fn new(broadcaster_id: BroadcasterId) -> Self {
        Self { broadcaster_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subscription() {
        let raw = r#"
        {
            "connection_type": "ws",
            "endpoint": "wss://test",
            "transaction_events": [
                {
                    "to_address": "cx0000000000000000000000000000000000000000"
                }
            ]
        }
        "#;

        let sub: Subscription = serde_json::from_str(raw).unwrap();
        assert_eq!(sub.connection_type, "ws");
        assert_eq!(sub.endpoint, "wss://test");
        assert_eq!(sub.transaction_events.len(), 1);
        assert_eq!(
            sub.transaction_events[0].to_address,
            "cx0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_parse_subscription_missing_field() {
        let raw = r#"{"connection_type": "ws"}"#;
        assert!(serde_json::from_str::<Subscription>(raw).is_err());
    }

    #[test]
    fn test_ack_wire_shape() {
        let ack = RegistrationAck::new(BroadcasterId::new("bc-1"));
        let json = serde_json::to_string(&ack).unwrap();
        assert_eq!(json, r#"{"broadcaster_id":"bc-1"}"#);

        let parsed: RegistrationAck = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ack);
    }
}
