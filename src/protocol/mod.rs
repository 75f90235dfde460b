//! Wire protocol types
//!
//! The subscriber-facing protocol is deliberately small:
//!
//! - inbound first frame: a [`Subscription`] payload (JSON)
//! - outbound first frame: a [`RegistrationAck`] carrying the assigned
//!   [`BroadcasterId`] (JSON text frame)
//! - every subsequent outbound frame: the raw payload bytes of one matched
//!   [`UpstreamMessage`], one binary frame per message, no envelope
//!
//! Upstream messages arrive with a JSON-array key naming the recipients;
//! decoding that key is the only parsing the router performs.

pub mod identity;
pub mod message;
pub mod subscription;

pub use identity::BroadcasterId;
pub use message::{KeyError, UpstreamMessage};
pub use subscription::{RegistrationAck, Subscription, WatchedAddress};
