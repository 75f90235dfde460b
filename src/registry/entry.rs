//! Connection handle and dispatch queue
//!
//! This module defines the per-connection entry stored in the registry: a
//! non-owning handle through which the router pushes matched payloads. The
//! connection task itself holds the receiving half of the queue and owns
//! the socket.

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::protocol::BroadcasterId;

/// Error delivering a payload into a connection's dispatch queue
#[derive(Debug, Clone, Copy, Error)]
pub enum DispatchError {
    /// The queue is full; the subscriber is not draining fast enough
    #[error("dispatch queue full")]
    QueueFull,

    /// The connection has shut down and dropped its queue
    #[error("connection closed")]
    Closed,
}

/// Handle to one active connection, as stored in the registry
///
/// Cheap to clone: the identity is shared-string sized and the sender is a
/// reference-counted channel handle. The registry keeps the only long-lived
/// clone; dropping it (on deregistration) closes the queue and ends the
/// owning connection's relay loop.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    /// Session ID of the owning connection
    session_id: u64,

    /// Identity assigned by the registration authority
    identity: BroadcasterId,

    /// Bounded queue into the connection's relay loop
    tx: mpsc::Sender<Bytes>,
}

impl ConnectionHandle {
    /// Create a handle for a registered connection
    pub fn new(session_id: u64, identity: BroadcasterId, tx: mpsc::Sender<Bytes>) -> Self {
        Self {
            session_id,
            identity,
            tx,
        }
    }

    /// Session ID of the owning connection
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Identity this handle is registered under
    pub fn identity(&self) -> &BroadcasterId {
        &self.identity
    }

    /// Queue a payload for delivery without blocking
    ///
    /// A full queue is a delivery failure, not a wait: the router must
    /// never be held up by one slow subscriber.
    pub fn dispatch(&self, payload: Bytes) -> Result<(), DispatchError> {
        self.tx.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DispatchError::Closed,
        })
    }
}
