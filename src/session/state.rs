//! Session state machine
//!
//! Tracks the overall state of a push connection from accept to close.

use std::net::SocketAddr;
use std::time::Instant;

use crate::protocol::BroadcasterId;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Transport accepted, awaiting the subscription frame
    Connecting,
    /// Subscription received, registration with the authority in progress
    Registering,
    /// Registered and eligible for matching; relaying payloads
    Active,
    /// Session is closing; deregistration runs in this phase
    Closing,
    /// Session closed
    Closed,
}

/// Complete session state
#[derive(Debug)]
pub struct SessionState {
    /// Unique session ID
    pub id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Current phase
    pub phase: SessionPhase,

    /// Connection start time
    pub connected_at: Instant,

    /// Time when registration completed
    pub registered_at: Option<Instant>,

    /// Identity assigned by the registration authority (absent before
    /// registration completes, immutable afterwards)
    pub identity: Option<BroadcasterId>,

    /// Payload frames relayed to the subscriber
    pub frames_sent: u64,

    /// Payload bytes relayed to the subscriber
    pub bytes_sent: u64,
}

impl SessionState {
    /// Create a new session state
    pub fn new(id: u64, peer_addr: SocketAddr) -> Self {
        Self {
            id,
            peer_addr,
            phase: SessionPhase::Connecting,
            connected_at: Instant::now(),
            registered_at: None,
            identity: None,
            frames_sent: 0,
            bytes_sent: 0,
        }
    }

    /// Transition to the registering phase
    pub fn begin_registration(&mut self) {
        if self.phase == SessionPhase::Connecting {
            self.phase = SessionPhase::Registering;
        }
    }

    /// Complete registration and become eligible for matching
    pub fn activate(&mut self, identity: BroadcasterId) {
        if self.phase == SessionPhase::Registering {
            self.identity = Some(identity);
            self.registered_at = Some(Instant::now());
            self.phase = SessionPhase::Active;
        }
    }

    /// Start closing the session
    pub fn close(&mut self) {
        if self.phase != SessionPhase::Closed {
            self.phase = SessionPhase::Closing;
        }
    }

    /// Mark the session fully closed
    pub fn closed(&mut self) {
        self.phase = SessionPhase::Closed;
    }

    /// Check if the session is active
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    /// Record one relayed payload frame
    pub fn on_frame_sent(&mut self, size: usize) {
        self.frames_sent += 1;
        self.bytes_sent += size as u64;
    }

    /// Get session duration
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}
