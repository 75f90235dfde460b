//! Statistics for the router and server
//!
//! Counters are atomics because they are bumped from the router task and
//! read from anywhere; snapshots give a consistent-enough view for logs
//! and health output.

use std::sync::atomic::{AtomicU64, Ordering};

/// Router-level counters
#[derive(Debug, Default)]
pub struct RouterStats {
    /// Upstream messages received
    pub messages_received: AtomicU64,
    /// Upstream messages dropped for an undecodable key
    pub messages_malformed: AtomicU64,
    /// Payloads handed to a connection's dispatch queue
    pub deliveries: AtomicU64,
    /// Dispatch attempts that failed (full or closed queue)
    pub delivery_failures: AtomicU64,
}

impl RouterStats {
    /// Create new stats counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a point-in-time snapshot
    pub fn snapshot(&self) -> RouterStatsSnapshot {
        RouterStatsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_malformed: self.messages_malformed.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`RouterStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStatsSnapshot {
    /// Upstream messages received
    pub messages_received: u64,
    /// Upstream messages dropped for an undecodable key
    pub messages_malformed: u64,
    /// Payloads handed to a connection's dispatch queue
    pub deliveries: u64,
    /// Dispatch attempts that failed
    pub delivery_failures: u64,
}

/// Server-wide counters
#[derive(Debug, Default)]
pub struct ServerStats {
    /// Total connections ever accepted
    pub total_connections: AtomicU64,
    /// Connections rejected at the limit
    pub rejected_connections: AtomicU64,
    /// Registrations that ended in failure
    pub failed_registrations: AtomicU64,
}

impl ServerStats {
    /// Create new stats counters
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_stats_snapshot() {
        let stats = RouterStats::new();

        stats.messages_received.fetch_add(3, Ordering::Relaxed);
        stats.deliveries.fetch_add(5, Ordering::Relaxed);
        stats.delivery_failures.fetch_add(1, Ordering::Relaxed);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.messages_received, 3);
        assert_eq!(snapshot.messages_malformed, 0);
        assert_eq!(snapshot.deliveries, 5);
        assert_eq!(snapshot.delivery_failures, 1);
    }

    #[test]
    fn test_server_stats_start_at_zero() {
        let stats = ServerStats::new();
        assert_eq!(stats.total_connections.load(Ordering::Relaxed), 0);
        assert_eq!(stats.rejected_connections.load(Ordering::Relaxed), 0);
        assert_eq!(stats.failed_registrations.load(Ordering::Relaxed), 0);
    }
}
