//! Connection registry implementation
//!
//! The central registry that tracks all active connections and answers the
//! router's membership lookups.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::protocol::BroadcasterId;

use super::entry::ConnectionHandle;
use super::error::RegistryError;

/// Central registry mapping broadcaster identity to live connection handle
///
/// Thread-safe via `RwLock`. The router's per-message lookups take the read
/// lock; registration and removal take the write lock. Every operation is
/// individually atomic, so no caller observes a half-updated state.
pub struct ConnectionRegistry {
    /// Map of identity to connection handle
    connections: RwLock<HashMap<BroadcasterId, ConnectionHandle>>,
}

impl ConnectionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection under its assigned identity
    ///
    /// Rejects an identity that is already present: the authority issuing a
    /// duplicate is a correctness violation and must not silently evict the
    /// existing connection.
    pub async fn register(&self, handle: ConnectionHandle) -> Result<(), RegistryError> {
        let mut connections = self.connections.write().await;

        if connections.contains_key(handle.identity()) {
            return Err(RegistryError::DuplicateIdentity(handle.identity().clone()));
        }

        tracing::info!(
            identity = %handle.identity(),
            session_id = handle.session_id(),
            connections = connections.len() + 1,
            "Connection registered"
        );

        connections.insert(handle.identity().clone(), handle);
        Ok(())
    }

    /// Remove a connection by identity
    ///
    /// Idempotent; a no-op if the identity is absent. Dropping the stored
    /// handle closes the connection's dispatch queue, so its relay loop
    /// observes the closure and shuts down. A dispatch already holding a
    /// clone of the handle may still attempt delivery and fail; no new
    /// dispatch can select the connection once this returns.
    pub async fn deregister(&self, identity: &BroadcasterId) {
        let mut connections = self.connections.write().await;

        if let Some(handle) = connections.remove(identity) {
            tracing::info!(
                identity = %identity,
                session_id = handle.session_id(),
                connections = connections.len(),
                "Connection deregistered"
            );
        }
    }

    /// Look up every registered connection named by the address list
    ///
    /// Results follow address order with duplicates collapsed, so repeated
    /// calls against the same registry state are deterministic. Cost is
    /// proportional to the number of addresses, not the connection count.
    pub async fn match_all(&self, addresses: &[BroadcasterId]) -> Vec<ConnectionHandle> {
        let connections = self.connections.read().await;

        let mut seen = HashSet::with_capacity(addresses.len());
        let mut matched = Vec::new();

        for address in addresses {
            if !seen.insert(address) {
                continue;
            }
            if let Some(handle) = connections.get(address) {
                matched.push(handle.clone());
            }
        }

        matched
    }

    /// Check whether an identity is currently registered
    pub async fn contains(&self, identity: &BroadcasterId) -> bool {
        self.connections.read().await.contains_key(identity)
    }

    /// Get all currently registered identities
    pub async fn identities(&self) -> Vec<BroadcasterId> {
        self.connections.read().await.keys().cloned().collect()
    }

    /// Get the number of registered connections
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Check whether the registry is empty
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Remove every connection, closing each dispatch queue
    ///
    /// Used at process shutdown so every relay loop ends before shared
    /// resources are released.
    pub async fn drain_all(&self) {
        let mut connections = self.connections.write().await;
        let drained = connections.len();
        connections.clear();

        if drained > 0 {
            tracing::info!(connections = drained, "Registry drained");
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use tokio::sync::mpsc;

    use super::*;

    fn handle(session_id: u64, identity: &str) -> (ConnectionHandle, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(8);
        (
            ConnectionHandle::new(session_id, BroadcasterId::new(identity), tx),
            rx,
        )
    }

    #[tokio::test]
    async fn test_register_and_match() {
        let registry = ConnectionRegistry::new();
        let (h1, _rx1) = handle(1, "bc-1");
        registry.register(h1).await.unwrap();

        let matched = registry
            .match_all(&[BroadcasterId::new("bc-1"), BroadcasterId::new("bc-2")])
            .await;

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].identity().as_str(), "bc-1");
    }

    #[tokio::test]
    async fn test_register_duplicate_identity() {
        let registry = ConnectionRegistry::new();
        let (h1, _rx1) = handle(1, "bc-1");
        let (h2, _rx2) = handle(2, "bc-1");

        registry.register(h1).await.unwrap();
        let result = registry.register(h2).await;

        assert!(matches!(result, Err(RegistryError::DuplicateIdentity(_))));

        // The original registration is untouched
        let matched = registry.match_all(&[BroadcasterId::new("bc-1")]).await;
        assert_eq!(matched[0].session_id(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registration() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (h1, _rx1) = handle(1, "bc-1");
        let (h2, _rx2) = handle(2, "bc-1");

        let r1 = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.register(h1).await })
        };
        let r2 = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.register(h2).await })
        };

        let outcomes = [r1.await.unwrap(), r2.await.unwrap()];
        let successes = outcomes.iter().filter(|r| r.is_ok()).count();
        let duplicates = outcomes
            .iter()
            .filter(|r| matches!(r, Err(RegistryError::DuplicateIdentity(_))))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(duplicates, 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_deregister_idempotent() {
        let registry = ConnectionRegistry::new();
        let (h1, _rx1) = handle(1, "bc-1");
        registry.register(h1).await.unwrap();

        registry.deregister(&BroadcasterId::new("bc-1")).await;
        assert!(registry.is_empty().await);

        // Second removal is a no-op
        registry.deregister(&BroadcasterId::new("bc-1")).await;
        registry.deregister(&BroadcasterId::new("never-seen")).await;
    }

    #[tokio::test]
    async fn test_deregistered_identity_unmatchable() {
        let registry = ConnectionRegistry::new();
        let (h1, _rx1) = handle(1, "bc-1");
        registry.register(h1).await.unwrap();
        registry.deregister(&BroadcasterId::new("bc-1")).await;

        // A later registration under a different identity must not make
        // the old identity matchable again
        let (h2, _rx2) = handle(2, "bc-2");
        registry.register(h2).await.unwrap();

        let matched = registry.match_all(&[BroadcasterId::new("bc-1")]).await;
        assert!(matched.is_empty());
    }

    #[tokio::test]
    async fn test_match_all_dedups_and_preserves_order() {
        let registry = ConnectionRegistry::new();
        let (h1, _rx1) = handle(1, "bc-1");
        let (h2, _rx2) = handle(2, "bc-2");
        registry.register(h1).await.unwrap();
        registry.register(h2).await.unwrap();

        let key = [
            BroadcasterId::new("bc-2"),
            BroadcasterId::new("bc-1"),
            BroadcasterId::new("bc-2"),
        ];
        let matched = registry.match_all(&key).await;

        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].identity().as_str(), "bc-2");
        assert_eq!(matched[1].identity().as_str(), "bc-1");
    }

    #[tokio::test]
    async fn test_deregister_closes_dispatch_queue() {
        let registry = ConnectionRegistry::new();
        let (h1, mut rx) = handle(1, "bc-1");
        registry.register(h1).await.unwrap();

        registry.deregister(&BroadcasterId::new("bc-1")).await;

        // The registry held the only sender; removal closes the queue
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_drain_all() {
        let registry = ConnectionRegistry::new();
        let (h1, mut rx1) = handle(1, "bc-1");
        let (h2, mut rx2) = handle(2, "bc-2");
        registry.register(h1).await.unwrap();
        registry.register(h2).await.unwrap();

        registry.drain_all().await;

        assert!(registry.is_empty().await);
        assert!(rx1.recv().await.is_none());
        assert!(rx2.recv().await.is_none());
    }
}
