//! Upstream-to-subscriber routing
//!
//! The router is the single consumer of the upstream ingress. For every
//! message it decodes the recipient addresses from the key, asks the
//! registry for the matching live connections, and hands the payload to
//! each one's dispatch queue without ever waiting on a subscriber.
//!
//! Failure isolation:
//!
//! - an undecodable key drops that message and nothing else; upstream
//!   consumption continues
//! - a full or closed dispatch queue fails only that connection, which is
//!   deregistered on the spot; remaining matches still receive the payload
//! - no message is queued or retried once its dispatch has been attempted

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::protocol::UpstreamMessage;
use crate::registry::ConnectionRegistry;
use crate::stats::{RouterStats, RouterStatsSnapshot};

/// Routes upstream messages to matching live connections
pub struct Router {
    /// Shared connection registry
    registry: Arc<ConnectionRegistry>,

    /// Routing counters
    stats: Arc<RouterStats>,
}

impl Router {
    /// Create a router over the shared registry
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            stats: Arc::new(RouterStats::new()),
        }
    }

    /// Take a snapshot of the routing counters
    pub fn stats(&self) -> RouterStatsSnapshot {
        self.stats.snapshot()
    }

    /// Consume the ingress until it closes or shutdown fires
    pub async fn run(
        &self,
        mut ingress: mpsc::Receiver<UpstreamMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Router running");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    tracing::info!("Router received shutdown signal");
                    break;
                }

                msg = ingress.recv() => {
                    match msg {
                        Some(msg) => self.route(&msg).await,
                        None => {
                            tracing::info!("Upstream ingress closed");
                            break;
                        }
                    }
                }
            }
        }

        let snapshot = self.stats.snapshot();
        tracing::info!(
            messages = snapshot.messages_received,
            deliveries = snapshot.deliveries,
            delivery_failures = snapshot.delivery_failures,
            "Router stopped"
        );
    }

    /// Route a single upstream message
    ///
    /// Once this returns the message is considered consumed, whatever the
    /// delivery outcomes were.
    pub async fn route(&self, msg: &UpstreamMessage) {
        use std::sync::atomic::Ordering;

        self.stats.messages_received.fetch_add(1, Ordering::Relaxed);

        let recipients = match msg.recipients() {
            Ok(recipients) => recipients,
            Err(e) => {
                self.stats.messages_malformed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, "Dropping message with undecodable key");
                return;
            }
        };

        if recipients.is_empty() {
            return;
        }

        let matched = self.registry.match_all(&recipients).await;
        if matched.is_empty() {
            tracing::trace!(recipients = recipients.len(), "No live connections matched");
            return;
        }

        for handle in matched {
            match handle.dispatch(msg.value.clone()) {
                Ok(()) => {
                    self.stats.deliveries.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    self.stats.delivery_failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        identity = %handle.identity(),
                        session_id = handle.session_id(),
                        error = %e,
                        "Delivery failed, closing connection"
                    );
                    // The connection can no longer keep up (or is already
                    // gone); removing it closes its queue and ends its
                    // relay loop. Other matches are unaffected.
                    self.registry.deregister(handle.identity()).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tokio::time::{timeout, Duration};

    use crate::protocol::BroadcasterId;
    use crate::registry::ConnectionHandle;

    use super::*;

    async fn register(
        registry: &ConnectionRegistry,
        session_id: u64,
        identity: &str,
        capacity: usize,
    ) -> mpsc::Receiver<Bytes> {
        let (tx, rx) = mpsc::channel(capacity);
        registry
            .register(ConnectionHandle::new(
                session_id,
                BroadcasterId::new(identity),
                tx,
            ))
            .await
            .unwrap();
        rx
    }

    #[tokio::test]
    async fn test_routes_only_to_addressed_connection() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut rx_a = register(&registry, 1, "bc-1", 8).await;
        let mut rx_b = register(&registry, 2, "bc-3", 8).await;

        let router = Router::new(Arc::clone(&registry));
        router
            .route(&UpstreamMessage::new(r#"["bc-1"]"#, "payload-a"))
            .await;

        assert_eq!(rx_a.recv().await.unwrap().as_ref(), b"payload-a");
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_shared_key_delivers_identical_payload() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut rx_a = register(&registry, 1, "bc-1", 8).await;
        let mut rx_b = register(&registry, 2, "bc-2", 8).await;

        let router = Router::new(Arc::clone(&registry));
        router
            .route(&UpstreamMessage::new(
                r#"["bc-1", "bc-2"]"#,
                r#"{"test_val":"bc-1"}"#,
            ))
            .await;

        let a = rx_a.recv().await.unwrap();
        let b = rx_b.recv().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_ref(), br#"{"test_val":"bc-1"}"#);
    }

    #[tokio::test]
    async fn test_malformed_key_dropped_without_stalling() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut rx = register(&registry, 1, "bc-1", 8).await;

        let router = Router::new(Arc::clone(&registry));
        router
            .route(&UpstreamMessage::new("not-a-json-array", "bad"))
            .await;
        router
            .route(&UpstreamMessage::new(r#"["bc-1"]"#, "good"))
            .await;

        // The malformed message vanished; the next one still flows
        assert_eq!(rx.recv().await.unwrap().as_ref(), b"good");
        assert!(rx.try_recv().is_err());

        let stats = router.stats();
        assert_eq!(stats.messages_received, 2);
        assert_eq!(stats.messages_malformed, 1);
        assert_eq!(stats.deliveries, 1);
    }

    #[tokio::test]
    async fn test_broken_connection_isolated_and_evicted() {
        let registry = Arc::new(ConnectionRegistry::new());
        let rx_broken = register(&registry, 1, "bc-1", 8).await;
        let mut rx_ok = register(&registry, 2, "bc-2", 8).await;
        drop(rx_broken);

        let router = Router::new(Arc::clone(&registry));
        router
            .route(&UpstreamMessage::new(r#"["bc-1", "bc-2"]"#, "payload"))
            .await;

        // The healthy connection still received the message
        assert_eq!(rx_ok.recv().await.unwrap().as_ref(), b"payload");

        // The broken one was deregistered and is permanently unmatchable
        assert!(!registry.contains(&BroadcasterId::new("bc-1")).await);

        let stats = router.stats();
        assert_eq!(stats.deliveries, 1);
        assert_eq!(stats.delivery_failures, 1);
    }

    #[tokio::test]
    async fn test_full_queue_counts_as_failure() {
        let registry = Arc::new(ConnectionRegistry::new());
        // Capacity 1, pre-filled: the subscriber is not draining
        let mut rx_slow = register(&registry, 1, "bc-1", 1).await;
        let mut rx_ok = register(&registry, 2, "bc-2", 8).await;

        let router = Router::new(Arc::clone(&registry));
        router
            .route(&UpstreamMessage::new(r#"["bc-1"]"#, "fill"))
            .await;
        router
            .route(&UpstreamMessage::new(r#"["bc-1", "bc-2"]"#, "overflow"))
            .await;

        assert_eq!(rx_ok.recv().await.unwrap().as_ref(), b"overflow");
        assert!(!registry.contains(&BroadcasterId::new("bc-1")).await);

        // The slow subscriber keeps what was queued before eviction
        assert_eq!(rx_slow.recv().await.unwrap().as_ref(), b"fill");
        assert!(rx_slow.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_run_consumes_until_ingress_closes() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut rx = register(&registry, 1, "bc-1", 8).await;

        let router = Arc::new(Router::new(Arc::clone(&registry)));
        let (ingress_tx, ingress_rx) = mpsc::channel(16);
        let (_shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let run = {
            let router = Arc::clone(&router);
            tokio::spawn(async move { router.run(ingress_rx, shutdown_rx).await })
        };

        ingress_tx
            .send(UpstreamMessage::new(r#"["bc-1"]"#, "via-run"))
            .await
            .unwrap();

        let received = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert_eq!(received.unwrap().as_ref(), b"via-run");

        drop(ingress_tx);
        timeout(Duration::from_secs(1), run).await.unwrap().unwrap();
    }
}
