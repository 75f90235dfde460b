//! Address-filtered WebSocket broadcast server
//!
//! Bridges an upstream partitioned event stream to a dynamic population of
//! long-lived WebSocket subscribers. Each subscriber registers with an
//! external authority to obtain a broadcaster identity, then receives
//! exactly the upstream messages whose recipient key names that identity.
//!
//! # Architecture
//!
//! ```text
//!  upstream broker ──► mpsc ingress ──► Router ──┐
//!                                                │ match_all(key)
//!                                 ConnectionRegistry
//!                                                │ dispatch
//!                     ┌──────────────────────────┼─────────────┐
//!                     ▼                          ▼             ▼
//!               [Connection]               [Connection]   [Connection]
//!               relay loop ──► WebSocket subscriber ...
//! ```
//!
//! The registry is the only state shared between the router task and the
//! connection tasks. The router never waits on a subscriber: payloads are
//! handed to bounded per-connection queues, and a queue that is full or
//! gone fails only that connection.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tokio::sync::mpsc;
//! use wscast_rs::{
//!     HttpRegistrar, RegistrarConfig, Router, ServerConfig, UpstreamMessage, WsServer,
//! };
//!
//! #[tokio::main]
//! async fn main() -> wscast_rs::Result<()> {
//!     let registrar =
//!         HttpRegistrar::new(RegistrarConfig::with_base_url("http://localhost:8889"))?;
//!     let server = WsServer::new(ServerConfig::default(), registrar);
//!
//!     // The router consumes whatever feeds the ingress channel, e.g. a
//!     // broker consumer task.
//!     let (ingress_tx, ingress_rx) = mpsc::channel::<UpstreamMessage>(1024);
//!     let (_shutdown_tx, shutdown_rx) = mpsc::channel(1);
//!     let router = Router::new(Arc::clone(server.registry()));
//!     tokio::spawn(async move { router.run(ingress_rx, shutdown_rx).await });
//!
//!     # drop(ingress_tx);
//!     server.run().await
//! }
//! ```

pub mod error;
pub mod protocol;
pub mod registration;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use protocol::{BroadcasterId, RegistrationAck, Subscription, UpstreamMessage};
pub use registration::{HttpRegistrar, Registrar, RegistrarConfig};
pub use registry::ConnectionRegistry;
pub use router::Router;
pub use server::{ServerConfig, WsServer};
