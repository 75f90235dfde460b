//! Connection registry for address-filtered routing
//!
//! The registry tracks every active connection under its broadcaster
//! identity and answers the router's per-message membership lookups. It is
//! the only state shared between the router task and the connection tasks.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<ConnectionRegistry>
//!                  ┌──────────────────────────────┐
//!                  │ connections: HashMap<        │
//!                  │   BroadcasterId,             │
//!                  │   ConnectionHandle {         │
//!                  │     tx: mpsc::Sender<Bytes>, │
//!                  │   }                          │
//!                  │ >                            │
//!                  └──────────────┬───────────────┘
//!                                 │
//!          ┌──────────────────────┼──────────────────────┐
//!          │                      │                      │
//!          ▼                      ▼                      ▼
//!     [Router]             [Connection]            [Connection]
//!     match_all()          rx.recv()               rx.recv()
//!          │                      │                      │
//!          └──► handle.dispatch() ──► relay loop ──► WebSocket
//! ```
//!
//! # Zero-Copy Design
//!
//! Payloads travel as `bytes::Bytes`, so every matched subscriber shares
//! the same allocation; dispatch clones a reference count, not the data.

pub mod entry;
pub mod error;
pub mod store;

pub use entry::{ConnectionHandle, DispatchError};
pub use error::RegistryError;
pub use store::ConnectionRegistry;
