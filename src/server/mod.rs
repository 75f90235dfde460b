//! WebSocket push server
//!
//! The listener accepts subscriber connections and spawns one
//! [`Connection`] handler per socket; the handler carries the session from
//! subscription through registration into the relay state.

pub mod config;
pub mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use connection::Connection;
pub use listener::WsServer;
