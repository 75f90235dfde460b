//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Window for the subscription frame to arrive after accept
    pub registration_timeout: Duration,

    /// Attempts against the registration authority per connection
    pub register_attempts: u32,

    /// Backoff between registration attempts (linear)
    pub register_backoff: Duration,

    /// Per-connection dispatch queue capacity; a subscriber that falls
    /// this many payloads behind is treated as failed
    pub send_queue_capacity: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            max_connections: 0, // Unlimited
            registration_timeout: Duration::from_secs(10),
            register_attempts: 3,
            register_backoff: Duration::from_millis(500),
            send_queue_capacity: 256,
            tcp_nodelay: true, // Important for low latency
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the registration window
    pub fn registration_timeout(mut self, timeout: Duration) -> Self {
        self.registration_timeout = timeout;
        self
    }

    /// Set registration attempts (minimum 1)
    pub fn register_attempts(mut self, attempts: u32) -> Self {
        self.register_attempts = attempts.max(1);
        self
    }

    /// Set the backoff between registration attempts
    pub fn register_backoff(mut self, backoff: Duration) -> Self {
        self.register_backoff = backoff;
        self
    }

    /// Set the per-connection dispatch queue capacity (minimum 1)
    pub fn send_queue_capacity(mut self, capacity: usize) -> Self {
        self.send_queue_capacity = capacity.max(1);
        self
    }
}
