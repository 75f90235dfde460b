//! Simple push relay example
//!
//! Run with: cargo run --example relay_server [BIND_ADDR] [AUTHORITY_URL]
//!
//! Examples:
//!   cargo run --example relay_server                          # 0.0.0.0:8080, authority on localhost:8889
//!   cargo run --example relay_server localhost:9000
//!   cargo run --example relay_server 0.0.0.0:8080 http://auth.internal:8889
//!
//! ## Subscribing
//!
//! Connect a WebSocket client to ws://localhost:8080/ and send:
//!
//! ```json
//! {
//!     "connection_type": "ws",
//!     "endpoint": "wss://example",
//!     "transaction_events": [{"to_address": "cx00"}]
//! }
//! ```
//!
//! The first reply is `{"broadcaster_id": "..."}`; every later frame is
//! one routed payload.
//!
//! ## Upstream
//!
//! Without a broker attached, this demo synthesizes traffic: every two
//! seconds it sends a heartbeat payload addressed to every registered
//! identity, exercising the full match-and-dispatch path.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use wscast_rs::{
    ConnectionRegistry, HttpRegistrar, RegistrarConfig, Router, ServerConfig, UpstreamMessage,
    WsServer,
};

/// Parse bind address from command line argument.
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:8080
/// - "localhost:9000" -> 127.0.0.1:9000
/// - "0.0.0.0:8080" -> 0.0.0.0:8080
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 8080;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: relay_server [BIND_ADDR] [AUTHORITY_URL]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR      Address to bind to (default: 0.0.0.0:8080)");
    eprintln!("  AUTHORITY_URL  Registration authority (default: http://localhost:8889)");
}

/// Periodically address a heartbeat to every registered identity
async fn synthetic_upstream(
    registry: Arc<ConnectionRegistry>,
    ingress_tx: mpsc::Sender<UpstreamMessage>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(2));
    let mut seq: u64 = 0;

    loop {
        ticker.tick().await;
        seq += 1;

        let identities = registry.identities().await;
        if identities.is_empty() {
            continue;
        }

        let key: Vec<&str> = identities.iter().map(|id| id.as_str()).collect();
        let key = match serde_json::to_vec(&key) {
            Ok(key) => key,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode heartbeat key");
                continue;
            }
        };
        let value = format!(r#"{{"heartbeat":{}}}"#, seq);

        if ingress_tx
            .send(UpstreamMessage::new(key, value))
            .await
            .is_err()
        {
            break;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let bind_addr = match args.get(1) {
        Some(addr_str) => match parse_bind_addr(addr_str) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => "0.0.0.0:8080".parse().unwrap(),
    };

    let authority_url = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "http://localhost:8889".to_string());

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wscast_rs=debug".parse()?)
                .add_directive("relay_server=debug".parse()?),
        )
        .init();

    println!("Starting push relay on {}", bind_addr);
    println!("Registration authority: {}", authority_url);
    println!();
    println!("Connect a WebSocket client to ws://{}/ and send a", bind_addr);
    println!("subscription payload; heartbeats follow every two seconds.");
    println!();

    let registrar = HttpRegistrar::new(RegistrarConfig::with_base_url(authority_url))?;
    let server = Arc::new(WsServer::new(ServerConfig::with_addr(bind_addr), registrar));

    // Router and synthetic upstream share the server's registry
    let router = Router::new(Arc::clone(server.registry()));
    let (ingress_tx, ingress_rx) = mpsc::channel(1024);
    let (router_shutdown_tx, router_shutdown_rx) = mpsc::channel(1);

    let router_handle = tokio::spawn(async move {
        router.run(ingress_rx, router_shutdown_rx).await;
    });

    tokio::spawn(synthetic_upstream(
        Arc::clone(server.registry()),
        ingress_tx,
    ));

    // Run with Ctrl+C handling
    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    let _ = router_shutdown_tx.send(()).await;
    let _ = router_handle.await;

    Ok(())
}
