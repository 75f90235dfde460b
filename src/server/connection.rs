//! Per-connection handler
//!
//! Owns one push connection for its whole life: WebSocket handshake,
//! subscription frame, registration with the authority, registry entry,
//! then the relay loop that forwards routed payloads until the connection
//! ends.
//!
//! The relay loop is the single writer for its socket, so payloads reach a
//! subscriber in exactly the order the router dispatched them, and the
//! acknowledgment always precedes the first payload.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::error::{Error, Result};
use crate::protocol::{BroadcasterId, RegistrationAck, Subscription};
use crate::registration::{Registrar, RegistrationError};
use crate::registry::{ConnectionHandle, ConnectionRegistry};
use crate::server::config::ServerConfig;
use crate::session::SessionState;

/// Handler for a single accepted push connection
pub struct Connection<R: Registrar> {
    socket: TcpStream,
    state: SessionState,
    config: ServerConfig,
    registrar: Arc<R>,
    registry: Arc<ConnectionRegistry>,
}

impl<R: Registrar> Connection<R> {
    /// Create a handler for an accepted socket
    pub fn new(
        session_id: u64,
        socket: TcpStream,
        peer_addr: std::net::SocketAddr,
        config: ServerConfig,
        registrar: Arc<R>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            socket,
            state: SessionState::new(session_id, peer_addr),
            config,
            registrar,
            registry,
        }
    }

    /// Drive the connection to completion
    ///
    /// Every exit path that reaches the registry also leaves it: the
    /// connection is deregistered before its socket is released.
    pub async fn run(self) -> Result<()> {
        let Self {
            socket,
            mut state,
            config,
            registrar,
            registry,
        } = self;

        // Connecting: WebSocket handshake, then the subscription frame
        let mut ws = tokio_tungstenite::accept_async(socket).await?;

        let subscription =
            match await_subscription(&mut ws, config.registration_timeout, &mut state).await {
                Ok(subscription) => subscription,
                Err(e) => {
                    tracing::debug!(session_id = state.id, error = %e, "No usable subscription");
                    let _ = ws.close(None).await;
                    state.closed();
                    return Err(e);
                }
            };

        // Registering: obtain an identity, then claim it in the registry
        state.begin_registration();

        let identity =
            match register_with_retry(registrar.as_ref(), &subscription, &config).await {
                Ok(identity) => identity,
                Err(e) => {
                    tracing::warn!(session_id = state.id, error = %e, "Registration failed");
                    let _ = ws.close(None).await;
                    state.closed();
                    return Err(e.into());
                }
            };

        // Serialize the acknowledgment up front so a registered connection
        // can never be left behind by a late serialization failure.
        let ack_json = serde_json::to_string(&RegistrationAck::new(identity.clone()))?;

        let (tx, rx) = mpsc::channel::<Bytes>(config.send_queue_capacity);
        let handle = ConnectionHandle::new(state.id, identity.clone(), tx);

        if let Err(e) = registry.register(handle).await {
            tracing::warn!(
                session_id = state.id,
                identity = %identity,
                "Identity collision, refusing connection"
            );
            let _ = ws.close(None).await;
            state.closed();
            return Err(e.into());
        }

        state.activate(identity.clone());

        // Active: the acknowledgment goes out before any routed payload
        // can, because matching only became possible one step ago and the
        // relay loop below is the only writer.
        if let Err(e) = ws.send(Message::Text(ack_json)).await {
            state.close();
            registry.deregister(&identity).await;
            state.closed();
            return Err(e.into());
        }

        tracing::info!(
            session_id = state.id,
            identity = %identity,
            peer = %state.peer_addr,
            "Subscriber active"
        );

        let (mut ws_tx, ws_rx) = ws.split();
        relay(&mut ws_tx, ws_rx, rx, &mut state).await;

        // Closing: leave the registry before releasing the socket, so no
        // new dispatch can select this connection past this point
        state.close();
        registry.deregister(&identity).await;
        let _ = ws_tx.close().await;
        state.closed();

        tracing::info!(
            session_id = state.id,
            identity = %identity,
            frames = state.frames_sent,
            bytes = state.bytes_sent,
            duration_ms = state.duration().as_millis() as u64,
            "Session closed"
        );

        Ok(())
    }
}

/// Wait for the subscription frame, tolerating control frames
async fn await_subscription(
    ws: &mut WebSocketStream<TcpStream>,
    window: Duration,
    state: &mut SessionState,
) -> Result<Subscription> {
    let deadline = tokio::time::sleep(window);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => return Err(Error::SubscriptionTimeout),

            frame = ws.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        return Ok(serde_json::from_str(&text)?);
                    }
                    Some(Ok(Message::Binary(data))) => {
                        return Ok(serde_json::from_slice(&data)?);
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        ws.send(Message::Pong(payload)).await?;
                    }
                    Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(session_id = state.id, "Peer left before subscribing");
                        return Err(Error::ClosedBeforeRegistration);
                    }
                    Some(Err(e)) => return Err(e.into()),
                }
            }
        }
    }
}

/// Call the authority with the caller-owned bounded retry policy
async fn register_with_retry<R: Registrar + ?Sized>(
    registrar: &R,
    subscription: &Subscription,
    config: &ServerConfig,
) -> std::result::Result<BroadcasterId, RegistrationError> {
    let mut attempt: u32 = 1;

    loop {
        match registrar.register(subscription).await {
            Ok(identity) => return Ok(identity),
            Err(e) if attempt < config.register_attempts => {
                tracing::debug!(attempt, error = %e, "Registration attempt failed, retrying");
                tokio::time::sleep(config.register_backoff * attempt).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Relay routed payloads to the subscriber until either side ends
///
/// `rx` closing means the registry dropped this connection's handle
/// (router-detected failure or shutdown); the loop ends and the caller
/// completes deregistration.
async fn relay(
    ws_tx: &mut SplitSink<WebSocketStream<TcpStream>, Message>,
    mut ws_rx: SplitStream<WebSocketStream<TcpStream>>,
    mut rx: mpsc::Receiver<Bytes>,
    state: &mut SessionState,
) {
    loop {
        tokio::select! {
            payload = rx.recv() => {
                match payload {
                    Some(payload) => {
                        let size = payload.len();
                        if let Err(e) = ws_tx.send(Message::Binary(payload.to_vec())).await {
                            tracing::debug!(session_id = state.id, error = %e, "Send failed");
                            break;
                        }
                        state.on_frame_sent(size);
                    }
                    None => {
                        tracing::debug!(session_id = state.id, "Dispatch queue closed");
                        break;
                    }
                }
            }

            inbound = ws_rx.next() => {
                match inbound {
                    Some(Ok(Message::Ping(payload))) => {
                        if ws_tx.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    // Inbound frames after registration play no part in
                    // routing and are dropped
                    Some(Ok(Message::Text(_) | Message::Binary(_))) => {
                        tracing::trace!(session_id = state.id, "Ignoring inbound frame");
                    }
                    Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(session_id = state.id, error = %e, "Read failed");
                        break;
                    }
                }
            }
        }
    }
}
