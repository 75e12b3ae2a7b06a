//! Per-connection session handling.
//!
//! One session runs per accepted WebSocket. Its lifecycle is an explicit
//! state machine:
//!
//! ```text
//! Authenticating -> Active -> Closing -> Closed
//!        \____________________________/
//!          (gate failure: straight to Closed, no registry entry)
//! ```
//!
//! While `Active`, the session reads inbound frames, validates them, and
//! drives broadcasts through the shared registry. Malformed or invalid
//! frames are discarded without terminating the session. Departure handling
//! runs exactly once per session, on every exit path, via a drop guard.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::auth::{AuthError, CLOSE_CODE_POLICY_VIOLATION};
use crate::error::FrameError;
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::routes::AppState;
use crate::types::{ClientFrame, ServerFrame, DEFAULT_USERNAME};

/// Lifecycle phase of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Authenticating,
    Active,
    Closing,
    Closed,
}

/// Drives one WebSocket connection from upgrade to cleanup.
///
/// `auth` is the outcome of the authentication gate, which consumed the
/// `token` query parameter before the upgrade. A failed gate closes the
/// socket with code 1008 and the matching reason string; no registry entry
/// is ever created for it.
pub(crate) async fn run(mut socket: WebSocket, state: AppState, auth: Result<(), AuthError>) {
    let mut phase = SessionState::Authenticating;
    trace!(?phase, "Session accepted");

    if let Err(err) = auth {
        info!(reason = err.close_reason(), "Rejecting unauthenticated connection");
        let close = CloseFrame {
            code: CLOSE_CODE_POLICY_VIOLATION,
            reason: err.close_reason().to_owned().into(),
        };
        // The peer may already be gone; nothing left to do either way.
        let _ = socket.send(Message::Close(Some(close))).await;
        phase = SessionState::Closed;
        trace!(?phase, "Session finished");
        return;
    }

    let id: ConnectionId = Uuid::new_v4();
    let (sender, mut outbound) = mpsc::unbounded_channel::<Message>();

    join(&state, id, sender);
    let departure = DepartureGuard {
        registry: Arc::clone(&state.registry),
        id,
    };
    phase = SessionState::Active;
    trace!(?phase, connection_id = %id, "Session authenticated");

    let (mut sink, mut stream) = socket.split();

    // Drains this session's outbound queue into the socket, so a slow peer
    // only ever stalls its own queue, never a broadcaster.
    let forward_task = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if let Err(err) = handle_frame(&state, &id, text.as_str()) {
                    warn!(connection_id = %id, error = %err, "Discarding inbound frame");
                }
            }
            Ok(Message::Close(_)) => {
                debug!(connection_id = %id, "Client sent close frame");
                break;
            }
            Ok(_) => {
                // Binary frames and pings are not part of the protocol.
            }
            Err(err) => {
                debug!(connection_id = %id, error = %err, "WebSocket read error");
                break;
            }
        }
    }

    phase = SessionState::Closing;
    trace!(?phase, connection_id = %id, "Session closing");

    forward_task.abort();

    // Unregister + user_left broadcast, exactly once on every exit path.
    drop(departure);

    phase = SessionState::Closed;
    trace!(?phase, connection_id = %id, "Session finished");
}

/// Registers a freshly authenticated connection and announces it.
///
/// The entry is created before the broadcast so the new connection receives
/// its own join announcement.
pub fn join(state: &AppState, id: ConnectionId, sender: UnboundedSender<Message>) {
    state.registry.register(id, sender, DEFAULT_USERNAME);
    info!(
        connection_id = %id,
        connections = state.registry.len(),
        "Client connected"
    );
    state
        .registry
        .broadcast(&ServerFrame::user_joined(DEFAULT_USERNAME));
}

/// Validates one inbound text frame and drives the resulting broadcast.
///
/// # Errors
///
/// Returns a [`FrameError`] when the frame is discarded: unparseable
/// payloads, empty or whitespace-only text, and text over the configured
/// maximum. Callers log the error and keep the session active.
pub fn handle_frame(
    state: &AppState,
    id: &ConnectionId,
    payload: &str,
) -> Result<(), FrameError> {
    let frame: ClientFrame = serde_json::from_str(payload)?;

    match frame {
        ClientFrame::Message { username, text } => {
            let username = resolve_username(username);
            let text = text.unwrap_or_default();
            validate_text(&text, state.config.max_message_length)?;

            // A rename piggybacked on a chat message updates the registry
            // but deliberately does not emit a user_joined announcement.
            if state.registry.rename(id, &username) {
                debug!(connection_id = %id, username = %username, "Sender renamed");
            }

            let delivered = state.registry.broadcast(&ServerFrame::message(username, text));
            trace!(connection_id = %id, delivered, "Chat message relayed");
        }
        ClientFrame::UserJoined { username } => {
            let username = resolve_username(username);
            state.registry.rename(id, &username);
            let delivered = state
                .registry
                .broadcast(&ServerFrame::user_joined(username));
            trace!(connection_id = %id, delivered, "Join announcement relayed");
        }
        ClientFrame::Unknown => {
            trace!(connection_id = %id, "Ignoring unrecognized frame type");
        }
    }

    Ok(())
}

/// Removes a connection from the registry and announces its departure.
///
/// Safe to invoke for a connection that never registered or was already
/// removed: the second call finds no entry, logs a warning, and broadcasts
/// nothing.
pub fn announce_departure(registry: &ConnectionRegistry, id: &ConnectionId) {
    match registry.unregister(id) {
        Some(name) => {
            info!(
                connection_id = %id,
                connections = registry.len(),
                "Client disconnected"
            );
            registry.broadcast(&ServerFrame::user_left(name));
        }
        None => {
            warn!(connection_id = %id, "Departure for connection with no registry entry");
        }
    }
}

/// Runs departure handling when the session task unwinds, whatever the exit
/// reason.
struct DepartureGuard {
    registry: Arc<ConnectionRegistry>,
    id: ConnectionId,
}

impl Drop for DepartureGuard {
    fn drop(&mut self) {
        announce_departure(&self.registry, &self.id);
    }
}

fn resolve_username(username: Option<String>) -> String {
    match username {
        Some(name) if !name.trim().is_empty() => name,
        _ => DEFAULT_USERNAME.to_string(),
    }
}

fn validate_text(text: &str, max: usize) -> Result<(), FrameError> {
    if text.trim().is_empty() {
        return Err(FrameError::EmptyText);
    }
    let len = text.chars().count();
    if len > max {
        return Err(FrameError::TextTooLong { len, max });
    }
    Ok(())
}
