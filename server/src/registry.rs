//! Connection registry: the shared table of live connections.
//!
//! The registry is the single shared mutable structure in the relay. It maps
//! each live connection to its display name and its outbound queue, and it
//! owns the fan-out primitive used for every broadcast.
//!
//! # Locking
//!
//! All operations take one `Mutex` over the whole table. The lock is held
//! across fan-out iteration so a broadcast observes an internally consistent
//! membership snapshot: a connection is never half-removed mid-broadcast.
//! Deliveries are pushes into per-connection unbounded channels, so no await
//! point ever runs under the lock. With the connection count bounded at the
//! configured maximum (100 by default), finer-grained locking buys nothing.

use std::collections::HashMap;
use std::sync::Mutex;

use axum::extract::ws::Message;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, trace, warn};
use uuid::Uuid;

use crate::types::ServerFrame;

/// Identity token for one live connection, valid for its lifetime.
pub type ConnectionId = Uuid;

/// One registered connection: its display name and outbound queue.
struct Peer {
    name: String,
    sender: UnboundedSender<Message>,
}

/// Shared table mapping live connections to display names.
///
/// Wrap in an `Arc` and clone the handle into each session task.
#[derive(Default)]
pub struct ConnectionRegistry {
    peers: Mutex<HashMap<ConnectionId, Peer>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the entry for a connection. Never fails.
    pub fn register(
        &self,
        id: ConnectionId,
        sender: UnboundedSender<Message>,
        name: impl Into<String>,
    ) {
        let name = name.into();
        let mut peers = self.peers.lock().unwrap();
        peers.insert(id, Peer { name, sender });
        debug!(connection_id = %id, connections = peers.len(), "Connection registered");
    }

    /// Updates the display name stored for a connection when it differs.
    ///
    /// Returns `true` if the stored name changed. A rename for a connection
    /// that was never registered is logged and ignored.
    pub fn rename(&self, id: &ConnectionId, name: &str) -> bool {
        let mut peers = self.peers.lock().unwrap();
        match peers.get_mut(id) {
            Some(peer) if peer.name != name => {
                trace!(connection_id = %id, from = %peer.name, to = %name, "Display name updated");
                peer.name = name.to_string();
                true
            }
            Some(_) => false,
            None => {
                warn!(connection_id = %id, "Rename for unregistered connection");
                false
            }
        }
    }

    /// Returns the display name currently stored for a connection.
    #[must_use]
    pub fn name_of(&self, id: &ConnectionId) -> Option<String> {
        self.peers
            .lock()
            .unwrap()
            .get(id)
            .map(|peer| peer.name.clone())
    }

    /// Removes the entry for a connection, returning the stored name.
    ///
    /// `None` means the connection was never registered or was already
    /// removed; callers treat that as recoverable.
    pub fn unregister(&self, id: &ConnectionId) -> Option<String> {
        let mut peers = self.peers.lock().unwrap();
        let removed = peers.remove(id).map(|peer| peer.name);
        if removed.is_some() {
            debug!(connection_id = %id, connections = peers.len(), "Connection unregistered");
        }
        removed
    }

    /// Fans a frame out to every registered connection, sender included.
    ///
    /// The frame is serialized once. A failed delivery means that peer's
    /// session is already tearing down; the failure is logged and the
    /// fan-out continues to the remaining targets. Returns the number of
    /// connections the frame was queued for.
    pub fn broadcast(&self, frame: &ServerFrame) -> usize {
        let json = match serde_json::to_string(frame) {
            Ok(json) => json,
            Err(err) => {
                error!(error = %err, "Failed to serialize outbound frame");
                return 0;
            }
        };

        let peers = self.peers.lock().unwrap();
        let mut delivered = 0;
        for (id, peer) in peers.iter() {
            if peer.sender.send(Message::Text(json.clone().into())).is_ok() {
                delivered += 1;
            } else {
                debug!(connection_id = %id, "Peer outbound queue closed, skipping");
            }
        }

        trace!(delivered, connections = peers.len(), "Broadcast fan-out complete");
        delivered
    }

    /// Number of live entries. Diagnostics only.
    #[must_use]
    pub fn len(&self) -> usize {
        self.peers.lock().unwrap().len()
    }

    /// Returns `true` if no connection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.peers.lock().unwrap().is_empty()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.peers.lock().map(|peers| peers.len()).unwrap_or(0);
        f.debug_struct("ConnectionRegistry")
            .field("connections", &len)
            .finish()
    }
}
