//! Wire frame types for the relay protocol.
//!
//! All frames are JSON objects dispatched on their `type` field. Inbound
//! frames are lenient: optional fields default, unrecognized types are
//! tolerated. Outbound frames are one of exactly three shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display name assigned to a connection that has not declared one.
pub const DEFAULT_USERNAME: &str = "Anonymous";

/// A frame received from a client.
///
/// Frames with an unrecognized `type` deserialize to [`ClientFrame::Unknown`]
/// and are ignored, so newer clients can speak to older servers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// A chat message to relay to every connected client.
    Message {
        username: Option<String>,
        text: Option<String>,
    },

    /// An explicit identity declaration from an authenticated client.
    UserJoined { username: Option<String> },

    /// Any other `type` value. Ignored for forward compatibility.
    #[serde(other)]
    Unknown,
}

/// A frame broadcast by the server to every registered connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A relayed chat message, stamped with the server's receipt time.
    Message {
        username: String,
        text: String,
        timestamp: DateTime<Utc>,
    },

    /// Announcement that a client joined or declared a new identity.
    UserJoined { username: String },

    /// Announcement that a client disconnected.
    UserLeft { username: String },
}

impl ServerFrame {
    /// Builds a chat message envelope stamped with the current UTC time.
    #[must_use]
    pub fn message(username: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Message {
            username: username.into(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Builds a join announcement.
    #[must_use]
    pub fn user_joined(username: impl Into<String>) -> Self {
        Self::UserJoined {
            username: username.into(),
        }
    }

    /// Builds a departure announcement.
    #[must_use]
    pub fn user_left(username: impl Into<String>) -> Self {
        Self::UserLeft {
            username: username.into(),
        }
    }
}
