//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::navigation::SessionSnapshot;
use crate::voice::{VoiceCue, VoiceStatus};

/// Largest frame accepted from a client
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Requests from clients (scanner bridge, UI) to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ping to check connectivity
    Ping,

    /// Current navigation snapshot
    GetSnapshot,

    /// Selectable destination labels
    ListDestinations,

    /// Decoded QR payload
    Scan { value: String },

    /// Change the destination
    SetDestination { label: String },

    /// Mute or unmute voice guidance
    SetMuted { muted: bool },

    /// User gesture: unlock audio and play the intro
    Unlock,

    /// Speak a specific cue
    Speak { cue: VoiceCue },

    /// Current voice status
    GetVoiceStatus,

    /// Subscribe to change notifications
    Subscribe,
}

/// Responses from the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Pong response to ping
    Pong,

    /// Navigation snapshot
    Snapshot { snapshot: SessionSnapshot },

    /// Destination labels in graph order
    Destinations { labels: Vec<String> },

    /// Voice status
    VoiceStatus { status: VoiceStatus },

    /// Request accepted
    Ack,

    /// Subscription confirmed
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Response::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Push notification to subscribed clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    SnapshotChanged { snapshot: SessionSnapshot },
    VoiceChanged { status: VoiceStatus },
}

impl From<Event> for Notification {
    fn from(event: Event) -> Self {
        match event {
            Event::SessionChanged { snapshot } => Notification::SnapshotChanged { snapshot },
            Event::VoiceChanged { status } => Notification::VoiceChanged { status },
        }
    }
}
