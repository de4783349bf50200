//! Events module for state change notifications
//!
//! Every session mutation and every voice status change is broadcast as an
//! `Event`, which the IPC server forwards to subscribed clients.

use serde::{Deserialize, Serialize};

use crate::navigation::SessionSnapshot;
use crate::voice::VoiceStatus;

/// Events broadcast by the controller and the voice service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Navigation session changed (scan or destination change)
    SessionChanged {
        snapshot: SessionSnapshot,
    },

    /// Voice scheduler status changed
    VoiceChanged {
        status: VoiceStatus,
    },
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::SessionChanged { snapshot } => write!(
                f,
                "SESSION_CHANGED ({})",
                snapshot
                    .last_scan_outcome
                    .map_or_else(|| "none".to_string(), |o| o.to_string())
            ),
            Event::VoiceChanged { status } => match status.speaking {
                Some(cue) => write!(f, "VOICE_SPEAKING ({cue})"),
                None if status.needs_unlock => write!(f, "VOICE_NEEDS_UNLOCK"),
                None => write!(f, "VOICE_IDLE"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::VoiceCue;

    #[test]
    fn test_event_serialization() {
        let event = Event::VoiceChanged {
            status: VoiceStatus {
                speaking: Some(VoiceCue::Arrival),
                muted: false,
                needs_unlock: false,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("voice_changed"));
        assert!(json.contains("arrival"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"voice_changed","status":{"speaking":null,"muted":true,"needs_unlock":false}}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert!(matches!(event, Event::VoiceChanged { status } if status.muted));
    }

    #[test]
    fn test_event_display() {
        let event = Event::VoiceChanged {
            status: VoiceStatus {
                speaking: None,
                muted: false,
                needs_unlock: true,
            },
        };
        assert_eq!(event.to_string(), "VOICE_NEEDS_UNLOCK");
    }
}
