//! Session state for one walk toward one destination

use serde::{Deserialize, Serialize};

use crate::graph::{Direction, Graph};

/// Initial status shown before any marker is scanned
pub const START_MESSAGE: &str = "Scan a QR marker to start.";

/// Instruction derived for the walker's next move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    Forward,
    Left,
    Right,
    Back,
    /// Walker is standing at the destination
    Done,
}

impl From<Direction> for Heading {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => Heading::Forward,
            Direction::Left => Heading::Left,
            Direction::Right => Heading::Right,
            Direction::Back => Heading::Back,
        }
    }
}

impl std::fmt::Display for Heading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Heading::Forward => write!(f, "forward"),
            Heading::Left => write!(f, "left"),
            Heading::Right => write!(f, "right"),
            Heading::Back => write!(f, "back"),
            Heading::Done => write!(f, "done"),
        }
    }
}

/// Result tag of the most recent scan
///
/// A session whose last scan could not be routed (no path, missing edge
/// direction, unconfigured destination) carries `None`, the same as a
/// session that has not seen a scan yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanOutcome {
    DirectionComputed,
    Arrived,
    UnknownMarker,
    NoChange,
}

impl std::fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanOutcome::DirectionComputed => write!(f, "direction-computed"),
            ScanOutcome::Arrived => write!(f, "arrived"),
            ScanOutcome::UnknownMarker => write!(f, "unknown-marker"),
            ScanOutcome::NoChange => write!(f, "no-change"),
        }
    }
}

/// Coarse navigation phase, derived from the session fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No valid marker scanned yet
    Uninitialized,
    /// Position known and a next hop computed
    Tracking,
    /// Standing at the destination
    Arrived,
    /// Position known but no guidance (destination unresolved or no route)
    Unroutable,
    /// Last scan was not a marker of this graph
    UnknownInput,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Uninitialized => write!(f, "Uninitialized"),
            Phase::Tracking => write!(f, "Tracking"),
            Phase::Arrived => write!(f, "Arrived"),
            Phase::Unroutable => write!(f, "Unroutable"),
            Phase::UnknownInput => write!(f, "UnknownInput"),
        }
    }
}

/// Mutable navigation state, replaced as a whole by each transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub destination_label: String,
    /// Node declaring `destination_label`, if any
    pub destination_node: Option<String>,
    /// Last successfully scanned node
    pub current_node: Option<String>,
    /// First valid node of the session, never changed once set
    pub start_node: Option<String>,
    /// Last accepted raw payload, used for repeat detection
    pub last_scanned_raw: Option<String>,
    pub next_direction: Option<Heading>,
    pub steps_remaining: Option<u32>,
    pub status_message: String,
    pub last_scan_outcome: Option<ScanOutcome>,
}

impl Session {
    /// Start a session heading for `label`
    pub fn new(graph: &Graph, label: &str) -> Self {
        Self {
            destination_label: label.to_string(),
            destination_node: graph.destination_node_for(label).map(str::to_string),
            current_node: None,
            start_node: None,
            last_scanned_raw: None,
            next_direction: None,
            steps_remaining: None,
            status_message: START_MESSAGE.to_string(),
            last_scan_outcome: None,
        }
    }

    /// Current phase of the walk
    pub fn phase(&self) -> Phase {
        if self.last_scan_outcome == Some(ScanOutcome::UnknownMarker) {
            return Phase::UnknownInput;
        }
        match (&self.current_node, self.next_direction) {
            (None, _) => Phase::Uninitialized,
            (Some(_), Some(Heading::Done)) => Phase::Arrived,
            (Some(_), Some(_)) => Phase::Tracking,
            (Some(_), None) => Phase::Unroutable,
        }
    }

    /// Read-only view for presentation layers
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            destination_label: self.destination_label.clone(),
            current_node: self.current_node.clone(),
            start_node: self.start_node.clone(),
            next_direction: self.next_direction,
            steps_remaining: self.steps_remaining,
            status_message: self.status_message.clone(),
            last_scan_outcome: self.last_scan_outcome,
        }
    }
}

/// Rendered state published after every mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub destination_label: String,
    pub current_node: Option<String>,
    pub start_node: Option<String>,
    pub next_direction: Option<Heading>,
    pub steps_remaining: Option<u32>,
    pub status_message: String,
    pub last_scan_outcome: Option<ScanOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::sample;

    #[test]
    fn test_new_session_resolves_destination() {
        let graph = sample::campus();
        let session = Session::new(&graph, "Dean's Office - 2053");
        assert_eq!(session.destination_node.as_deref(), Some("N4"));
        assert_eq!(session.status_message, START_MESSAGE);
        assert_eq!(session.phase(), Phase::Uninitialized);
    }

    #[test]
    fn test_new_session_with_unknown_destination() {
        let graph = sample::campus();
        let session = Session::new(&graph, "Rooftop");
        assert_eq!(session.destination_node, None);
        assert_eq!(session.last_scan_outcome, None);
    }

    #[test]
    fn test_snapshot_serialization() {
        let graph = sample::campus();
        let mut session = Session::new(&graph, "Main Stairs");
        session.next_direction = Some(Heading::Done);
        session.last_scan_outcome = Some(ScanOutcome::DirectionComputed);

        let json = serde_json::to_string(&session.snapshot()).unwrap();
        assert!(json.contains(r#""next_direction":"done""#));
        assert!(json.contains(r#""last_scan_outcome":"direction-computed""#));
    }
}
