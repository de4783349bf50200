//! Scan-driven navigation state machine
//!
//! Transitions are pure functions from one `Session` to the next. The
//! `Navigator` owns the graph and the live session and swaps the whole
//! session at once, so observers never see a half-applied scan.

use std::sync::Arc;

use tracing::{debug, info};

use crate::graph::{shortest_path, Direction, Graph};

use super::session::{Heading, ScanOutcome, Session, SessionSnapshot};

/// Estimated walking steps per graph edge
pub const STEPS_PER_EDGE: u32 = 20;

/// Apply one scanned payload to `session`
pub fn handle_scan(graph: &Graph, session: &Session, raw: &str) -> Session {
    let mut next = session.clone();

    // Repeat of the last accepted payload: only the outcome changes
    if session.last_scanned_raw.as_deref() == Some(raw) {
        next.last_scan_outcome = Some(ScanOutcome::NoChange);
        return next;
    }
    next.last_scanned_raw = Some(raw.to_string());

    if !graph.contains(raw) {
        next.status_message = format!("Unknown marker: {raw}");
        next.next_direction = None;
        next.steps_remaining = None;
        next.last_scan_outcome = Some(ScanOutcome::UnknownMarker);
        return next;
    }

    next.current_node = Some(raw.to_string());
    if next.start_node.is_none() {
        next.start_node = Some(raw.to_string());
    }

    let Some(destination) = next.destination_node.clone() else {
        next.status_message = "Destination room not configured.".to_string();
        clear_guidance(&mut next);
        return next;
    };

    if raw == destination {
        next.status_message = format!("You have arrived at {}.", next.destination_label);
        next.next_direction = Some(Heading::Done);
        next.steps_remaining = Some(0);
        next.last_scan_outcome = Some(ScanOutcome::Arrived);
        return next;
    }

    let path = shortest_path(graph, raw, &destination);
    if path.len() < 2 {
        next.status_message = "No path found from here.".to_string();
        clear_guidance(&mut next);
        return next;
    }

    apply_route(&mut next, path.len() - 1, next_hop(graph, &path));
    next
}

/// Guidance for a route of `hops` edges whose first turn is `direction`
///
/// A validated `Graph` always has an edge for the first hop of a found
/// path, so `None` only arises from a hand-built path.
fn apply_route(session: &mut Session, hops: usize, direction: Option<Direction>) {
    let steps = hops as u32 * STEPS_PER_EDGE;
    session.steps_remaining = Some(steps);

    let Some(direction) = direction else {
        // Steps stay as computed; only the direction is unknown
        session.status_message = "No direction info for the next step.".to_string();
        session.next_direction = None;
        session.last_scan_outcome = None;
        return;
    };

    session.next_direction = Some(direction.into());
    session.status_message = format!("{} (~{steps} steps remaining)", instruction(direction));
    session.last_scan_outcome = Some(ScanOutcome::DirectionComputed);
}

/// Point `session` at a new destination label
///
/// Position history (current, start, last scan and its outcome) survives
/// the change; only guidance is reset.
pub fn set_destination(graph: &Graph, session: &Session, label: &str) -> Session {
    let mut next = session.clone();
    next.destination_label = label.to_string();
    next.destination_node = graph.destination_node_for(label).map(str::to_string);
    next.next_direction = None;
    next.steps_remaining = None;
    next.status_message = if next.destination_node.is_some() {
        format!("Destination set to {label}. Scan a QR to start.")
    } else {
        format!("Destination {label} not configured.")
    };
    next
}

fn clear_guidance(session: &mut Session) {
    session.next_direction = None;
    session.steps_remaining = None;
    session.last_scan_outcome = None;
}

/// Direction of the first edge along `path`
fn next_hop(graph: &Graph, path: &[String]) -> Option<Direction> {
    match path {
        [from, to, ..] => graph.direction_between(from, to),
        _ => None,
    }
}

/// Spoken/displayed instruction for a turn
fn instruction(direction: Direction) -> &'static str {
    match direction {
        Direction::Forward => "Walk straight until you see the next QR marker.",
        Direction::Left => "Turn left at the next junction and look for a QR marker.",
        Direction::Right => "Turn right at the next junction and look for a QR marker.",
        Direction::Back => "Turn back towards the previous QR marker.",
    }
}

/// Owner of the graph and the live session
pub struct Navigator {
    graph: Arc<Graph>,
    session: Session,
}

impl Navigator {
    /// Create a navigator heading for `destination`
    pub fn new(graph: Arc<Graph>, destination: &str) -> Self {
        let session = Session::new(&graph, destination);
        Self { graph, session }
    }

    /// The live session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The graph being navigated
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Read-only view of the live session
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Process one scanned payload
    pub fn handle_scan(&mut self, raw: &str) -> &Session {
        let next = handle_scan(&self.graph, &self.session, raw);
        self.commit(next, raw);
        &self.session
    }

    /// Change destination mid-session
    pub fn set_destination(&mut self, label: &str) -> &Session {
        let next = set_destination(&self.graph, &self.session, label);
        info!(
            destination = %label,
            resolved = ?next.destination_node,
            "destination changed"
        );
        self.session = next;
        &self.session
    }

    fn commit(&mut self, next: Session, raw: &str) {
        let old_phase = self.session.phase();
        let new_phase = next.phase();

        match next.last_scan_outcome {
            Some(ScanOutcome::NoChange) => {
                debug!(raw, "repeat scan ignored");
            }
            outcome => {
                info!(
                    raw,
                    from = %old_phase,
                    to = %new_phase,
                    outcome = ?outcome,
                    direction = ?next.next_direction,
                    steps = ?next.steps_remaining,
                    "scan processed"
                );
            }
        }

        self.session = next;
    }
}
