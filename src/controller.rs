//! Session controller
//!
//! Feeds scans and destination changes into the navigator, chooses the
//! voice cue for each resulting session and publishes every new snapshot.

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::events::Event;
use crate::navigation::{Heading, Navigator, ScanOutcome, Session, SessionSnapshot};
use crate::voice::VoiceHandle;

/// Messages accepted by the controller
#[derive(Debug)]
pub enum Control {
    /// Decoded QR payload from the scanner
    Scan(String),
    /// Destination picked by the operator
    SetDestination(String),
    /// First user interaction: unlocks audio and plays the intro
    Gesture,
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Destinations(oneshot::Sender<Vec<String>>),
}

/// Glue between scan input, navigator and voice
pub struct SessionController {
    navigator: Navigator,
    voice: VoiceHandle,
    event_tx: broadcast::Sender<Event>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    pub fn new(navigator: Navigator, voice: VoiceHandle, event_tx: broadcast::Sender<Event>) -> Self {
        let (snapshot_tx, _) = watch::channel(navigator.snapshot());
        Self {
            navigator,
            voice,
            event_tx,
            snapshot_tx,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Latest session snapshot, updated after every mutation
    pub fn snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Process control messages until all senders are dropped
    pub async fn run(&mut self, mut control_rx: mpsc::Receiver<Control>) {
        info!(
            destination = %self.navigator.session().destination_label,
            "session controller started"
        );

        while let Some(message) = control_rx.recv().await {
            self.handle(message).await;
        }

        info!("session controller stopped");
    }

    async fn handle(&mut self, message: Control) {
        match message {
            Control::Scan(raw) => self.on_scan(&raw).await,
            Control::SetDestination(label) => self.on_destination(&label).await,
            Control::Gesture => {
                self.voice.unlock().await;
                self.voice.announce_intro().await;
            }
            Control::Snapshot(reply) => {
                let _ = reply.send(self.navigator.snapshot());
            }
            Control::Destinations(reply) => {
                let labels = self
                    .navigator
                    .graph()
                    .destinations()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                let _ = reply.send(labels);
            }
        }
    }

    /// Apply one scan and speak the matching cue
    pub async fn on_scan(&mut self, raw: &str) {
        let session = self.navigator.handle_scan(raw).clone();
        self.publish(&session);

        match (session.last_scan_outcome, session.next_direction) {
            (Some(ScanOutcome::DirectionComputed), Some(heading)) => {
                self.voice.announce_direction(heading).await;
            }
            (Some(ScanOutcome::Arrived), _) => {
                self.voice.announce_direction(Heading::Done).await;
            }
            (Some(ScanOutcome::UnknownMarker), _) => {
                self.voice.announce_scan_error().await;
            }
            _ => {
                debug!(raw, "no cue for scan");
            }
        }
    }

    /// Switch destination and confirm it by voice
    pub async fn on_destination(&mut self, label: &str) {
        let session = self.navigator.set_destination(label).clone();
        self.publish(&session);
        self.voice.announce_destination_changed().await;
    }

    fn publish(&self, session: &Session) {
        let snapshot = session.snapshot();
        self.snapshot_tx.send_replace(snapshot.clone());
        let _ = self.event_tx.send(Event::SessionChanged { snapshot });
    }
}
