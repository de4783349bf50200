//! Voice actor
//!
//! Runs the scheduler on its own task. Commands arrive from any number of
//! `VoiceHandle`s; playback reports arrive from the output. Status changes
//! are broadcast as `Event::VoiceChanged`.

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

use crate::events::Event;
use crate::navigation::Heading;

use super::cue::{CueTable, VoiceCue};
use super::output::{AudioOutput, PlaybackEvent};
use super::scheduler::{CueScheduler, VoiceStatus};

/// Messages accepted by the voice actor
#[derive(Debug)]
pub enum VoiceCommand {
    Request(VoiceCue),
    AnnounceIntro,
    SetMuted(bool),
    Unlock,
    Status(oneshot::Sender<VoiceStatus>),
}

/// Cloneable sender side of the voice actor
#[derive(Debug, Clone)]
pub struct VoiceHandle {
    tx: mpsc::Sender<VoiceCommand>,
}

impl VoiceHandle {
    async fn send(&self, command: VoiceCommand) {
        if self.tx.send(command).await.is_err() {
            debug!("voice service gone, command dropped");
        }
    }

    pub async fn request(&self, cue: VoiceCue) {
        self.send(VoiceCommand::Request(cue)).await;
    }

    pub async fn announce_intro(&self) {
        self.send(VoiceCommand::AnnounceIntro).await;
    }

    pub async fn announce_direction(&self, heading: Heading) {
        self.request(VoiceCue::for_heading(heading)).await;
    }

    pub async fn announce_destination_changed(&self) {
        self.request(VoiceCue::DestinationChanged).await;
    }

    pub async fn announce_scan_error(&self) {
        self.request(VoiceCue::ScanError).await;
    }

    pub async fn set_muted(&self, muted: bool) {
        self.send(VoiceCommand::SetMuted(muted)).await;
    }

    pub async fn unlock(&self) {
        self.send(VoiceCommand::Unlock).await;
    }

    /// Current status, `None` once the service has stopped
    pub async fn status(&self) -> Option<VoiceStatus> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(VoiceCommand::Status(reply_tx)).await;
        reply_rx.await.ok()
    }
}

/// Task owning the scheduler and its output
pub struct VoiceService<O> {
    scheduler: CueScheduler<O>,
    playback_rx: mpsc::UnboundedReceiver<PlaybackEvent>,
    command_rx: mpsc::Receiver<VoiceCommand>,
    event_tx: broadcast::Sender<Event>,
    last_status: VoiceStatus,
}

impl<O: AudioOutput> VoiceService<O> {
    /// Create the service and a handle to it
    pub fn new(output: O, table: CueTable, event_tx: broadcast::Sender<Event>) -> (Self, VoiceHandle) {
        let (scheduler, playback_rx) = CueScheduler::new(output, table);
        let (tx, command_rx) = mpsc::channel(32);
        let service = Self {
            scheduler,
            playback_rx,
            command_rx,
            event_tx,
            last_status: VoiceStatus::default(),
        };
        (service, VoiceHandle { tx })
    }

    /// Process commands and playback reports until every handle is dropped
    pub async fn run(mut self) {
        info!("voice service started");

        loop {
            tokio::select! {
                // Reports already delivered are applied before newer commands
                biased;

                Some(event) = self.playback_rx.recv() => {
                    self.scheduler.on_playback(event);
                }
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
            }
            self.publish_status();
        }

        self.scheduler.shutdown();
        info!("voice service stopped");
    }

    fn handle_command(&mut self, command: VoiceCommand) {
        match command {
            VoiceCommand::Request(cue) => self.scheduler.request(cue),
            VoiceCommand::AnnounceIntro => self.scheduler.announce_intro(),
            VoiceCommand::SetMuted(muted) => self.scheduler.set_muted(muted),
            VoiceCommand::Unlock => self.scheduler.unlock(),
            VoiceCommand::Status(reply) => {
                let _ = reply.send(self.scheduler.status());
            }
        }
    }

    fn publish_status(&mut self) {
        let status = self.scheduler.status();
        if status != self.last_status {
            self.last_status = status;
            debug!(?status, "voice status changed");
            let _ = self.event_tx.send(Event::VoiceChanged { status });
        }
    }
}
