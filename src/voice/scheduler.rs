//! Single-voice cue scheduler
//!
//! Keeps at most one cue playing and at most one waiting. A new request
//! overwrites the waiting cue instead of queueing behind it. Every playback
//! attempt gets a fresh generation; reports from older generations are
//! ignored.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::navigation::Heading;

use super::cue::{CueTable, VoiceCue};
use super::output::{AudioOutput, Completion, PlaybackError, PlaybackEvent};

/// Observable scheduler state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceStatus {
    /// Cue currently playing
    pub speaking: Option<VoiceCue>,
    pub muted: bool,
    /// Output refused to start until a user gesture
    pub needs_unlock: bool,
}

#[derive(Debug, Clone, Copy)]
struct Playback {
    cue: VoiceCue,
    generation: u64,
}

/// Scheduler owning the one audio output
pub struct CueScheduler<O> {
    output: O,
    table: CueTable,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    pending: Option<VoiceCue>,
    current: Option<Playback>,
    generation: u64,
    muted: bool,
    needs_unlock: bool,
    intro_played: bool,
}

impl<O: AudioOutput> CueScheduler<O> {
    /// Create a scheduler
    ///
    /// The returned receiver yields playback reports from the output; feed
    /// each one back through [`CueScheduler::on_playback`].
    pub fn new(output: O, table: CueTable) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            output,
            table,
            events,
            pending: None,
            current: None,
            generation: 0,
            muted: false,
            needs_unlock: false,
            intro_played: false,
        };
        (scheduler, events_rx)
    }

    pub fn status(&self) -> VoiceStatus {
        VoiceStatus {
            speaking: self.current.map(|p| p.cue),
            muted: self.muted,
            needs_unlock: self.needs_unlock,
        }
    }

    /// Cue waiting for the output
    pub fn pending(&self) -> Option<VoiceCue> {
        self.pending
    }

    /// Generation of the latest playback attempt
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ask for `cue` to be spoken
    pub fn request(&mut self, cue: VoiceCue) {
        if self.muted {
            debug!(%cue, "muted, cue ignored");
            return;
        }
        if self.current.map(|p| p.cue) == Some(cue) {
            debug!(%cue, "cue already playing");
            return;
        }

        if let Some(dropped) = self.pending.replace(cue) {
            debug!(%dropped, %cue, "pending cue replaced");
        }

        if self.current.is_none() {
            self.play_next();
        }
    }

    /// Play the intro, at most once per scheduler
    pub fn announce_intro(&mut self) {
        if !self.intro_played {
            self.intro_played = true;
            self.request(VoiceCue::Intro);
        }
    }

    pub fn announce_direction(&mut self, heading: Heading) {
        self.request(VoiceCue::for_heading(heading));
    }

    pub fn announce_destination_changed(&mut self) {
        self.request(VoiceCue::DestinationChanged);
    }

    pub fn announce_scan_error(&mut self) {
        self.request(VoiceCue::ScanError);
    }

    /// Mute or unmute
    ///
    /// Muting stops the output at once and forgets both slots.
    pub fn set_muted(&mut self, muted: bool) {
        if muted {
            self.output.stop();
            self.current = None;
            self.pending = None;
        }
        if self.muted != muted {
            info!(muted, "voice mute toggled");
        }
        self.muted = muted;
    }

    /// Unlock the output from a user gesture and resume a held cue
    pub fn unlock(&mut self) {
        match self.output.unlock() {
            Ok(()) => {
                if self.needs_unlock {
                    info!("audio unlocked");
                }
                self.needs_unlock = false;
                if self.pending.is_some() && self.current.is_none() {
                    self.play_next();
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to unlock audio");
            }
        }
    }

    /// Apply a report from the output
    pub fn on_playback(&mut self, event: PlaybackEvent) {
        let Some(playing) = self.current else {
            debug!(generation = event.generation, "report with nothing playing ignored");
            return;
        };
        if playing.generation != event.generation {
            debug!(
                generation = event.generation,
                current = playing.generation,
                "stale playback report ignored"
            );
            return;
        }

        self.current = None;
        match event.result {
            Ok(()) => {
                debug!(cue = %playing.cue, "cue finished");
                self.play_next();
            }
            Err(PlaybackError::Blocked) => {
                warn!(cue = %playing.cue, "playback blocked, waiting for unlock");
                self.needs_unlock = true;
                if let Some(dropped) = self.pending.replace(playing.cue) {
                    debug!(%dropped, cue = %playing.cue, "blocked cue replaces pending");
                }
            }
            Err(e) => {
                warn!(cue = %playing.cue, error = %e, "playback failed");
                self.play_next();
            }
        }
    }

    /// Stop playback and drop both slots, leaving the mute flag alone
    pub fn shutdown(&mut self) {
        self.output.stop();
        self.current = None;
        self.pending = None;
    }

    /// Promote the pending cue, if any, and start it
    fn play_next(&mut self) {
        if self.muted {
            self.current = None;
            self.pending = None;
            return;
        }
        let Some(cue) = self.pending.take() else {
            self.current = None;
            return;
        };

        self.generation += 1;
        let generation = self.generation;
        self.current = Some(Playback { cue, generation });

        debug!(%cue, generation, "cue started");
        let completion = Completion::new(generation, self.events.clone());
        self.output.start(self.table.resource(cue), completion);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::voice::fake::FakeOutput;

    type Events = mpsc::UnboundedReceiver<PlaybackEvent>;

    fn create_scheduler() -> (CueScheduler<FakeOutput>, FakeOutput, Events) {
        let output = FakeOutput::new();
        let table = CueTable::in_dir(Path::new("audio"));
        let (scheduler, events) = CueScheduler::new(output.clone(), table);
        (scheduler, output, events)
    }

    /// Deliver every report the output has produced so far
    fn pump(scheduler: &mut CueScheduler<FakeOutput>, events: &mut Events) {
        while let Ok(event) = events.try_recv() {
            scheduler.on_playback(event);
        }
    }

    fn file(cue: VoiceCue) -> String {
        format!("audio/{}", cue.file_name())
    }

    #[test]
    fn test_request_starts_when_idle() {
        let (mut s, output, _events) = create_scheduler();
        s.request(VoiceCue::DirLeft);

        assert_eq!(output.started(), vec![file(VoiceCue::DirLeft)]);
        assert_eq!(s.status().speaking, Some(VoiceCue::DirLeft));
        assert_eq!(s.pending(), None);
        assert_eq!(s.generation(), 1);
    }

    #[test]
    fn test_same_cue_while_playing_is_noop() {
        let (mut s, output, _events) = create_scheduler();
        s.request(VoiceCue::Arrival);
        s.request(VoiceCue::Arrival);

        assert_eq!(output.started().len(), 1);
        assert_eq!(s.generation(), 1);
        assert_eq!(s.pending(), None);
    }

    #[test]
    fn test_latest_pending_wins() {
        let (mut s, output, mut events) = create_scheduler();
        s.request(VoiceCue::Intro);
        s.request(VoiceCue::DirLeft);
        s.request(VoiceCue::DirRight);
        assert_eq!(s.pending(), Some(VoiceCue::DirRight));

        output.take_last().finished();
        pump(&mut s, &mut events);

        assert_eq!(
            output.started(),
            vec![file(VoiceCue::Intro), file(VoiceCue::DirRight)]
        );
        assert_eq!(s.status().speaking, Some(VoiceCue::DirRight));
    }

    #[test]
    fn test_drains_to_idle() {
        let (mut s, output, mut events) = create_scheduler();
        s.request(VoiceCue::Intro);
        s.request(VoiceCue::Waiting);

        output.take_last().finished();
        pump(&mut s, &mut events);
        output.take_last().finished();
        pump(&mut s, &mut events);

        assert_eq!(s.status(), VoiceStatus::default());
        assert_eq!(output.started().len(), 2);
    }

    #[test]
    fn test_failure_advances_to_pending() {
        let (mut s, output, mut events) = create_scheduler();
        s.request(VoiceCue::DirForward);
        s.request(VoiceCue::ScanError);

        output
            .take_last()
            .failed(PlaybackError::Player("exit status: 1".into()));
        pump(&mut s, &mut events);

        assert_eq!(s.status().speaking, Some(VoiceCue::ScanError));
        assert!(!s.status().needs_unlock);
        assert_eq!(output.started().last(), Some(&file(VoiceCue::ScanError)));
    }

    #[test]
    fn test_stale_report_ignored() {
        let (mut s, output, mut events) = create_scheduler();
        s.request(VoiceCue::Intro);
        let stale = output.take_last();
        s.request(VoiceCue::DirBack);

        // Mute, then start something new under a later generation
        s.set_muted(true);
        s.set_muted(false);
        s.request(VoiceCue::Arrival);
        assert_eq!(s.generation(), 2);

        stale.finished();
        pump(&mut s, &mut events);
        assert_eq!(s.status().speaking, Some(VoiceCue::Arrival));
    }

    #[test]
    fn test_blocked_keeps_cue_until_unlock() {
        let (mut s, output, mut events) = create_scheduler();
        s.request(VoiceCue::Intro);
        output.take_last().failed(PlaybackError::Blocked);
        pump(&mut s, &mut events);

        let status = s.status();
        assert!(status.needs_unlock);
        assert_eq!(status.speaking, None);
        assert_eq!(s.pending(), Some(VoiceCue::Intro));
        assert_eq!(output.started().len(), 1);

        s.unlock();
        assert!(!s.status().needs_unlock);
        assert_eq!(s.status().speaking, Some(VoiceCue::Intro));
        assert_eq!(
            output.started(),
            vec![file(VoiceCue::Intro), file(VoiceCue::Intro)]
        );
    }

    #[test]
    fn test_blocked_cue_takes_pending_slot() {
        let (mut s, output, mut events) = create_scheduler();
        s.request(VoiceCue::Intro);
        s.request(VoiceCue::DirLeft);
        output.take_last().failed(PlaybackError::Blocked);
        pump(&mut s, &mut events);

        assert_eq!(s.pending(), Some(VoiceCue::Intro));
        s.unlock();
        assert_eq!(s.status().speaking, Some(VoiceCue::Intro));
        assert_eq!(s.pending(), None);
    }

    #[test]
    fn test_failed_unlock_stays_blocked() {
        let (mut s, output, mut events) = create_scheduler();
        s.request(VoiceCue::Intro);
        output.take_last().failed(PlaybackError::Blocked);
        pump(&mut s, &mut events);

        output.log.lock().unwrap().refuse_unlock = true;
        s.unlock();
        assert!(s.status().needs_unlock);
        assert_eq!(s.pending(), Some(VoiceCue::Intro));
        assert_eq!(output.started().len(), 1);
    }

    #[test]
    fn test_mute_stops_and_clears() {
        let (mut s, output, mut events) = create_scheduler();
        s.request(VoiceCue::Intro);
        s.request(VoiceCue::DirLeft);
        let in_flight = output.take_last();

        s.set_muted(true);
        assert_eq!(output.stops(), 1);
        assert_eq!(s.status().speaking, None);
        assert_eq!(s.pending(), None);

        s.request(VoiceCue::Arrival);
        assert_eq!(output.started().len(), 1);
        assert_eq!(s.pending(), None);

        // Late report from the stopped attempt changes nothing
        in_flight.finished();
        pump(&mut s, &mut events);
        assert_eq!(s.status().speaking, None);

        s.set_muted(false);
        s.request(VoiceCue::Arrival);
        assert_eq!(s.status().speaking, Some(VoiceCue::Arrival));
    }

    #[test]
    fn test_intro_fires_once() {
        let (mut s, output, mut events) = create_scheduler();
        s.announce_intro();
        output.take_last().finished();
        pump(&mut s, &mut events);

        s.announce_intro();
        assert_eq!(output.started(), vec![file(VoiceCue::Intro)]);
    }

    #[test]
    fn test_announce_mappings() {
        let (mut s, output, mut events) = create_scheduler();
        s.announce_direction(Heading::Done);
        output.take_last().finished();
        pump(&mut s, &mut events);

        s.announce_destination_changed();
        output.take_last().finished();
        pump(&mut s, &mut events);

        s.announce_scan_error();

        assert_eq!(
            output.started(),
            vec![
                file(VoiceCue::Arrival),
                file(VoiceCue::DestinationChanged),
                file(VoiceCue::ScanError),
            ]
        );
    }
}
