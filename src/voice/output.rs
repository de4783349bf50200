//! Audio output seam
//!
//! An `AudioOutput` starts playback and reports the outcome later through
//! the `Completion` it was handed. Each `Completion` carries the generation
//! of the attempt, which lets the scheduler discard reports from attempts
//! it has already moved past.

use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Reasons a playback attempt did not complete normally
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Output refuses to start until an explicit user gesture unlocks it
    #[error("playback blocked until a user gesture unlocks audio")]
    Blocked,

    #[error("audio I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("player exited unsuccessfully: {0}")]
    Player(String),
}

/// Outcome of one playback attempt
#[derive(Debug)]
pub struct PlaybackEvent {
    pub generation: u64,
    pub result: Result<(), PlaybackError>,
}

/// One-shot reporter for a single playback attempt
#[derive(Debug)]
pub struct Completion {
    generation: u64,
    events: mpsc::UnboundedSender<PlaybackEvent>,
}

impl Completion {
    pub(crate) fn new(generation: u64, events: mpsc::UnboundedSender<PlaybackEvent>) -> Self {
        Self { generation, events }
    }

    /// Generation of the attempt this reporter belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report natural end of playback
    pub fn finished(self) {
        self.report(Ok(()));
    }

    /// Report that playback failed or could not start
    pub fn failed(self, error: PlaybackError) {
        self.report(Err(error));
    }

    fn report(self, result: Result<(), PlaybackError>) {
        // Receiver is gone only when the scheduler has shut down
        let _ = self.events.send(PlaybackEvent {
            generation: self.generation,
            result,
        });
    }
}

/// The single audio output handle owned by the scheduler
pub trait AudioOutput: Send {
    /// Begin playing `resource`, reporting the outcome through `completion`
    fn start(&mut self, resource: &str, completion: Completion);

    /// Stop whatever is playing right now
    fn stop(&mut self);

    /// Satisfy the output's user-gesture requirement
    fn unlock(&mut self) -> Result<(), PlaybackError>;
}

impl<T: AudioOutput + ?Sized> AudioOutput for Box<T> {
    fn start(&mut self, resource: &str, completion: Completion) {
        (**self).start(resource, completion);
    }

    fn stop(&mut self) {
        (**self).stop();
    }

    fn unlock(&mut self) -> Result<(), PlaybackError> {
        (**self).unlock()
    }
}

/// Output that logs each cue and completes after a fixed clip length
///
/// Used when no external player is configured.
pub struct LogOutput {
    clip: Duration,
    locked: bool,
    task: Option<JoinHandle<()>>,
}

impl LogOutput {
    pub fn new(clip: Duration, require_gesture: bool) -> Self {
        Self {
            clip,
            locked: require_gesture,
            task: None,
        }
    }
}

impl AudioOutput for LogOutput {
    fn start(&mut self, resource: &str, completion: Completion) {
        if self.locked {
            completion.failed(PlaybackError::Blocked);
            return;
        }
        self.stop();

        info!(resource, generation = completion.generation(), "speaking");
        let clip = self.clip;
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(clip).await;
            completion.finished();
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn unlock(&mut self) -> Result<(), PlaybackError> {
        self.locked = false;
        Ok(())
    }
}

/// Output that plays each resource with an external player process
///
/// The resource path is appended to the configured command line. Stopping
/// kills the running player.
pub struct CommandOutput {
    program: String,
    args: Vec<String>,
    locked: bool,
    unlock_clip: Option<String>,
    cancel: Option<oneshot::Sender<()>>,
}

impl CommandOutput {
    pub fn new(program: String, args: Vec<String>, require_gesture: bool) -> Self {
        Self {
            program,
            args,
            locked: require_gesture,
            unlock_clip: None,
            cancel: None,
        }
    }

    /// Play `clip` (usually a short silence) on every unlock
    pub fn with_unlock_clip(mut self, clip: impl Into<String>) -> Self {
        self.unlock_clip = Some(clip.into());
        self
    }

    fn command(&self, resource: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(resource)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

impl AudioOutput for CommandOutput {
    fn start(&mut self, resource: &str, completion: Completion) {
        if self.locked {
            completion.failed(PlaybackError::Blocked);
            return;
        }
        self.stop();

        let mut child = match self.command(resource).spawn() {
            Ok(child) => child,
            Err(e) => {
                completion.failed(PlaybackError::Io(e));
                return;
            }
        };

        debug!(program = %self.program, resource, "player spawned");

        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        self.cancel = Some(cancel_tx);

        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if status.success() => completion.finished(),
                    Ok(status) => completion.failed(PlaybackError::Player(status.to_string())),
                    Err(e) => completion.failed(PlaybackError::Io(e)),
                },
                // Fires on stop() or when the next start() replaces the sender;
                // the child is killed when dropped at the end of this task.
                _ = &mut cancel_rx => {
                    debug!("player stopped");
                }
            }
        });
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    fn unlock(&mut self) -> Result<(), PlaybackError> {
        if let Some(clip) = &self.unlock_clip {
            // Stays locked when the player cannot even be launched
            let mut child = self.command(clip).spawn()?;
            debug!(program = %self.program, clip = %clip, "unlock clip spawned");
            tokio::spawn(async move {
                if let Err(e) = child.wait().await {
                    debug!(?e, "unlock clip did not finish");
                }
            });
        }
        self.locked = false;
        Ok(())
    }
}
