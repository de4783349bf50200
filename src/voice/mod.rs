//! Voice guidance module
//!
//! Serializes spoken cues onto a single audio output:
//! - Cue: the fixed cue set and its resource table
//! - Output: the audio seam, generation-tagged completions, built-in outputs
//! - Scheduler: depth-one replace-latest queue with unlock recovery
//! - Service: tokio actor wrapping the scheduler

mod cue;
mod output;
mod scheduler;
mod service;

#[cfg(test)]
pub(crate) mod fake;

pub use cue::{CueTable, VoiceCue};
pub use output::{AudioOutput, CommandOutput, Completion, LogOutput, PlaybackError, PlaybackEvent};
pub use scheduler::{CueScheduler, VoiceStatus};
pub use service::{VoiceCommand, VoiceHandle, VoiceService};
