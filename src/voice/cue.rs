//! Voice cues and their audio resources

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::navigation::Heading;

/// A spoken feedback event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VoiceCue {
    Intro,
    Waiting,
    DirForward,
    DirLeft,
    DirRight,
    DirBack,
    Arrival,
    DestinationChanged,
    ScanError,
}

impl VoiceCue {
    /// Every cue, in table order
    pub const ALL: [VoiceCue; 9] = [
        VoiceCue::Intro,
        VoiceCue::Waiting,
        VoiceCue::DirForward,
        VoiceCue::DirLeft,
        VoiceCue::DirRight,
        VoiceCue::DirBack,
        VoiceCue::Arrival,
        VoiceCue::DestinationChanged,
        VoiceCue::ScanError,
    ];

    /// Cue announcing `heading`
    pub fn for_heading(heading: Heading) -> Self {
        match heading {
            Heading::Forward => VoiceCue::DirForward,
            Heading::Left => VoiceCue::DirLeft,
            Heading::Right => VoiceCue::DirRight,
            Heading::Back => VoiceCue::DirBack,
            Heading::Done => VoiceCue::Arrival,
        }
    }

    /// Default file name of the recording for this cue
    pub fn file_name(self) -> &'static str {
        match self {
            VoiceCue::Intro => "intro_start.mp3",
            VoiceCue::Waiting => "scan_waiting.mp3",
            VoiceCue::DirForward => "dir_forward.mp3",
            VoiceCue::DirLeft => "dir_left.mp3",
            VoiceCue::DirRight => "dir_right.mp3",
            VoiceCue::DirBack => "dir_back.mp3",
            VoiceCue::Arrival => "arrival.mp3",
            VoiceCue::DestinationChanged => "dest_changed.mp3",
            VoiceCue::ScanError => "scan_error.mp3",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for VoiceCue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VoiceCue::Intro => "intro",
            VoiceCue::Waiting => "waiting",
            VoiceCue::DirForward => "dir-forward",
            VoiceCue::DirLeft => "dir-left",
            VoiceCue::DirRight => "dir-right",
            VoiceCue::DirBack => "dir-back",
            VoiceCue::Arrival => "arrival",
            VoiceCue::DestinationChanged => "destination-changed",
            VoiceCue::ScanError => "scan-error",
        };
        write!(f, "{name}")
    }
}

/// Fixed mapping from each cue to one playable resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueTable {
    resources: [String; 9],
}

impl CueTable {
    /// Build a table from a resource per cue
    pub fn from_fn(mut resource: impl FnMut(VoiceCue) -> String) -> Self {
        Self {
            resources: VoiceCue::ALL.map(&mut resource),
        }
    }

    /// Default recordings located in `audio_dir`
    pub fn in_dir(audio_dir: &Path) -> Self {
        Self::from_fn(|cue| audio_dir.join(cue.file_name()).to_string_lossy().into_owned())
    }

    /// Resource for `cue`
    pub fn resource(&self, cue: VoiceCue) -> &str {
        &self.resources[cue.index()]
    }
}
