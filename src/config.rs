//! Configuration loading and management
//!
//! Defaults live under `~/.local/share/qr-wayfinder`. An optional
//! `config.toml` there (or at `$WAYFINDER_CONFIG`) overrides them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "WAYFINDER_CONFIG";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Destination label at startup; first graph destination when unset
    pub default_destination: Option<String>,

    /// Graph file; the built-in campus graph when unset
    pub graph_path: Option<PathBuf>,

    pub scan: ScanConfig,
    pub voice: VoiceConfig,
}

/// Scan input settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Detections within this window of the last forwarded scan are dropped
    pub lockout: Duration,
}

/// Voice output settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceConfig {
    /// Directory holding the cue recordings
    pub audio_dir: PathBuf,
    /// Player command line; the cue file is appended. Empty logs cues instead.
    pub player: Vec<String>,
    /// Refuse playback until the first user gesture
    pub require_gesture: bool,
    /// Queue the intro as soon as the daemon starts
    pub intro_on_start: bool,
    /// Simulated clip length when no player is configured
    pub log_clip: Duration,
    /// Short clip the player runs on every unlock gesture
    pub unlock_clip: Option<PathBuf>,
}

/// On-disk representation, every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    socket_path: Option<PathBuf>,
    default_destination: Option<String>,
    graph_path: Option<PathBuf>,
    scan: FileScan,
    voice: FileVoice,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileScan {
    lockout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileVoice {
    audio_dir: Option<PathBuf>,
    player: Option<Vec<String>>,
    require_gesture: Option<bool>,
    intro_on_start: Option<bool>,
    log_clip_ms: Option<u64>,
    unlock_clip: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment, config file and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("qr-wayfinder");

        let (path, explicit) = match std::env::var_os(CONFIG_ENV) {
            Some(path) => (PathBuf::from(path), true),
            None => (data_dir.join("config.toml"), false),
        };

        if !explicit && !path.exists() {
            return Self::from_toml(data_dir, "");
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(data_dir, &contents)
            .with_context(|| format!("invalid config at {}", path.display()))
    }

    /// Resolve configuration from TOML text, relative to `data_dir`
    pub fn from_toml(data_dir: PathBuf, contents: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(contents).context("failed to parse config")?;

        let relative = |path: PathBuf| resolve(&data_dir, path);

        let voice = VoiceConfig {
            audio_dir: file
                .voice
                .audio_dir
                .map(relative)
                .unwrap_or_else(|| data_dir.join("audio")),
            player: file
                .voice
                .player
                .unwrap_or_else(|| vec!["mpg123".to_string(), "-q".to_string()]),
            require_gesture: file.voice.require_gesture.unwrap_or(false),
            intro_on_start: file.voice.intro_on_start.unwrap_or(true),
            log_clip: Duration::from_millis(file.voice.log_clip_ms.unwrap_or(1500)),
            unlock_clip: file.voice.unlock_clip.map(relative),
        };

        Ok(Self {
            socket_path: file
                .socket_path
                .map(relative)
                .unwrap_or_else(|| data_dir.join("wayfinder.sock")),
            default_destination: file.default_destination,
            graph_path: file.graph_path.map(relative),
            scan: ScanConfig {
                lockout: Duration::from_millis(file.scan.lockout_ms.unwrap_or(1000)),
            },
            voice,
            data_dir,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[test]
    fn test_defaults() {
        let config = assert_ok!(Config::from_toml(PathBuf::from("/data"), ""));
        assert_eq!(config.socket_path, PathBuf::from("/data/wayfinder.sock"));
        assert_eq!(config.voice.audio_dir, PathBuf::from("/data/audio"));
        assert_eq!(config.voice.player, vec!["mpg123", "-q"]);
        assert_eq!(config.scan.lockout, Duration::from_millis(1000));
        assert!(config.voice.intro_on_start);
        assert!(!config.voice.require_gesture);
        assert_eq!(config.graph_path, None);
        assert_eq!(config.default_destination, None);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_toml(
            PathBuf::from("/data"),
            r#"
default_destination = "Main Stairs"
graph_path = "floor2.toml"

[scan]
lockout_ms = 0

[voice]
audio_dir = "/opt/cues"
player = []
require_gesture = true
unlock_clip = "audio/silence.mp3"
"#,
        )
        .unwrap();

        assert_eq!(config.default_destination.as_deref(), Some("Main Stairs"));
        assert_eq!(config.graph_path, Some(PathBuf::from("/data/floor2.toml")));
        assert_eq!(config.scan.lockout, Duration::ZERO);
        assert_eq!(config.voice.audio_dir, PathBuf::from("/opt/cues"));
        assert!(config.voice.player.is_empty());
        assert!(config.voice.require_gesture);
        assert_eq!(
            config.voice.unlock_clip,
            Some(PathBuf::from("/data/audio/silence.mp3"))
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = Config::from_toml(PathBuf::from("/data"), "volume = 11\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_load() {
        // Reads the real environment; only the fallback path is asserted
        if std::env::var_os(CONFIG_ENV).is_none() {
            if let Ok(config) = Config::load() {
                assert!(config.socket_path.to_string_lossy().contains("qr-wayfinder"));
            }
        }
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_toml(dir.path().join("nested").join("data"), "").unwrap();
        config.ensure_dirs().unwrap();
        assert!(config.data_dir.is_dir());
    }
}
