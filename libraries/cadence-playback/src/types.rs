//! Core types for the player controller

use cadence_artwork::ArtworkData;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::PlayerError;

/// A playable entry in the queue
///
/// Identity is the `id`: two items with the same id are the same media even
/// if their metadata differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Unique identifier
    pub id: String,

    /// Where the engine loads the media from
    pub location: MediaLocation,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name (optional)
    pub album: Option<String>,

    /// Duration when known ahead of loading
    pub duration: Option<Duration>,

    /// Artwork supplied with the item; wins over embedded artwork
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork: Option<ArtworkData>,
}

impl MediaItem {
    /// Create an item for a local file, using the file stem as id and title
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            id: path.to_string_lossy().into_owned(),
            title: stem,
            location: MediaLocation::File(path),
            artist: String::new(),
            album: None,
            duration: None,
            artwork: None,
        }
    }

    /// Local file path, if the item lives on disk
    pub fn path(&self) -> Option<&PathBuf> {
        match &self.location {
            MediaLocation::File(path) => Some(path),
            MediaLocation::Url(_) => None,
        }
    }
}

/// Source location of a media item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaLocation {
    /// Local file
    File(PathBuf),

    /// Remote stream
    Url(String),
}

impl fmt::Display for MediaLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaLocation::File(path) => write!(f, "{}", path.display()),
            MediaLocation::Url(url) => f.write_str(url),
        }
    }
}

/// Playback state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing is playing
    #[default]
    Stopped,

    /// Currently playing
    Playing,

    /// Paused mid-item
    Paused,

    /// Engine is loading or buffering the current item
    Loading,
}

impl PlaybackState {
    /// Whether an item is loaded in the engine (playing, paused or loading)
    pub fn is_active(self) -> bool {
        !matches!(self, PlaybackState::Stopped)
    }
}

/// Repeat mode
///
/// `RepeatMode::NONE` and `RepeatMode::DEFAULT` are the same mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when the queue ends
    #[default]
    Off,

    /// Loop the current item
    One,

    /// Loop the entire queue
    All,
}

impl RepeatMode {
    /// No repeat
    pub const NONE: RepeatMode = RepeatMode::Off;

    /// Mode a fresh player starts with
    pub const DEFAULT: RepeatMode = RepeatMode::Off;
}

impl FromStr for RepeatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" | "default" => Ok(RepeatMode::Off),
            "one" | "single" => Ok(RepeatMode::One),
            "all" | "queue" => Ok(RepeatMode::All),
            other => Err(format!("unknown repeat mode: {other}")),
        }
    }
}

/// How this player's audio mixes with other audio on the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSessionCategory {
    /// Mixes with other audio, silenced by the ringer switch
    Ambient,

    /// Interrupts other audio, silenced by the ringer switch
    SoloAmbient,

    /// Primary playback, keeps playing when silenced
    #[default]
    Playback,

    /// Input only
    Record,

    /// Simultaneous input and output
    PlayAndRecord,

    /// Routes to several outputs at once
    MultiRoute,
}

impl AudioSessionCategory {
    /// Canonical snake_case name
    pub fn as_str(self) -> &'static str {
        match self {
            AudioSessionCategory::Ambient => "ambient",
            AudioSessionCategory::SoloAmbient => "solo_ambient",
            AudioSessionCategory::Playback => "playback",
            AudioSessionCategory::Record => "record",
            AudioSessionCategory::PlayAndRecord => "play_and_record",
            AudioSessionCategory::MultiRoute => "multi_route",
        }
    }
}

impl fmt::Display for AudioSessionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioSessionCategory {
    type Err = PlayerError;

    /// Accepts snake_case, kebab-case and compact spellings, case-insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "ambient" => Ok(AudioSessionCategory::Ambient),
            "soloambient" => Ok(AudioSessionCategory::SoloAmbient),
            "playback" => Ok(AudioSessionCategory::Playback),
            "record" => Ok(AudioSessionCategory::Record),
            "playandrecord" => Ok(AudioSessionCategory::PlayAndRecord),
            "multiroute" => Ok(AudioSessionCategory::MultiRoute),
            _ => Err(PlayerError::UnsupportedCategory(s.to_string())),
        }
    }
}

/// Configuration for a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,

    /// Minimum position change between time updates in ms (default: 1000)
    pub time_update_interval_ms: u64,

    /// "Previous" restarts the current item past this position in ms (default: 3000)
    pub previous_restart_threshold_ms: u64,

    /// Initial audio session category (default: Playback)
    pub session_category: AudioSessionCategory,

    /// Artwork cache entries (default: 32)
    pub artwork_cache_size: usize,

    /// Seed for reproducible shuffle order
    pub shuffle_seed: Option<u64>,
}

impl PlayerConfig {
    pub fn time_update_interval(&self) -> Duration {
        Duration::from_millis(self.time_update_interval_ms)
    }

    pub fn previous_restart_threshold(&self) -> Duration {
        Duration::from_millis(self.previous_restart_threshold_ms)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            repeat: RepeatMode::DEFAULT,
            shuffle: false,
            time_update_interval_ms: 1000,
            previous_restart_threshold_ms: 3000,
            session_category: AudioSessionCategory::Playback,
            artwork_cache_size: 32,
            shuffle_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlayerConfig::default();
        assert_eq!(config.repeat, RepeatMode::Off);
        assert!(!config.shuffle);
        assert_eq!(config.time_update_interval(), Duration::from_secs(1));
        assert_eq!(config.previous_restart_threshold(), Duration::from_secs(3));
        assert_eq!(config.session_category, AudioSessionCategory::Playback);
        assert_eq!(config.artwork_cache_size, 32);
        assert_eq!(config.shuffle_seed, None);
    }

    #[test]
    fn repeat_none_equals_default() {
        assert_eq!(RepeatMode::NONE, RepeatMode::DEFAULT);
        assert_eq!(RepeatMode::NONE, RepeatMode::default());
        assert_ne!(RepeatMode::NONE, RepeatMode::One);
        assert_ne!(RepeatMode::NONE, RepeatMode::All);
    }

    #[test]
    fn playback_state_has_four_distinct_values() {
        let states = [
            PlaybackState::Stopped,
            PlaybackState::Playing,
            PlaybackState::Paused,
            PlaybackState::Loading,
        ];
        let unique: std::collections::HashSet<_> = states.iter().collect();
        assert_eq!(unique.len(), 4);
        assert_ne!(PlaybackState::Stopped, PlaybackState::Loading);
        assert_eq!(PlaybackState::default(), PlaybackState::Stopped);
        assert!(!PlaybackState::Stopped.is_active());
        assert!(PlaybackState::Loading.is_active());
    }

    #[test]
    fn session_category_parsing() {
        assert_eq!(
            "playback".parse::<AudioSessionCategory>().unwrap(),
            AudioSessionCategory::Playback
        );
        assert_eq!(
            "play-and-record".parse::<AudioSessionCategory>().unwrap(),
            AudioSessionCategory::PlayAndRecord
        );
        assert_eq!(
            "SoloAmbient".parse::<AudioSessionCategory>().unwrap(),
            AudioSessionCategory::SoloAmbient
        );
        assert!(matches!(
            "karaoke".parse::<AudioSessionCategory>(),
            Err(PlayerError::UnsupportedCategory(_))
        ));
    }

    #[test]
    fn session_category_round_trips_through_display() {
        for category in [
            AudioSessionCategory::Ambient,
            AudioSessionCategory::SoloAmbient,
            AudioSessionCategory::Playback,
            AudioSessionCategory::Record,
            AudioSessionCategory::PlayAndRecord,
            AudioSessionCategory::MultiRoute,
        ] {
            assert_eq!(
                category.to_string().parse::<AudioSessionCategory>().unwrap(),
                category
            );
        }
    }

    #[test]
    fn repeat_mode_parsing() {
        assert_eq!("none".parse::<RepeatMode>().unwrap(), RepeatMode::NONE);
        assert_eq!("ALL".parse::<RepeatMode>().unwrap(), RepeatMode::All);
        assert_eq!("one".parse::<RepeatMode>().unwrap(), RepeatMode::One);
        assert!("twice".parse::<RepeatMode>().is_err());
    }

    #[test]
    fn media_item_from_path() {
        let item = MediaItem::from_path("/music/Artist - Song.flac");
        assert_eq!(item.title, "Artist - Song");
        assert_eq!(item.id, "/music/Artist - Song.flac");
        assert_eq!(item.path(), Some(&PathBuf::from("/music/Artist - Song.flac")));
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{"repeat":"all","shuffle":true}"#).unwrap();
        assert_eq!(config.repeat, RepeatMode::All);
        assert!(config.shuffle);
        assert_eq!(config.time_update_interval_ms, 1000);
    }
}
