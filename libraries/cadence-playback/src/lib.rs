//! Cadence - Queue Player Controller
//!
//! Platform-agnostic media player controller for Cadence.
//!
//! This crate provides:
//! - A media queue with stable insertion order and a separate play order
//! - Shuffle (current item kept first) and repeat modes (Off, One, All)
//! - A playback state machine (Stopped, Loading, Playing, Paused)
//! - A start gate consulted before any item plays
//! - Typed player events with any number of subscribers
//! - Cross-player pause/stop notifications
//! - Representative thumbnails from item or embedded artwork
//!
//! # Architecture
//!
//! `cadence-playback` does no decoding or audio output:
//! - No dependency on CPAL (desktop audio)
//! - No dependency on any UI toolkit
//! - The host owns the [`Player`] handle and calls [`Player::tick`]
//!
//! Platform-specific work (loading, output, buffering) is provided by a
//! [`MediaEngine`] implementation.
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use cadence_playback::{MediaItem, NullEngine, PlaybackState, Player, PlayerConfig};
//!
//! let mut player = Player::new(NullEngine::new(), PlayerConfig::default());
//! let events = player.subscribe();
//!
//! player.add_media(MediaItem::from_path("/music/one.flac"));
//! player.add_media(MediaItem::from_path("/music/two.flac"));
//!
//! player.play();
//! assert_eq!(player.playback_state(), PlaybackState::Playing);
//! assert_eq!(player.index(), Some(0));
//!
//! player.play_next();
//! assert_eq!(player.index(), Some(1));
//!
//! for event in events.drain() {
//!     println!("{event:?}");
//! }
//! ```
//!
//! # Example: Gating Playback
//!
//! ```rust
//! use cadence_playback::{MediaItem, NullEngine, PlaybackState, Player};
//!
//! let mut player: Player<NullEngine> = Player::default();
//! player.set_gate(|item: &MediaItem| !item.id.ends_with(".wav"));
//!
//! player.add_media(MediaItem::from_path("/music/huge.wav"));
//! player.play();
//! assert_eq!(player.playback_state(), PlaybackState::Stopped);
//! ```
//!
//! # Example: Shuffle and Repeat
//!
//! ```rust
//! use cadence_playback::{NullEngine, Player, RepeatMode};
//!
//! let mut player: Player<NullEngine> = Player::default();
//! player.set_shuffle_enabled(true);
//! player.set_repeat_mode(RepeatMode::All);
//! assert!(player.shuffle_mode());
//! ```

mod engine;
mod error;
mod events;
mod gate;
mod notifications;
mod player;
mod queue;
mod shuffle;
pub mod types;

// Public exports
pub use engine::{EngineEvent, LoadStatus, MediaEngine, NullEngine};
pub use error::{PlayerError, Result};
pub use events::{EventBus, PlayerEvent, Subscription, SubscriptionId};
pub use gate::{AllowAll, PlaybackGate};
pub use notifications::{Inbox, NotificationCenter, PlayerId, PlayerNotification};
pub use player::Player;
pub use queue::{MediaQueue, RemovedItem};
pub use shuffle::{shuffle_rng, shuffled_order};
pub use types::{
    AudioSessionCategory, MediaItem, MediaLocation, PlaybackState, PlayerConfig, RepeatMode,
};

// Re-exported so hosts can work with thumbnails without a direct dependency
pub use cadence_artwork::ArtworkData;
