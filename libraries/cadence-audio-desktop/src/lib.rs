//! Desktop media engine for Cadence
//!
//! This crate provides the [`DesktopEngine`] implementation of
//! [`cadence_playback::MediaEngine`] for cross-platform desktop playback,
//! and [`DesktopPlayback`], which runs a player on a background tick thread.
//!
//! # Features
//!
//! - Local file decoding with Symphonia (MP3, FLAC, OGG, WAV, AAC, ...)
//! - Automatic sample rate conversion to the device rate (rubato)
//! - Output through CPAL on a dedicated audio thread
//!
//! # Example
//!
//! ```no_run
//! use cadence_audio_desktop::DesktopPlayback;
//! use cadence_playback::{MediaItem, PlayerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let playback = DesktopPlayback::new(PlayerConfig::default())?;
//! let events = playback.subscribe();
//!
//! playback.with_player(|player| {
//!     player.add_media(MediaItem::from_path("/music/track.flac"));
//!     player.play();
//! });
//!
//! while let Some(event) = events.recv() {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
pub mod playback;
pub mod source;

pub use engine::DesktopEngine;
pub use error::{AudioError, Result};
pub use playback::{DesktopPlayback, DEFAULT_TICK_INTERVAL};
pub use source::LocalSource;
