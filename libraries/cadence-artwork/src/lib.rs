//! Cadence Artwork - thumbnails for queued media
//!
//! Extracts embedded artwork (album covers) from audio files using Lofty.
//! The playback controller uses it as the representative thumbnail of a
//! media item when the item carries no artwork of its own.
//!
//! # Features
//!
//! - Extract embedded artwork from audio files (ID3v2 APIC, FLAC pictures, MP4 covr)
//! - LRU caching keyed by canonical path
//! - Size limits to prevent memory issues
//!
//! # Example
//!
//! ```no_run
//! use cadence_artwork::ArtworkExtractor;
//! use std::path::Path;
//!
//! let extractor = ArtworkExtractor::new(32);
//!
//! match extractor.extract(Path::new("music/track.mp3")) {
//!     Ok(Some(artwork)) => {
//!         println!("{} bytes of {}", artwork.data.len(), artwork.mime_type);
//!     }
//!     Ok(None) => println!("No artwork found"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

mod error;
mod extractor;
mod types;

pub use error::{ArtworkError, Result};
pub use extractor::ArtworkExtractor;
pub use types::ArtworkData;
