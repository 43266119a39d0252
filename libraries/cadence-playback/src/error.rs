//! Error types for the player controller

use std::time::Duration;
use thiserror::Error;

/// Player errors
///
/// Returned synchronously for invalid indices, seeks and session changes.
/// Engine failures during playback are reported as `PlayerEvent::Failed`.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// Index out of bounds
    #[error("Index {index} out of bounds for queue of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// No item is loaded in the engine
    #[error("No item loaded")]
    NoItemLoaded,

    /// Invalid seek position
    #[error("Invalid seek position: {0:?}")]
    InvalidSeekPosition(Duration),

    /// Audio session category name not recognised
    #[error("Unsupported audio session category: {0}")]
    UnsupportedCategory(String),

    /// Engine refused the audio session category
    #[error("Audio session rejected category: {0}")]
    SessionRejected(String),

    /// Platform engine error
    #[error("Engine error: {0}")]
    Engine(String),

    /// Artwork extraction error
    #[error("Artwork error: {0}")]
    Artwork(#[from] cadence_artwork::ArtworkError),
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;
