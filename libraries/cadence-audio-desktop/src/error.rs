/// Desktop engine errors
use thiserror::Error;

/// Result type for desktop audio operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio errors
#[derive(Debug, Error)]
pub enum AudioError {
    /// Device not found
    #[error("Audio device not found")]
    DeviceNotFound,

    /// Failed to build output stream
    #[error("Failed to build output stream: {0}")]
    StreamBuildError(String),

    /// Failed to play stream
    #[error("Failed to play stream: {0}")]
    PlayError(String),

    /// Failed to pause stream
    #[error("Failed to pause stream: {0}")]
    PauseError(String),

    /// Failed to open or probe a file
    #[error("Failed to open {path}: {reason}")]
    OpenError { path: String, reason: String },

    /// Decoding error
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Sample rate conversion error
    #[error("Sample rate conversion error: {0}")]
    ResampleError(String),

    /// Seek failed or out of range
    #[error("Seek error: {0}")]
    SeekError(String),

    /// Location kind the desktop engine cannot load
    #[error("Unsupported location: {0}")]
    UnsupportedLocation(String),

    /// Audio thread is gone
    #[error("Audio thread stopped")]
    ThreadStopped,

    /// Failed to spawn a worker thread
    #[error("Failed to spawn thread: {0}")]
    ThreadSpawn(String),

    /// CPAL error
    #[error("CPAL error: {0}")]
    CpalError(String),
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        AudioError::StreamBuildError(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AudioError::PlayError(err.to_string())
    }
}

impl From<cpal::PauseStreamError> for AudioError {
    fn from(err: cpal::PauseStreamError) -> Self {
        AudioError::PauseError(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for AudioError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        AudioError::CpalError(err.to_string())
    }
}

impl From<AudioError> for cadence_playback::PlayerError {
    fn from(err: AudioError) -> Self {
        cadence_playback::PlayerError::Engine(err.to_string())
    }
}
