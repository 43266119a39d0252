//! Platform playback engine seam
//!
//! The player never decodes or outputs audio itself. A [`MediaEngine`]
//! implementation owns that work (a desktop decoder + output stream, a
//! mobile OS player, a test double) and reports asynchronous progress
//! through [`MediaEngine::poll_event`].

use cadence_artwork::ArtworkData;
use std::time::Duration;

use crate::error::Result;
use crate::types::{AudioSessionCategory, MediaItem};

/// Outcome of [`MediaEngine::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Item is ready to play now
    Ready,

    /// Loading continues in the background; `EngineEvent::Ready` follows
    Pending,
}

/// Asynchronous notifications from the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A pending load completed
    Ready,

    /// Buffered fraction of a streamed item, 0.0 to 1.0
    BufferProgress(f32),

    /// The loaded item reached its end
    Finished,

    /// Loading or playback failed
    Failed(String),
}

/// Platform playback engine
pub trait MediaEngine: Send {
    /// Start loading an item, replacing whatever was loaded
    fn load(&mut self, item: &MediaItem) -> Result<LoadStatus>;

    /// Start or resume output of the loaded item
    fn play(&mut self);

    /// Pause output, keeping the position
    fn pause(&mut self);

    /// Unload the current item
    fn stop(&mut self);

    /// Move the playhead of the loaded item
    fn seek(&mut self, position: Duration) -> Result<()>;

    /// Current playhead position
    fn position(&self) -> Duration;

    /// Duration of the loaded item, if known
    fn duration(&self) -> Option<Duration>;

    /// Next pending engine notification
    fn poll_event(&mut self) -> Option<EngineEvent>;

    /// Apply an audio session category; engines without sessions accept any
    fn set_session_category(&mut self, _category: AudioSessionCategory) -> Result<()> {
        Ok(())
    }

    /// Frame of the loaded item at `time`, for engines that render video
    fn frame_at(&self, _time: Duration) -> Option<ArtworkData> {
        None
    }
}

impl<E: MediaEngine + ?Sized> MediaEngine for Box<E> {
    fn load(&mut self, item: &MediaItem) -> Result<LoadStatus> {
        (**self).load(item)
    }

    fn play(&mut self) {
        (**self).play();
    }

    fn pause(&mut self) {
        (**self).pause();
    }

    fn stop(&mut self) {
        (**self).stop();
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        (**self).seek(position)
    }

    fn position(&self) -> Duration {
        (**self).position()
    }

    fn duration(&self) -> Option<Duration> {
        (**self).duration()
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        (**self).poll_event()
    }

    fn set_session_category(&mut self, category: AudioSessionCategory) -> Result<()> {
        (**self).set_session_category(category)
    }

    fn frame_at(&self, time: Duration) -> Option<ArtworkData> {
        (**self).frame_at(time)
    }
}

/// Engine with no output
///
/// Loads instantly, keeps a playhead that only moves on seek, never
/// finishes. Useful for hosts that only manage the queue.
#[derive(Debug, Default)]
pub struct NullEngine {
    loaded: Option<Duration>,
    position: Duration,
}

impl NullEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MediaEngine for NullEngine {
    fn load(&mut self, item: &MediaItem) -> Result<LoadStatus> {
        self.loaded = Some(item.duration.unwrap_or_default());
        self.position = Duration::ZERO;
        Ok(LoadStatus::Ready)
    }

    fn play(&mut self) {}

    fn pause(&mut self) {}

    fn stop(&mut self) {
        self.loaded = None;
        self.position = Duration::ZERO;
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        self.position = position;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.position
    }

    fn duration(&self) -> Option<Duration> {
        self.loaded.filter(|d| !d.is_zero())
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_engine_tracks_position_and_duration() {
        let mut engine = NullEngine::new();
        let mut item = MediaItem::from_path("/a.mp3");
        item.duration = Some(Duration::from_secs(90));

        assert_eq!(engine.load(&item).unwrap(), LoadStatus::Ready);
        assert_eq!(engine.duration(), Some(Duration::from_secs(90)));

        engine.seek(Duration::from_secs(12)).unwrap();
        assert_eq!(engine.position(), Duration::from_secs(12));
        assert!(engine.poll_event().is_none());

        engine.stop();
        assert_eq!(engine.duration(), None);
        assert_eq!(engine.position(), Duration::ZERO);
    }

    #[test]
    fn boxed_engines_delegate() {
        let mut engine: Box<dyn MediaEngine> = Box::new(NullEngine::new());
        engine.load(&MediaItem::from_path("/a.mp3")).unwrap();
        engine.seek(Duration::from_secs(3)).unwrap();
        assert_eq!(engine.position(), Duration::from_secs(3));
        assert!(engine
            .set_session_category(AudioSessionCategory::Ambient)
            .is_ok());
        assert!(engine.frame_at(Duration::ZERO).is_none());
    }
}
