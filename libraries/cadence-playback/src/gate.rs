//! Start gate
//!
//! Asked before the player starts any item. Unlike events, the gate answers:
//! returning `false` keeps the item from playing.

use crate::types::MediaItem;

/// Decides whether an item may start playing
pub trait PlaybackGate: Send + Sync {
    fn should_start(&self, item: &MediaItem) -> bool;
}

/// Gate that lets every item play
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PlaybackGate for AllowAll {
    fn should_start(&self, _item: &MediaItem) -> bool {
        true
    }
}

impl<F> PlaybackGate for F
where
    F: Fn(&MediaItem) -> bool + Send + Sync,
{
    fn should_start(&self, item: &MediaItem) -> bool {
        self(item)
    }
}
