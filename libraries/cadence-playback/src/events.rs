//! Player events
//!
//! Every observable transition of the player is published as a
//! [`PlayerEvent`] on an [`EventBus`]. Any number of subscribers can listen;
//! each gets its own channel and can cancel independently.
//!
//! Events are emitted synchronously, in the order the transition produced
//! them, e.g. `WillChangeState` -> `StateChanged` -> `DidStartPlaying`.

use crossbeam_channel::{unbounded, Receiver, Sender, TryIter};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{MediaItem, PlaybackState, RepeatMode};

/// Events emitted by the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// State is about to change
    WillChangeState {
        from: PlaybackState,
        to: PlaybackState,
    },

    /// State changed
    StateChanged {
        from: PlaybackState,
        to: PlaybackState,
    },

    /// The start gate refused to play this item
    PlaybackDeclined { item: MediaItem },

    /// Engine started loading an item
    WillStartLoading { item: MediaItem },

    /// Engine finished loading an item
    DidEndLoading { item: MediaItem },

    /// Output started for an item
    DidStartPlaying { item: MediaItem },

    /// An item played to its end
    DidFinishPlaying { item: MediaItem },

    /// Playback of an item was stopped before its end
    DidStop { item: MediaItem },

    /// Position moved (periodic while playing, and after seeks)
    CurrentTimeChanged {
        position: Duration,
        duration: Option<Duration>,
    },

    RepeatModeChanged { mode: RepeatMode },

    ShuffleModeChanged { enabled: bool },

    /// Buffering progress of a streamed item, 0.0 to 1.0
    StreamingProgress { item: MediaItem, progress: f32 },

    /// The engine failed while loading or playing an item
    Failed { item: MediaItem, message: String },

    /// Queue contents changed
    QueueChanged { length: usize },

    /// Current index changed
    IndexChanged { index: Option<usize> },
}

/// Identifier of a subscription, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// A subscriber's end of the event stream
///
/// Dropping the subscription cancels it; the bus prunes the dead channel on
/// the next emit.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: Receiver<PlayerEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next pending event without blocking
    pub fn try_recv(&self) -> Option<PlayerEvent> {
        self.receiver.try_recv().ok()
    }

    /// Block until the next event; `None` once the subscription is cancelled
    pub fn recv(&self) -> Option<PlayerEvent> {
        self.receiver.recv().ok()
    }

    /// Block for at most `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Option<PlayerEvent> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Iterate over pending events without blocking
    pub fn try_iter(&self) -> TryIter<'_, PlayerEvent> {
        self.receiver.try_iter()
    }

    /// Collect all pending events
    pub fn drain(&self) -> Vec<PlayerEvent> {
        self.receiver.try_iter().collect()
    }

    /// Underlying channel, for use with `crossbeam_channel::select!`
    pub fn receiver(&self) -> &Receiver<PlayerEvent> {
        &self.receiver
    }
}

/// Fan-out of player events to subscribers
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriptionId, Sender<PlayerEvent>)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&mut self) -> Subscription {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let (sender, receiver) = unbounded();
        self.subscribers.push((id, sender));
        Subscription { id, receiver }
    }

    /// Cancel a subscription; returns whether it was registered
    ///
    /// The subscriber's receiver reports disconnection once drained.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    /// Deliver an event to every live subscriber
    pub fn emit(&mut self, event: PlayerEvent) {
        tracing::trace!(?event, "player event");
        // A failed send means the receiver was dropped
        self.subscribers
            .retain(|(_, sender)| sender.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
