//! Cross-player notifications
//!
//! Players that share a [`NotificationCenter`] can ask each other to yield
//! output: `pause_other_players` / `stop_other_players` post a
//! [`PlayerNotification`] to every registered player except the sender.
//! Hosts can also post on behalf of the system (e.g. an audio interruption).

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Requests broadcast between players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerNotification {
    /// Pause playback
    Pause,

    /// Stop playback
    Stop,
}

impl PlayerNotification {
    /// Stable name of the pause notification
    pub const PAUSE_NAME: &'static str = "cadence.player.pause";

    /// Stable name of the stop notification
    pub const STOP_NAME: &'static str = "cadence.player.stop";

    pub fn name(self) -> &'static str {
        match self {
            PlayerNotification::Pause => Self::PAUSE_NAME,
            PlayerNotification::Stop => Self::STOP_NAME,
        }
    }

    /// Look up a notification by its stable name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            Self::PAUSE_NAME => Some(PlayerNotification::Pause),
            Self::STOP_NAME => Some(PlayerNotification::Stop),
            _ => None,
        }
    }
}

impl fmt::Display for PlayerNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of a registered player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    players: Vec<(PlayerId, Sender<PlayerNotification>)>,
}

/// Shared routing table for player notifications
///
/// Cloning is cheap; clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    registry: Arc<Mutex<Registry>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a player and return its inbox
    ///
    /// Dropping the inbox unregisters the player.
    pub fn register(&self) -> Inbox {
        let (sender, receiver) = unbounded();
        let mut registry = self.lock();
        let id = PlayerId(registry.next_id);
        registry.next_id += 1;
        registry.players.push((id, sender));

        Inbox {
            id,
            receiver,
            center: self.clone(),
        }
    }

    /// Deliver a notification to every player except `sender`
    ///
    /// Returns the number of players it reached.
    pub fn post(&self, sender: Option<PlayerId>, notification: PlayerNotification) -> usize {
        let mut registry = self.lock();
        let mut delivered = 0;

        registry.players.retain(|(id, tx)| {
            if Some(*id) == sender {
                return true;
            }
            let alive = tx.send(notification).is_ok();
            if alive {
                delivered += 1;
            }
            alive
        });

        tracing::debug!(
            notification = notification.name(),
            ?sender,
            delivered,
            "posted player notification"
        );
        delivered
    }

    /// Deliver a notification to every registered player
    pub fn broadcast(&self, notification: PlayerNotification) -> usize {
        self.post(None, notification)
    }

    pub fn player_count(&self) -> usize {
        self.lock().players.len()
    }

    fn unregister(&self, id: PlayerId) {
        self.lock().players.retain(|(player, _)| *player != id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A player's registration with a [`NotificationCenter`]
#[derive(Debug)]
pub struct Inbox {
    id: PlayerId,
    receiver: Receiver<PlayerNotification>,
    center: NotificationCenter,
}

impl Inbox {
    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// Center this inbox is registered with
    pub fn center(&self) -> &NotificationCenter {
        &self.center
    }

    /// Pending notifications, oldest first
    pub fn drain(&self) -> Vec<PlayerNotification> {
        self.receiver.try_iter().collect()
    }

    /// Post to every other player registered with the same center
    pub fn post_to_others(&self, notification: PlayerNotification) -> usize {
        self.center.post(Some(self.id), notification)
    }
}

impl Drop for Inbox {
    fn drop(&mut self) {
        self.center.unregister(self.id);
    }
}
