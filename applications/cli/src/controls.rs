//! Interactive playback controls
//!
//! Single-key commands read from stdin while playing.

use cadence_playback::{MediaEngine, PlaybackState, Player, PlayerEvent, RepeatMode};
use std::fmt::Write as _;

/// A keyboard command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// `p`: pause or resume
    TogglePause,
    /// `n`: next item
    Next,
    /// `b`: previous item
    Previous,
    /// `s`: stop
    Stop,
    /// `q`: quit
    Quit,
}

impl Control {
    /// Parse one input line; only the first non-blank character counts
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().chars().next()?.to_ascii_lowercase() {
            'p' => Some(Control::TogglePause),
            'n' => Some(Control::Next),
            'b' => Some(Control::Previous),
            's' => Some(Control::Stop),
            'q' => Some(Control::Quit),
            _ => None,
        }
    }

    /// Apply the command; returns false when the CLI should exit
    pub fn apply<E: MediaEngine>(self, player: &mut Player<E>) -> bool {
        match self {
            Control::TogglePause => match player.playback_state() {
                PlaybackState::Playing | PlaybackState::Loading => player.pause(),
                PlaybackState::Paused | PlaybackState::Stopped => player.play(),
            },
            Control::Next => player.play_next(),
            Control::Previous => player.play_previous(),
            Control::Stop => player.stop(),
            Control::Quit => {
                player.stop();
                return false;
            }
        }
        true
    }
}

/// Help line shown when playback starts
pub const HELP: &str = "[p] pause/resume  [n] next  [b] previous  [s] stop  [q] quit";

/// Why playback came to rest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The last item played to its end
    Finished,
    /// The loaded item failed to load or play
    Failed,
}

/// Tracks the event stream to detect when playback stops on its own
#[derive(Debug, Default)]
pub struct QueueWatcher {
    pending: Option<Halt>,
}

impl QueueWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one event; reports a halt once the player settles in `Stopped`
    /// right after an item finished or failed
    pub fn observe(&mut self, event: &PlayerEvent) -> Option<Halt> {
        match event {
            PlayerEvent::DidFinishPlaying { .. } => {
                self.pending = Some(Halt::Finished);
                None
            }
            PlayerEvent::Failed { .. } => {
                self.pending = Some(Halt::Failed);
                None
            }
            PlayerEvent::WillChangeState { .. } => None,
            PlayerEvent::StateChanged {
                to: PlaybackState::Stopped,
                ..
            } => self.pending.take(),
            _ => {
                self.pending = None;
                None
            }
        }
    }
}

/// Move past a failed item
///
/// Tries the following items in play order until one starts. Returns false
/// when nothing is left to play. A player that already moved on is left
/// alone.
pub fn skip_failed<E: MediaEngine>(player: &mut Player<E>) -> bool {
    if player.playback_state().is_active() {
        return true;
    }

    for _ in 0..player.queue_len() {
        let at_end = match player.index() {
            Some(index) => player.play_order().last() == Some(&index),
            None => true,
        };
        if at_end && player.repeat_mode() != RepeatMode::All {
            return false;
        }

        player.play_next();
        if player.playback_state().is_active() {
            return true;
        }
    }
    false
}

/// One-line description of an event for the console, if it is worth showing
pub fn describe(event: &PlayerEvent) -> Option<String> {
    let mut line = String::new();
    match event {
        PlayerEvent::DidStartPlaying { item } => {
            let _ = write!(line, "▶ {}", item.title);
            if !item.artist.is_empty() {
                let _ = write!(line, " - {}", item.artist);
            }
        }
        PlayerEvent::StateChanged {
            to: PlaybackState::Paused,
            ..
        } => line.push_str("⏸ paused"),
        PlayerEvent::DidStop { item } => {
            let _ = write!(line, "⏹ stopped {}", item.title);
        }
        PlayerEvent::PlaybackDeclined { item } => {
            let _ = write!(line, "skipped {}", item.title);
        }
        PlayerEvent::Failed { item, message } => {
            let _ = write!(line, "✗ {}: {}", item.title, message);
        }
        _ => return None,
    }
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_playback::{
        EngineEvent, LoadStatus, MediaItem, NullEngine, PlayerConfig, PlayerError,
    };
    use std::time::Duration;

    /// Fails to load any item whose title starts with "broken"
    #[derive(Debug, Default)]
    struct BrokenEngine {
        inner: NullEngine,
    }

    impl MediaEngine for BrokenEngine {
        fn load(&mut self, item: &MediaItem) -> cadence_playback::Result<LoadStatus> {
            if item.title.starts_with("broken") {
                return Err(PlayerError::Engine(format!("cannot decode {}", item.title)));
            }
            self.inner.load(item)
        }

        fn play(&mut self) {
            self.inner.play();
        }

        fn pause(&mut self) {
            self.inner.pause();
        }

        fn stop(&mut self) {
            self.inner.stop();
        }

        fn seek(&mut self, position: Duration) -> cadence_playback::Result<()> {
            self.inner.seek(position)
        }

        fn position(&self) -> Duration {
            self.inner.position()
        }

        fn duration(&self) -> Option<Duration> {
            self.inner.duration()
        }

        fn poll_event(&mut self) -> Option<EngineEvent> {
            self.inner.poll_event()
        }
    }

    fn player() -> Player<NullEngine> {
        let mut player = Player::new(NullEngine::new(), PlayerConfig::default());
        player.set_queue(vec![
            MediaItem::from_path("/music/a.flac"),
            MediaItem::from_path("/music/b.flac"),
        ]);
        player
    }

    #[test]
    fn parses_keys() {
        assert_eq!(Control::parse("p"), Some(Control::TogglePause));
        assert_eq!(Control::parse("  N\n"), Some(Control::Next));
        assert_eq!(Control::parse("b"), Some(Control::Previous));
        assert_eq!(Control::parse("stop"), Some(Control::Stop));
        assert_eq!(Control::parse("q"), Some(Control::Quit));
        assert_eq!(Control::parse("x"), None);
        assert_eq!(Control::parse(""), None);
    }

    #[test]
    fn toggle_pause_cycles() {
        let mut player = player();

        assert!(Control::TogglePause.apply(&mut player));
        assert_eq!(player.playback_state(), PlaybackState::Playing);

        Control::TogglePause.apply(&mut player);
        assert_eq!(player.playback_state(), PlaybackState::Paused);

        Control::TogglePause.apply(&mut player);
        assert_eq!(player.playback_state(), PlaybackState::Playing);
    }

    #[test]
    fn quit_stops_and_exits() {
        let mut player = player();
        player.play();

        assert!(!Control::Quit.apply(&mut player));
        assert_eq!(player.playback_state(), PlaybackState::Stopped);
    }

    #[test]
    fn next_and_previous_move_index() {
        let mut player = player();
        player.play();

        Control::Next.apply(&mut player);
        assert_eq!(player.index(), Some(1));

        Control::Previous.apply(&mut player);
        assert_eq!(player.index(), Some(0));
    }

    #[test]
    fn watcher_detects_end_of_queue_only() {
        let item = MediaItem::from_path("/music/a.flac");
        let mut watcher = QueueWatcher::new();

        // Manual stop
        assert_eq!(watcher.observe(&PlayerEvent::DidStop { item: item.clone() }), None);
        assert_eq!(
            watcher.observe(&PlayerEvent::StateChanged {
                from: PlaybackState::Playing,
                to: PlaybackState::Stopped,
            }),
            None
        );

        // Natural end
        assert_eq!(watcher.observe(&PlayerEvent::DidFinishPlaying { item }), None);
        assert_eq!(
            watcher.observe(&PlayerEvent::WillChangeState {
                from: PlaybackState::Playing,
                to: PlaybackState::Stopped,
            }),
            None
        );
        assert_eq!(
            watcher.observe(&PlayerEvent::StateChanged {
                from: PlaybackState::Playing,
                to: PlaybackState::Stopped,
            }),
            Some(Halt::Finished)
        );
    }

    #[test]
    fn watcher_reports_failure_then_stop() {
        let mut player = Player::new(BrokenEngine::default(), PlayerConfig::default());
        player.set_queue(vec![MediaItem::from_path("/music/broken.flac")]);
        let events = player.subscribe();

        player.play();

        let mut watcher = QueueWatcher::new();
        let halts: Vec<Halt> = events
            .drain()
            .iter()
            .filter_map(|event| watcher.observe(event))
            .collect();
        assert_eq!(halts, vec![Halt::Failed]);
    }

    #[test]
    fn watcher_ignores_failure_followed_by_next_item() {
        let item = MediaItem::from_path("/music/broken.flac");
        let mut watcher = QueueWatcher::new();

        assert_eq!(
            watcher.observe(&PlayerEvent::Failed {
                item: item.clone(),
                message: "bad".into()
            }),
            None
        );
        assert_eq!(watcher.observe(&PlayerEvent::WillStartLoading { item }), None);
        assert_eq!(
            watcher.observe(&PlayerEvent::StateChanged {
                from: PlaybackState::Loading,
                to: PlaybackState::Stopped,
            }),
            None
        );
    }

    #[test]
    fn skip_failed_moves_to_next_playable_item() {
        let mut player = Player::new(BrokenEngine::default(), PlayerConfig::default());
        player.set_queue(vec![
            MediaItem::from_path("/music/broken-1.flac"),
            MediaItem::from_path("/music/broken-2.flac"),
            MediaItem::from_path("/music/c.flac"),
        ]);

        player.play();
        assert_eq!(player.playback_state(), PlaybackState::Stopped);

        assert!(skip_failed(&mut player));
        assert_eq!(player.playback_state(), PlaybackState::Playing);
        assert_eq!(player.index(), Some(2));
    }

    #[test]
    fn skip_failed_gives_up_at_end_of_queue() {
        let mut player = Player::new(BrokenEngine::default(), PlayerConfig::default());
        player.set_queue(vec![
            MediaItem::from_path("/music/a.flac"),
            MediaItem::from_path("/music/broken.flac"),
        ]);

        player.play_at_index(1).unwrap();
        assert_eq!(player.playback_state(), PlaybackState::Stopped);
        assert!(!skip_failed(&mut player));
    }

    #[test]
    fn skip_failed_stops_when_everything_fails_with_repeat_all() {
        let config = PlayerConfig {
            repeat: RepeatMode::All,
            ..PlayerConfig::default()
        };
        let mut player = Player::new(BrokenEngine::default(), config);
        player.set_queue(vec![
            MediaItem::from_path("/music/broken-1.flac"),
            MediaItem::from_path("/music/broken-2.flac"),
        ]);

        player.play();
        assert!(!skip_failed(&mut player));
        assert_eq!(player.playback_state(), PlaybackState::Stopped);
    }

    #[test]
    fn skip_failed_leaves_playing_player_alone() {
        let mut player = player();
        player.play();

        assert!(skip_failed(&mut player));
        assert_eq!(player.index(), Some(0));
    }

    #[test]
    fn describes_interesting_events() {
        let item = MediaItem::from_path("/music/a.flac");
        assert_eq!(
            describe(&PlayerEvent::DidStartPlaying { item: item.clone() }).as_deref(),
            Some("▶ a")
        );
        assert!(describe(&PlayerEvent::QueueChanged { length: 1 }).is_none());
        assert!(describe(&PlayerEvent::Failed {
            item,
            message: "bad".into()
        })
        .unwrap()
        .contains("bad"));
    }
}
