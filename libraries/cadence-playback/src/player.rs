//! Player - queue, state machine and engine orchestration
//!
//! Coordinates the queue, repeat/shuffle modes, the start gate, the platform
//! engine and event publication. Commands are fire-and-forget: failures that
//! happen inside the engine surface as `PlayerEvent::Failed`, only argument
//! validation is reported synchronously.

use cadence_artwork::{ArtworkData, ArtworkExtractor};
use rand::rngs::StdRng;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    engine::{EngineEvent, LoadStatus, MediaEngine},
    error::{PlayerError, Result},
    events::{EventBus, PlayerEvent, Subscription, SubscriptionId},
    gate::{AllowAll, PlaybackGate},
    notifications::{Inbox, NotificationCenter, PlayerId, PlayerNotification},
    queue::MediaQueue,
    shuffle::shuffle_rng,
    types::{AudioSessionCategory, MediaItem, PlaybackState, PlayerConfig, RepeatMode},
};

/// Queue-based media player
///
/// Owns:
/// - the queue and its play order (shuffle)
/// - the playback state machine (Stopped, Loading, Playing, Paused)
/// - repeat mode and audio session category
/// - the platform engine that does the actual decoding and output
/// - the event bus and an optional notification inbox
///
/// The host drives asynchronous work by calling [`Player::tick`]
/// periodically (engine completions, time updates, notifications).
pub struct Player<E: MediaEngine> {
    engine: E,
    config: PlayerConfig,

    // Queue and state
    queue: MediaQueue,
    state: PlaybackState,
    repeat: RepeatMode,
    session_category: AudioSessionCategory,

    // Item currently handed to the engine
    loaded: Option<MediaItem>,
    // Start output when a pending load completes (cleared by pause while loading)
    resume_on_ready: bool,
    last_reported_position: Option<Duration>,

    gate: Box<dyn PlaybackGate>,
    events: EventBus,
    inbox: Option<Inbox>,
    rng: StdRng,
    artwork: ArtworkExtractor,
}

impl<E: MediaEngine> Player<E> {
    /// Create a player around an engine
    pub fn new(mut engine: E, config: PlayerConfig) -> Self {
        let mut rng = shuffle_rng(config.shuffle_seed);
        let mut queue = MediaQueue::new();
        if config.shuffle {
            queue.set_shuffled(true, &mut rng);
        }

        if let Err(e) = engine.set_session_category(config.session_category) {
            warn!(
                category = %config.session_category,
                error = %e,
                "Engine rejected initial audio session category"
            );
        }

        Self {
            engine,
            queue,
            state: PlaybackState::Stopped,
            repeat: config.repeat,
            session_category: config.session_category,
            loaded: None,
            resume_on_ready: true,
            last_reported_position: None,
            gate: Box::new(AllowAll),
            events: EventBus::new(),
            inbox: None,
            rng,
            artwork: ArtworkExtractor::new(config.artwork_cache_size),
            config,
        }
    }

    /// Create a player registered with a notification center
    pub fn with_notifications(engine: E, config: PlayerConfig, center: &NotificationCenter) -> Self {
        let mut player = Self::new(engine, config);
        player.inbox = Some(center.register());
        player
    }

    /// Install the gate consulted before any item starts
    pub fn set_gate(&mut self, gate: impl PlaybackGate + 'static) {
        self.gate = Box::new(gate);
    }

    /// Identity within the notification center, if registered
    pub fn player_id(&self) -> Option<PlayerId> {
        self.inbox.as_ref().map(Inbox::id)
    }

    // ===== Events =====

    /// Subscribe to player events
    pub fn subscribe(&mut self) -> Subscription {
        self.events.subscribe()
    }

    /// Cancel a subscription
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ===== Queue Management =====

    /// Append an item to the queue
    pub fn add_media(&mut self, item: MediaItem) {
        self.queue.push(item, &mut self.rng);
        self.emit_queue_changed();
    }

    /// Remove the item at `index`
    ///
    /// Removing the item that is playing, paused or loading stops playback.
    pub fn remove_media_at(&mut self, index: usize) -> Result<MediaItem> {
        let len = self.queue.len();
        let previous_index = self.queue.index();
        let removed = self
            .queue
            .remove(index)
            .ok_or(PlayerError::IndexOutOfBounds { index, len })?;

        if removed.was_current && self.state.is_active() {
            self.halt();
        }

        self.emit_queue_changed();
        self.emit_index_if_changed(previous_index);
        Ok(removed.item)
    }

    /// Replace the item at `index`, returning the old one
    ///
    /// Replacing the item that is playing, paused or loading stops playback.
    pub fn replace_media_at(&mut self, index: usize, item: MediaItem) -> Result<MediaItem> {
        let len = self.queue.len();
        let was_current = self.queue.index() == Some(index);
        let old = self
            .queue
            .replace(index, item)
            .ok_or(PlayerError::IndexOutOfBounds { index, len })?;

        if was_current && self.state.is_active() {
            self.halt();
        }

        self.emit_queue_changed();
        Ok(old)
    }

    /// Stop playback and empty the queue
    pub fn remove_all_media(&mut self) {
        let previous_index = self.queue.index();
        self.halt();
        self.queue.clear();
        self.emit_queue_changed();
        self.emit_index_if_changed(previous_index);
    }

    /// Stop playback and replace the queue
    ///
    /// The first item in play order becomes current: index 0 normally, a
    /// random item while shuffled.
    pub fn set_queue(&mut self, items: Vec<MediaItem>) {
        let previous_index = self.queue.index();
        self.halt();
        self.queue.set_items(items, &mut self.rng);
        if let Some(first) = self.queue.first_in_order() {
            self.queue.select(first);
        }
        self.emit_queue_changed();
        self.emit_index_if_changed(previous_index);
    }

    // ===== Playback Control =====

    /// Start or resume playback
    ///
    /// Paused resumes; Stopped starts the current item (or the first in
    /// play order); Playing is a no-op.
    pub fn play(&mut self) {
        match self.state {
            PlaybackState::Paused => self.resume(),
            PlaybackState::Stopped => {
                let Some(index) = self.queue.index().or_else(|| self.queue.first_in_order())
                else {
                    debug!("play() with an empty queue ignored");
                    return;
                };
                self.start_index(index);
            }
            PlaybackState::Loading => {
                self.resume_on_ready = true;
            }
            PlaybackState::Playing => {}
        }
    }

    /// Play a specific item, queueing it first if it is not in the queue
    pub fn play_media(&mut self, item: MediaItem) {
        let index = match self.queue.position_of(&item.id) {
            Some(index) => index,
            None => {
                self.queue.push(item, &mut self.rng);
                self.emit_queue_changed();
                self.queue.len() - 1
            }
        };
        self.start_index(index);
    }

    /// Play the item at `index` in the queue
    pub fn play_at_index(&mut self, index: usize) -> Result<()> {
        let len = self.queue.len();
        if index >= len {
            return Err(PlayerError::IndexOutOfBounds { index, len });
        }
        self.start_index(index);
        Ok(())
    }

    /// Skip to the next item in play order
    ///
    /// At the end of the queue without repeat-all, playback stops and the
    /// first item becomes current again.
    pub fn play_next(&mut self) {
        match self.queue.next_index(self.repeat) {
            Some(index) => {
                self.start_index(index);
            }
            None => {
                debug!("play_next() at end of queue");
                self.halt();
                self.select_first();
            }
        }
    }

    /// Go back to the previous item in play order
    ///
    /// Past the restart threshold, restarts the current item instead.
    pub fn play_previous(&mut self) {
        let threshold = self.config.previous_restart_threshold();
        if self.loaded.is_some() && self.engine.position() > threshold {
            self.restart_loaded();
            return;
        }

        match self.queue.previous_index(self.repeat) {
            Some(index) => {
                self.start_index(index);
            }
            None if self.loaded.is_some() => self.restart_loaded(),
            None => self.play(),
        }
    }

    /// Pause playback
    ///
    /// While loading, the item will stay paused once ready.
    pub fn pause(&mut self) {
        match self.state {
            PlaybackState::Playing => {
                self.engine.pause();
                self.set_state(PlaybackState::Paused);
            }
            PlaybackState::Loading => {
                self.resume_on_ready = false;
            }
            PlaybackState::Paused | PlaybackState::Stopped => {}
        }
    }

    /// Stop playback, keeping the queue and current index
    pub fn stop(&mut self) {
        self.halt();
    }

    /// Seek within the loaded item
    pub fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.loaded.is_none() {
            return Err(PlayerError::NoItemLoaded);
        }
        if let Some(duration) = self.engine.duration() {
            if position > duration {
                return Err(PlayerError::InvalidSeekPosition(position));
            }
        }

        self.engine.seek(position)?;
        self.report_time(position);
        Ok(())
    }

    // ===== Shuffle & Repeat =====

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        if self.repeat == mode {
            return;
        }
        self.repeat = mode;
        info!(?mode, "repeat mode changed");
        self.events.emit(PlayerEvent::RepeatModeChanged { mode });
    }

    /// Enable or disable shuffle
    ///
    /// Enabling keeps the current item current; the rest of the queue is
    /// played in random order after it.
    pub fn set_shuffle_enabled(&mut self, enabled: bool) {
        if self.queue.is_shuffled() == enabled {
            return;
        }
        self.queue.set_shuffled(enabled, &mut self.rng);
        info!(enabled, "shuffle mode changed");
        self.events.emit(PlayerEvent::ShuffleModeChanged { enabled });
    }

    // ===== Audio Session =====

    /// Change the audio session category
    ///
    /// Fails for unknown category names and when the engine refuses it; the
    /// previous category stays in effect in both cases.
    pub fn set_audio_session_category(&mut self, category: &str) -> Result<()> {
        let category: AudioSessionCategory = category.parse()?;
        self.engine
            .set_session_category(category)
            .map_err(|e| match e {
                PlayerError::SessionRejected(_) => e,
                other => PlayerError::SessionRejected(other.to_string()),
            })?;

        info!(%category, "audio session category changed");
        self.session_category = category;
        Ok(())
    }

    // ===== Other Players =====

    /// Ask every other player on the same notification center to pause
    pub fn pause_other_players(&self) -> usize {
        self.post_to_others(PlayerNotification::Pause)
    }

    /// Ask every other player on the same notification center to stop
    pub fn stop_other_players(&self) -> usize {
        self.post_to_others(PlayerNotification::Stop)
    }

    // ===== Host Loop =====

    /// Process notifications, engine events and time updates
    ///
    /// Call periodically from the host (a timer, the UI loop, a worker
    /// thread). Each call handles everything pending.
    pub fn tick(&mut self) {
        let notifications = self.inbox.as_ref().map(Inbox::drain).unwrap_or_default();
        for notification in notifications {
            debug!(notification = notification.name(), "received player notification");
            match notification {
                PlayerNotification::Pause => self.pause(),
                PlayerNotification::Stop => self.stop(),
            }
        }

        while let Some(event) = self.engine.poll_event() {
            self.handle_engine_event(event);
        }

        if self.state == PlaybackState::Playing {
            let position = self.engine.position();
            let due = match self.last_reported_position {
                None => true,
                Some(last) => {
                    let moved = if position >= last {
                        position - last
                    } else {
                        last - position
                    };
                    moved >= self.config.time_update_interval()
                }
            };
            if due {
                self.report_time(position);
            }
        }
    }

    // ===== State Queries =====

    /// Item loaded in the engine (playing, paused or loading)
    pub fn now_playing_item(&self) -> Option<&MediaItem> {
        self.loaded.as_ref()
    }

    /// Item at the current index, loaded or not
    pub fn current_item(&self) -> Option<&MediaItem> {
        self.queue.current()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.state
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    pub fn shuffle_mode(&self) -> bool {
        self.queue.is_shuffled()
    }

    /// Current index into the queue; `None` when the queue is empty
    pub fn index(&self) -> Option<usize> {
        self.queue.index()
    }

    /// Queue items in insertion order
    pub fn queue(&self) -> &[MediaItem] {
        self.queue.items()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Traversal order as queue indices
    pub fn play_order(&self) -> &[usize] {
        self.queue.play_order()
    }

    /// Playhead position; zero when nothing is loaded
    pub fn current_playback_time(&self) -> Duration {
        if self.loaded.is_some() {
            self.engine.position()
        } else {
            Duration::ZERO
        }
    }

    /// Duration of the loaded item, from the engine or the item metadata
    pub fn current_playback_duration(&self) -> Option<Duration> {
        let item = self.loaded.as_ref()?;
        self.engine.duration().or(item.duration)
    }

    pub fn current_audio_session_category(&self) -> AudioSessionCategory {
        self.session_category
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// The wrapped platform engine
    pub fn core_engine(&self) -> &E {
        &self.engine
    }

    pub fn core_engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    // ===== Thumbnails =====

    /// Representative image of the loaded (or current) item
    ///
    /// Artwork attached to the item wins; otherwise embedded artwork is read
    /// from local files.
    pub fn representative_thumbnail(&self) -> Result<Option<ArtworkData>> {
        let Some(item) = self.loaded.as_ref().or_else(|| self.queue.current()) else {
            return Ok(None);
        };

        if let Some(artwork) = &item.artwork {
            return Ok(Some(artwork.clone()));
        }

        match item.path() {
            Some(path) => Ok(self.artwork.extract(path)?),
            None => Ok(None),
        }
    }

    /// Image at `time` in the loaded item
    ///
    /// Engines that cannot render frames fall back to the representative
    /// thumbnail.
    pub fn thumbnail_at(&self, time: Duration) -> Result<Option<ArtworkData>> {
        if self.loaded.is_some() {
            if let Some(frame) = self.engine.frame_at(time) {
                return Ok(Some(frame));
            }
        }
        self.representative_thumbnail()
    }

    // ===== Internal =====

    /// Load and start the item at `index`
    ///
    /// Returns false when the gate declined the item.
    fn start_index(&mut self, index: usize) -> bool {
        let Some(item) = self.queue.get(index).cloned() else {
            return false;
        };

        if !self.gate.should_start(&item) {
            info!(id = %item.id, "playback declined by gate");
            self.events.emit(PlayerEvent::PlaybackDeclined { item });
            return false;
        }

        if self.loaded.take().is_some() {
            self.engine.stop();
        }

        let previous_index = self.queue.index();
        self.queue.select(index);
        self.emit_index_if_changed(previous_index);

        self.loaded = Some(item.clone());
        self.resume_on_ready = true;
        self.last_reported_position = None;

        info!(id = %item.id, location = %item.location, "loading item");
        self.events
            .emit(PlayerEvent::WillStartLoading { item: item.clone() });
        self.set_state(PlaybackState::Loading);

        match self.engine.load(&item) {
            Ok(LoadStatus::Ready) => self.finish_loading(),
            Ok(LoadStatus::Pending) => {}
            Err(e) => self.fail(e.to_string()),
        }
        true
    }

    fn finish_loading(&mut self) {
        let Some(item) = self.loaded.clone() else {
            return;
        };

        self.events
            .emit(PlayerEvent::DidEndLoading { item: item.clone() });

        if self.resume_on_ready {
            self.engine.play();
            self.set_state(PlaybackState::Playing);
            self.events.emit(PlayerEvent::DidStartPlaying { item });
        } else {
            self.set_state(PlaybackState::Paused);
        }
    }

    fn resume(&mut self) {
        if self.loaded.is_none() {
            return;
        }
        self.engine.play();
        self.set_state(PlaybackState::Playing);
    }

    fn restart_loaded(&mut self) {
        match self.engine.seek(Duration::ZERO) {
            Ok(()) => self.report_time(Duration::ZERO),
            Err(e) => warn!(error = %e, "restart seek failed"),
        }
        if self.state == PlaybackState::Paused {
            self.resume();
        }
    }

    /// Stop the engine and go to Stopped, reporting the interrupted item
    fn halt(&mut self) {
        if let Some(item) = self.loaded.take() {
            self.engine.stop();
            info!(id = %item.id, "playback stopped");
            self.events.emit(PlayerEvent::DidStop { item });
        }
        self.last_reported_position = None;
        self.set_state(PlaybackState::Stopped);
    }

    fn fail(&mut self, message: String) {
        if let Some(item) = self.loaded.take() {
            self.engine.stop();
            warn!(id = %item.id, %message, "playback failed");
            self.events.emit(PlayerEvent::Failed { item, message });
        }
        self.last_reported_position = None;
        self.set_state(PlaybackState::Stopped);
    }

    fn handle_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Ready => {
                if self.state == PlaybackState::Loading {
                    self.finish_loading();
                } else {
                    debug!(state = ?self.state, "stale engine ready ignored");
                }
            }
            EngineEvent::BufferProgress(progress) => {
                if let Some(item) = self.loaded.clone() {
                    self.events.emit(PlayerEvent::StreamingProgress {
                        item,
                        progress: progress.clamp(0.0, 1.0),
                    });
                }
            }
            EngineEvent::Finished => self.handle_finished(),
            EngineEvent::Failed(message) => self.fail(message),
        }
    }

    /// Natural end of the loaded item
    fn handle_finished(&mut self) {
        let Some(item) = self.loaded.take() else {
            return;
        };
        info!(id = %item.id, "item finished");
        self.events.emit(PlayerEvent::DidFinishPlaying { item });

        let next = if self.repeat == RepeatMode::One {
            self.queue.index()
        } else {
            self.queue.next_index(self.repeat)
        };

        let started = next.is_some_and(|index| self.start_index(index));
        if !started {
            self.engine.stop();
            self.last_reported_position = None;
            self.set_state(PlaybackState::Stopped);
            if next.is_none() {
                self.select_first();
            }
        }
    }

    fn select_first(&mut self) {
        let previous_index = self.queue.index();
        if let Some(first) = self.queue.first_in_order() {
            self.queue.select(first);
        }
        self.emit_index_if_changed(previous_index);
    }

    fn set_state(&mut self, to: PlaybackState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.events.emit(PlayerEvent::WillChangeState { from, to });
        self.state = to;
        info!(?from, ?to, "playback state changed");
        self.events.emit(PlayerEvent::StateChanged { from, to });
    }

    fn report_time(&mut self, position: Duration) {
        self.last_reported_position = Some(position);
        let duration = self.current_playback_duration();
        self.events
            .emit(PlayerEvent::CurrentTimeChanged { position, duration });
    }

    fn post_to_others(&self, notification: PlayerNotification) -> usize {
        match &self.inbox {
            Some(inbox) => inbox.post_to_others(notification),
            None => {
                debug!(
                    notification = notification.name(),
                    "player has no notification center"
                );
                0
            }
        }
    }

    fn emit_queue_changed(&mut self) {
        let length = self.queue.len();
        self.events.emit(PlayerEvent::QueueChanged { length });
    }

    fn emit_index_if_changed(&mut self, previous: Option<usize>) {
        let index = self.queue.index();
        if index != previous {
            self.events.emit(PlayerEvent::IndexChanged { index });
        }
    }
}

impl Default for Player<crate::engine::NullEngine> {
    fn default() -> Self {
        Self::new(crate::engine::NullEngine::new(), PlayerConfig::default())
    }
}
