//! Desktop playback integration
//!
//! Runs a [`Player`] on a background tick thread so engine completions, time
//! updates and cross-player notifications are processed without the host
//! driving `tick()` itself.

use cadence_playback::{MediaEngine, Player, PlayerConfig, Subscription};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::engine::DesktopEngine;
use crate::error::{AudioError, Result};

/// Default interval between player ticks
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Desktop playback host
///
/// Owns the player behind `Arc<Mutex<_>>`, shared with the tick thread.
/// Dropping the host stops the thread.
pub struct DesktopPlayback<E: MediaEngine + 'static = DesktopEngine> {
    player: Arc<Mutex<Player<E>>>,
    shutdown_tx: Option<Sender<()>>,
    tick_thread: Option<JoinHandle<()>>,
}

impl DesktopPlayback<DesktopEngine> {
    /// Create desktop playback on the default output device
    ///
    /// # Returns
    /// * `Ok(playback)` - Desktop playback ready
    /// * `Err(_)` - Failed to initialize audio output
    pub fn new(config: PlayerConfig) -> Result<Self> {
        let engine = DesktopEngine::new()?;
        Self::start(Player::new(engine, config), DEFAULT_TICK_INTERVAL)
    }
}

impl<E: MediaEngine + 'static> DesktopPlayback<E> {
    /// Host an existing player, ticking it every `tick_interval`
    pub fn start(player: Player<E>, tick_interval: Duration) -> Result<Self> {
        let player = Arc::new(Mutex::new(player));
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let player_for_thread = Arc::clone(&player);
        let tick_thread = thread::Builder::new()
            .name("cadence-tick".into())
            .spawn(move || loop {
                match shutdown_rx.recv_timeout(tick_interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        player_for_thread
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .tick();
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| AudioError::ThreadSpawn(e.to_string()))?;

        tracing::debug!(?tick_interval, "playback tick thread started");

        Ok(Self {
            player,
            shutdown_tx: Some(shutdown_tx),
            tick_thread: Some(tick_thread),
        })
    }

    /// Run `f` with exclusive access to the player
    pub fn with_player<R>(&self, f: impl FnOnce(&mut Player<E>) -> R) -> R {
        let mut player = self.player.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut player)
    }

    /// Subscribe to player events
    pub fn subscribe(&self) -> Subscription {
        self.with_player(Player::subscribe)
    }

    /// Shared handle to the player
    pub fn player(&self) -> Arc<Mutex<Player<E>>> {
        Arc::clone(&self.player)
    }

    /// Stop the tick thread and wait for it
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.tick_thread.take() {
            if handle.join().is_err() {
                tracing::error!("tick thread panicked");
            }
        }
    }
}

impl<E: MediaEngine + 'static> Drop for DesktopPlayback<E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
