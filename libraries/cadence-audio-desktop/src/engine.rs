/// CPAL-backed media engine
///
/// A dedicated audio thread owns the CPAL stream; the engine talks to it over
/// a command channel. The stream callback pulls decoded samples from the
/// shared [`LocalSource`] and reports end of stream and decode failures back
/// as [`EngineEvent`]s.
use cadence_playback::{
    AudioSessionCategory, EngineEvent, LoadStatus, MediaEngine, MediaItem, MediaLocation,
    PlayerError,
};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{AudioError, Result};
use crate::source::{LocalSource, OUTPUT_CHANNELS};

/// Commands sent to the audio thread
#[derive(Debug)]
enum AudioCommand {
    /// Start pulling samples
    Play,
    /// Pause the device stream
    Pause,
    /// Shutdown the audio thread
    Shutdown,
}

/// State shared between the engine and the stream callback
///
/// The callback never blocks on `source`; the playhead is published through
/// `position_micros` so readers stay off the lock.
struct SharedState {
    source: Mutex<Option<LocalSource>>,
    playing: AtomicBool,
    position_micros: AtomicU64,
    events: Sender<EngineEvent>,
}

impl SharedState {
    fn new(events: Sender<EngineEvent>) -> Self {
        Self {
            source: Mutex::new(None),
            playing: AtomicBool::new(false),
            position_micros: AtomicU64::new(0),
            events,
        }
    }

    fn source(&self) -> MutexGuard<'_, Option<LocalSource>> {
        self.source.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Source lock for the real-time thread; `None` while a seek or load
    /// holds it
    fn try_source(&self) -> Option<MutexGuard<'_, Option<LocalSource>>> {
        match self.source.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(e)) => Some(e.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    fn set_position(&self, position: Duration) {
        self.position_micros
            .store(position.as_micros() as u64, Ordering::Release);
    }

    fn position(&self) -> Duration {
        Duration::from_micros(self.position_micros.load(Ordering::Acquire))
    }
}

/// Desktop media engine
///
/// Decodes local files with Symphonia and plays them through the default
/// CPAL output device. Loads complete synchronously. URL locations are
/// rejected.
pub struct DesktopEngine {
    command_tx: Sender<AudioCommand>,
    event_rx: Receiver<EngineEvent>,
    shared: Arc<SharedState>,
    sample_rate: u32,
    duration: Option<Duration>,
    audio_thread: Option<JoinHandle<()>>,
}

impl DesktopEngine {
    /// Create an engine on the default output device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::DeviceNotFound)?;

        let config = device.default_output_config()?;
        let sample_rate = config.sample_rate();
        let mut config: StreamConfig = config.config();
        config.channels = OUTPUT_CHANNELS as u16;

        Self::with_device_and_config(device, config, sample_rate)
    }

    fn with_device_and_config(
        device: Device,
        config: StreamConfig,
        sample_rate: u32,
    ) -> Result<Self> {
        let (event_tx, event_rx) = unbounded();
        let shared = Arc::new(SharedState::new(event_tx));

        let (command_tx, command_rx) = bounded::<AudioCommand>(32);
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);

        let shared_for_thread = Arc::clone(&shared);
        let audio_thread = thread::Builder::new()
            .name("cadence-audio".into())
            .spawn(move || {
                Self::audio_thread_run(device, config, shared_for_thread, command_rx, ready_tx);
            })
            .map_err(|e| AudioError::ThreadSpawn(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(AudioError::ThreadStopped),
        }

        tracing::info!(sample_rate, "desktop audio engine started");

        Ok(Self {
            command_tx,
            event_rx,
            shared,
            sample_rate,
            duration: None,
            audio_thread: Some(audio_thread),
        })
    }

    /// Output device sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn send(&self, command: AudioCommand) {
        if self.command_tx.send(command).is_err() {
            tracing::error!("audio thread is gone");
        }
    }

    /// Audio thread main loop
    ///
    /// Owns the CPAL stream for its whole lifetime.
    fn audio_thread_run(
        device: Device,
        config: StreamConfig,
        shared: Arc<SharedState>,
        command_rx: Receiver<AudioCommand>,
        ready_tx: Sender<Result<()>>,
    ) {
        let state_for_callback = Arc::clone(&shared);
        let stream: Stream = match device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                Self::audio_callback(data, &state_for_callback);
            },
            |err| tracing::error!(%err, "audio stream error"),
            None,
        ) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready_tx.send(Err(e.into()));
                return;
            }
        };

        let _ = ready_tx.send(Ok(()));

        while let Ok(command) = command_rx.recv() {
            match command {
                AudioCommand::Play => {
                    if let Err(e) = stream.play() {
                        let e = AudioError::from(e);
                        tracing::error!(error = %e, "failed to start stream");
                        let _ = shared.events.send(EngineEvent::Failed(e.to_string()));
                    }
                }
                AudioCommand::Pause => {
                    if let Err(e) = stream.pause() {
                        let e = AudioError::from(e);
                        tracing::warn!(error = %e, "failed to pause stream");
                    }
                }
                AudioCommand::Shutdown => break,
            }
        }

        tracing::debug!("audio thread exiting");
    }

    /// Stream callback (runs on the real-time audio thread)
    fn audio_callback(output: &mut [f32], shared: &SharedState) {
        if !shared.playing.load(Ordering::Acquire) {
            output.fill(0.0);
            return;
        }

        let Some(mut source) = shared.try_source() else {
            output.fill(0.0);
            return;
        };
        let Some(active) = source.as_mut() else {
            output.fill(0.0);
            return;
        };

        let result = active.read_samples(output);
        shared.set_position(active.position());

        match result {
            Ok(_) if active.is_finished() => {
                shared.playing.store(false, Ordering::Release);
                let _ = shared.events.send(EngineEvent::Finished);
            }
            Ok(_) => {}
            Err(e) => {
                output.fill(0.0);
                shared.playing.store(false, Ordering::Release);
                *source = None;
                let _ = shared.events.send(EngineEvent::Failed(e.to_string()));
            }
        }
    }
}

impl MediaEngine for DesktopEngine {
    fn load(&mut self, item: &MediaItem) -> cadence_playback::Result<LoadStatus> {
        let path = match &item.location {
            MediaLocation::File(path) => path,
            MediaLocation::Url(url) => {
                return Err(AudioError::UnsupportedLocation(url.clone()).into());
            }
        };

        self.stop();
        let source = LocalSource::open(path, self.sample_rate)?;
        self.duration = source.duration();
        *self.shared.source() = Some(source);
        self.shared.set_position(Duration::ZERO);

        Ok(LoadStatus::Ready)
    }

    fn play(&mut self) {
        if self.shared.source().is_none() {
            return;
        }
        self.shared.playing.store(true, Ordering::Release);
        self.send(AudioCommand::Play);
    }

    fn pause(&mut self) {
        self.shared.playing.store(false, Ordering::Release);
        self.send(AudioCommand::Pause);
    }

    fn stop(&mut self) {
        self.shared.playing.store(false, Ordering::Release);
        *self.shared.source() = None;
        self.shared.set_position(Duration::ZERO);
        self.duration = None;
        // Events from the previous item are stale now
        while self.event_rx.try_recv().is_ok() {}
    }

    fn seek(&mut self, position: Duration) -> cadence_playback::Result<()> {
        let mut source = self.shared.source();
        let active = source.as_mut().ok_or(PlayerError::NoItemLoaded)?;
        active.seek(position)?;
        self.shared.set_position(active.position());
        Ok(())
    }

    fn position(&self) -> Duration {
        self.shared.position()
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Desktop output has no input routing
    fn set_session_category(
        &mut self,
        category: AudioSessionCategory,
    ) -> cadence_playback::Result<()> {
        match category {
            AudioSessionCategory::Record | AudioSessionCategory::PlayAndRecord => {
                Err(PlayerError::SessionRejected(format!(
                    "{category} needs audio input, which the desktop engine does not provide"
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Drop for DesktopEngine {
    fn drop(&mut self) {
        self.shared.playing.store(false, Ordering::Release);
        let _ = self.command_tx.send(AudioCommand::Shutdown);
        if let Some(handle) = self.audio_thread.take() {
            if handle.join().is_err() {
                tracing::error!("audio thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_tone(path: &Path, seconds: u32) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..(44100 * seconds) {
            writer.write_sample(8000i16).unwrap();
            writer.write_sample(-8000i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn shared_with_tone(dir: &Path) -> (SharedState, Receiver<EngineEvent>) {
        let path = dir.join("tone.wav");
        write_tone(&path, 1);

        let (tx, rx) = unbounded();
        let shared = SharedState::new(tx);
        *shared.source() = Some(LocalSource::open(&path, 44100).unwrap());
        shared.playing.store(true, Ordering::Release);
        (shared, rx)
    }

    #[test]
    fn callback_publishes_position() {
        let dir = tempfile::tempdir().unwrap();
        let (shared, _events) = shared_with_tone(dir.path());

        let mut output = vec![0.0f32; 4410 * OUTPUT_CHANNELS];
        DesktopEngine::audio_callback(&mut output, &shared);

        assert_eq!(shared.position(), Duration::from_millis(100));
        assert!(output.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn callback_outputs_silence_while_source_is_locked() {
        let dir = tempfile::tempdir().unwrap();
        let (shared, _events) = shared_with_tone(dir.path());

        let mut output = vec![1.0f32; 512];
        {
            let _held = shared.source();
            DesktopEngine::audio_callback(&mut output, &shared);
        }

        assert!(output.iter().all(|&s| s == 0.0));
        assert_eq!(shared.position(), Duration::ZERO);

        DesktopEngine::audio_callback(&mut output, &shared);
        assert!(shared.position() > Duration::ZERO);
    }

    #[test]
    fn callback_reports_end_of_stream() {
        let dir = tempfile::tempdir().unwrap();
        let (shared, events) = shared_with_tone(dir.path());

        let mut output = vec![0.0f32; 44100 * OUTPUT_CHANNELS * 2];
        DesktopEngine::audio_callback(&mut output, &shared);

        assert_eq!(events.try_recv().ok(), Some(EngineEvent::Finished));
        assert!(!shared.playing.load(Ordering::Acquire));
        assert_eq!(shared.position(), Duration::from_secs(1));
    }
}
