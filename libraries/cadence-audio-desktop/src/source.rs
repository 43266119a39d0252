//! Local file decoding with Symphonia
//!
//! [`LocalSource`] decodes a file packet by packet into interleaved stereo
//! f32 at the output device rate. Every Symphonia sample format goes through
//! the same interleaving helper; only the normalization differs.
//!
//! Channel layouts:
//! - Mono is duplicated to both channels
//! - Stereo passes through
//! - Multi-channel keeps the first two channels

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::collections::VecDeque;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use symphonia::core::units::TimeBase;

use crate::error::{AudioError, Result};

/// Output channel count; sources always produce stereo
pub const OUTPUT_CHANNELS: usize = 2;

/// Decoded audio kept ahead of the output, in seconds
const BUFFER_SIZE_SECONDS: usize = 5;

/// Streaming decoder for a local audio file
///
/// Opening only probes the container and builds the decoder; packets are
/// decoded on demand as the output reads.
pub struct LocalSource {
    path: PathBuf,
    source_sample_rate: u32,
    target_sample_rate: u32,
    channels: u16,

    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    time_base: TimeBase,

    // Interleaved stereo at the target rate
    buffer: VecDeque<f32>,
    buffer_capacity: usize,

    resampler: Option<SincFixedIn<f32>>,
    // Interleaved stereo at the source rate, waiting for a full resampler chunk
    resample_pending: Vec<f32>,

    samples_read: usize,
    total_duration: Option<Duration>,
    is_eof: bool,
}

impl LocalSource {
    /// Open a file for playback at `target_sample_rate`
    pub fn open(path: impl AsRef<Path>, target_sample_rate: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let open_error = |reason: String| AudioError::OpenError {
            path: path.display().to_string(),
            reason,
        };

        let file = File::open(&path).map_err(|e| open_error(e.to_string()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| open_error(format!("probe failed: {e}")))?;

        let format_reader = probed.format;

        let track = format_reader
            .default_track()
            .ok_or_else(|| open_error("no audio track".into()))?;

        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2) as u16;
        let track_id = track.id;
        let time_base = track
            .codec_params
            .time_base
            .unwrap_or(TimeBase::new(1, sample_rate));

        let total_duration = track
            .codec_params
            .n_frames
            .map(|frames| Duration::from_secs_f64(frames as f64 / sample_rate as f64));

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| open_error(format!("no decoder: {e}")))?;

        let resampler = if sample_rate == target_sample_rate {
            None
        } else {
            Some(Self::build_resampler(sample_rate, target_sample_rate)?)
        };

        tracing::debug!(
            path = %path.display(),
            source_rate = sample_rate,
            target_rate = target_sample_rate,
            channels,
            resampling = resampler.is_some(),
            "opened local source"
        );

        let buffer_capacity = BUFFER_SIZE_SECONDS * target_sample_rate as usize * OUTPUT_CHANNELS;

        Ok(Self {
            path,
            source_sample_rate: sample_rate,
            target_sample_rate,
            channels,
            format_reader,
            decoder,
            track_id,
            time_base,
            buffer: VecDeque::with_capacity(buffer_capacity),
            buffer_capacity,
            resampler,
            resample_pending: Vec::new(),
            samples_read: 0,
            total_duration,
            is_eof: false,
        })
    }

    fn build_resampler(source_rate: u32, target_rate: u32) -> Result<SincFixedIn<f32>> {
        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        // 0.1 s chunks
        let chunk_frames = (source_rate as usize / 10).max(1);

        SincFixedIn::<f32>::new(
            target_rate as f64 / source_rate as f64,
            2.0,
            params,
            chunk_frames,
            OUTPUT_CHANNELS,
        )
        .map_err(|e| AudioError::ResampleError(e.to_string()))
    }

    /// Fill `output` with interleaved stereo samples
    ///
    /// Returns the number of samples written; the rest of `output` is
    /// silence. Zero means the source is exhausted.
    pub fn read_samples(&mut self, output: &mut [f32]) -> Result<usize> {
        while self.buffer.len() < output.len() && !self.is_eof {
            self.decode_next_packet()?;
        }

        let available = self.buffer.len().min(output.len());
        for (slot, sample) in output.iter_mut().zip(self.buffer.drain(..available)) {
            *slot = sample;
        }
        output[available..].fill(0.0);

        self.samples_read += available;
        Ok(available)
    }

    /// Move to `position`, discarding buffered audio
    pub fn seek(&mut self, position: Duration) -> Result<()> {
        if let Some(total) = self.total_duration {
            if position > total {
                return Err(AudioError::SeekError(format!(
                    "{position:?} is past the end ({total:?})"
                )));
            }
        }

        let ts = self.time_base.calc_timestamp(position.into());
        self.format_reader
            .seek(
                SeekMode::Accurate,
                SeekTo::TimeStamp {
                    ts,
                    track_id: self.track_id,
                },
            )
            .map_err(|e| AudioError::SeekError(e.to_string()))?;

        self.decoder.reset();
        self.buffer.clear();
        self.resample_pending.clear();
        if let Some(resampler) = self.resampler.as_mut() {
            resampler.reset();
        }

        let frames = (position.as_secs_f64() * self.target_sample_rate as f64) as usize;
        self.samples_read = frames * OUTPUT_CHANNELS;
        self.is_eof = false;

        Ok(())
    }

    /// Total length, when the container reports it
    pub fn duration(&self) -> Option<Duration> {
        self.total_duration
    }

    /// Position of the next sample handed to the output
    pub fn position(&self) -> Duration {
        let frames = self.samples_read / OUTPUT_CHANNELS;
        Duration::from_secs_f64(frames as f64 / self.target_sample_rate as f64)
    }

    pub fn is_finished(&self) -> bool {
        self.is_eof && self.buffer.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Sample rate of the file
    pub fn source_sample_rate(&self) -> u32 {
        self.source_sample_rate
    }

    /// Channel count of the file
    pub fn channels(&self) -> u16 {
        self.channels
    }

    fn decode_next_packet(&mut self) -> Result<()> {
        let packet = match self.format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.finish_stream()?;
                return Ok(());
            }
            Err(e) => return Err(AudioError::DecodeError(e.to_string())),
        };

        if packet.track_id() != self.track_id {
            return Ok(());
        }

        let samples = match self.decoder.decode(&packet) {
            Ok(decoded) => convert_to_f32_interleaved(decoded),
            // Corrupt packets are skipped
            Err(SymphoniaError::DecodeError(reason)) => {
                tracing::warn!(path = %self.path.display(), reason, "skipping undecodable packet");
                return Ok(());
            }
            Err(e) => return Err(AudioError::DecodeError(e.to_string())),
        };

        if self.resampler.is_some() {
            self.resample_pending.extend_from_slice(&samples);
            self.resample_full_chunks()?;
        } else {
            self.push_samples(samples);
        }

        Ok(())
    }

    fn finish_stream(&mut self) -> Result<()> {
        self.is_eof = true;
        if self.resample_pending.is_empty() {
            return Ok(());
        }

        let pending = std::mem::take(&mut self.resample_pending);
        let Some(resampler) = self.resampler.as_mut() else {
            self.push_samples(pending);
            return Ok(());
        };

        let planar = deinterleave(&pending, OUTPUT_CHANNELS);
        let resampled = resampler
            .process_partial(Some(planar.as_slice()), None)
            .map_err(|e| AudioError::ResampleError(e.to_string()))?;
        self.push_samples(interleave(&resampled));
        Ok(())
    }

    fn resample_full_chunks(&mut self) -> Result<()> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(());
        };

        let mut output = Vec::new();
        loop {
            let chunk_samples = resampler.input_frames_next() * OUTPUT_CHANNELS;
            if self.resample_pending.len() < chunk_samples {
                break;
            }

            let chunk: Vec<f32> = self.resample_pending.drain(..chunk_samples).collect();
            let planar = deinterleave(&chunk, OUTPUT_CHANNELS);
            let resampled = resampler
                .process(&planar, None)
                .map_err(|e| AudioError::ResampleError(e.to_string()))?;
            output.extend(interleave(&resampled));
        }

        self.push_samples(output);
        Ok(())
    }

    fn push_samples(&mut self, samples: Vec<f32>) {
        self.buffer.extend(samples);
        // Buffer is a soft cap; oldest samples are never dropped
        if self.buffer.len() > self.buffer_capacity {
            tracing::trace!(
                buffered = self.buffer.len(),
                capacity = self.buffer_capacity,
                "decode buffer above capacity"
            );
        }
    }
}

/// Interleave a planar Symphonia buffer to stereo f32
///
/// `normalize` maps one sample of type `T` to [-1.0, 1.0].
fn interleave_to_stereo_f32<T, F>(buf: &AudioBuffer<T>, normalize: F) -> Vec<f32>
where
    T: Sample,
    F: Fn(T) -> f32,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    let mut output = Vec::with_capacity(frames * OUTPUT_CHANNELS);

    let left = buf.chan(0);
    let right = if channels > 1 { buf.chan(1) } else { left };

    for (l, r) in left.iter().zip(right.iter()) {
        output.push(normalize(*l));
        output.push(normalize(*r));
    }

    output
}

/// Convert any Symphonia sample format to interleaved stereo f32
fn convert_to_f32_interleaved(decoded: AudioBufferRef<'_>) -> Vec<f32> {
    match decoded {
        // Float formats
        AudioBufferRef::F32(buf) => interleave_to_stereo_f32(&buf, |s| s),
        AudioBufferRef::F64(buf) => interleave_to_stereo_f32(&buf, |s| s as f32),

        // Signed integer formats
        AudioBufferRef::S8(buf) => interleave_to_stereo_f32(&buf, |s| s as f32 / i8::MAX as f32),
        AudioBufferRef::S16(buf) => {
            interleave_to_stereo_f32(&buf, |s| s as f32 / i16::MAX as f32)
        }
        AudioBufferRef::S24(buf) => {
            interleave_to_stereo_f32(&buf, |s| s.inner() as f32 / 8388607.0)
        }
        AudioBufferRef::S32(buf) => {
            interleave_to_stereo_f32(&buf, |s| s as f32 / i32::MAX as f32)
        }

        // Unsigned integer formats, centered around 0
        AudioBufferRef::U8(buf) => {
            interleave_to_stereo_f32(&buf, |s| (s as f32 / u8::MAX as f32) * 2.0 - 1.0)
        }
        AudioBufferRef::U16(buf) => {
            interleave_to_stereo_f32(&buf, |s| (s as f32 / u16::MAX as f32) * 2.0 - 1.0)
        }
        AudioBufferRef::U24(buf) => {
            interleave_to_stereo_f32(&buf, |s| (s.inner() as f32 / 16777215.0) * 2.0 - 1.0)
        }
        AudioBufferRef::U32(buf) => {
            interleave_to_stereo_f32(&buf, |s| (s as f32 / u32::MAX as f32) * 2.0 - 1.0)
        }
    }
}

fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (ch, sample) in frame.iter().enumerate() {
            planar[ch].push(*sample);
        }
    }
    planar
}

fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    let frames = planar.first().map_or(0, Vec::len);
    let mut output = Vec::with_capacity(frames * planar.len());
    for frame in 0..frames {
        for channel in planar {
            output.push(channel[frame]);
        }
    }
    output
}
