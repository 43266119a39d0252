//! Decoding tests for local sources
//!
//! WAV fixtures are generated with hound into a temp dir, so these run
//! without audio hardware.

use cadence_audio_desktop::LocalSource;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Write a sine WAV file
fn create_test_wav(path: &Path, duration_secs: f32, channels: u16, sample_rate: u32) {
    use hound::{WavSpec, WavWriter};

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).unwrap();
    let frames = (sample_rate as f32 * duration_secs) as usize;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let sample = (t * 440.0 * 2.0 * std::f32::consts::PI).sin();
        let amplitude = (i16::MAX as f32 * 0.5 * sample) as i16;
        for _ in 0..channels {
            writer.write_sample(amplitude).unwrap();
        }
    }
    writer.finalize().unwrap();
}

/// Read the whole source, returning every sample
fn read_all(source: &mut LocalSource) -> Vec<f32> {
    let mut all = Vec::new();
    let mut buffer = vec![0.0f32; 4096];
    loop {
        let n = source.read_samples(&mut buffer).unwrap();
        if n == 0 {
            break;
        }
        all.extend_from_slice(&buffer[..n]);
    }
    all
}

#[test]
fn decodes_stereo_at_native_rate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stereo.wav");
    create_test_wav(&path, 0.5, 2, 44100);

    let mut source = LocalSource::open(&path, 44100).unwrap();
    assert_eq!(source.sample_rate(), 44100);
    assert_eq!(source.source_sample_rate(), 44100);
    assert_eq!(source.channels(), 2);
    assert_eq!(source.duration(), Some(Duration::from_secs_f64(0.5)));

    let samples = read_all(&mut source);
    assert_eq!(samples.len(), 22050 * 2);
    assert!(samples.iter().all(|s| s.abs() <= 1.0));
    assert!(samples.iter().any(|s| s.abs() > 0.1), "sine should not be silent");
    assert!(source.is_finished());
    assert_eq!(source.position(), Duration::from_secs_f64(0.5));
}

#[test]
fn mono_is_duplicated_to_both_channels() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mono.wav");
    create_test_wav(&path, 0.25, 1, 48000);

    let mut source = LocalSource::open(&path, 48000).unwrap();
    assert_eq!(source.channels(), 1);

    let samples = read_all(&mut source);
    assert_eq!(samples.len(), 12000 * 2);
    for frame in samples.chunks_exact(2) {
        assert_eq!(frame[0], frame[1]);
    }
}

#[test]
fn resamples_to_target_rate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cd.wav");
    create_test_wav(&path, 1.0, 2, 44100);

    let mut source = LocalSource::open(&path, 96000).unwrap();
    assert_eq!(source.sample_rate(), 96000);
    assert_eq!(source.source_sample_rate(), 44100);

    let frames = read_all(&mut source).len() / 2;
    let expected = 96000.0;
    let error = (frames as f64 - expected).abs() / expected;
    assert!(
        error < 0.1,
        "expected about {expected} frames after resampling, got {frames}"
    );
}

#[test]
fn seek_moves_position_and_rejects_past_end() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("seek.wav");
    create_test_wav(&path, 2.0, 2, 44100);

    let mut source = LocalSource::open(&path, 44100).unwrap();
    source.seek(Duration::from_secs(1)).unwrap();
    assert_eq!(source.position(), Duration::from_secs(1));

    let remaining = read_all(&mut source).len() / 2;
    assert!(
        (43000..=45500).contains(&remaining),
        "about one second should remain, got {remaining} frames"
    );

    assert!(source.seek(Duration::from_secs(5)).is_err());
}
