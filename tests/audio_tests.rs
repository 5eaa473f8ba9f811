//! Integration tests for audio decoding and beat analysis.

use std::path::Path;

use beatroom::animation::TempoSource;
use beatroom::audio::{
    detect_beats, estimate_bpm, generate_click_track, generate_kick_track, load_audio,
    AudioError, AudioSystem, TempoAnalyzer,
};
use beatroom::params::BeatDetectionConfig;

const SAMPLE_RATE: u32 = 44100;

/// Write `mono` as a 16-bit stereo WAV with the same signal on both channels
fn write_stereo_wav(path: &Path, mono: &[f32]) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in mono {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(v).unwrap();
        writer.write_sample(v).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_beat_detection_click_track() {
    let bpm = 120.0;
    let duration = 4.0;
    let samples = generate_click_track(bpm, SAMPLE_RATE, duration, 100.0);

    let beats = detect_beats(&samples, SAMPLE_RATE, &BeatDetectionConfig::default());

    let expected_beats = (duration * bpm / 60.0) as usize;
    assert!(
        beats.len() >= expected_beats / 2,
        "Expected at least {} beats, got {}",
        expected_beats / 2,
        beats.len()
    );
}

#[test]
fn test_bpm_estimation_kick_track() {
    let config = BeatDetectionConfig::default();
    for target_bpm in [90.0, 120.0, 140.0] {
        let samples = generate_kick_track(target_bpm, SAMPLE_RATE, 8.0, 0.8);
        let beats = detect_beats(&samples, SAMPLE_RATE, &config);
        let estimated = estimate_bpm(&beats, &config).unwrap();

        let error = (estimated - target_bpm).abs() / target_bpm;
        assert!(
            error < 0.1,
            "Expected ~{} BPM, got {} ({:.1}% error)",
            target_bpm,
            estimated,
            error * 100.0
        );
    }
}

#[test]
fn test_wav_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kicks.wav");
    write_stereo_wav(&path, &generate_kick_track(120.0, SAMPLE_RATE, 3.0, 0.8));

    let track = load_audio(&path).unwrap();
    assert_eq!(track.sample_rate, SAMPLE_RATE);
    assert_eq!(track.channels, 2);
    assert!((track.duration() - 3.0).abs() < 0.01, "{}", track.duration());

    // Both channels carry the same signal
    let mono = track.to_mono();
    assert_eq!(mono.len(), track.num_frames());
    assert!(track.samples.chunks(2).all(|f| f[0] == f[1]));
}

#[test]
fn test_decoded_file_drives_tempo() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kicks.wav");
    write_stereo_wav(&path, &generate_kick_track(100.0, SAMPLE_RATE, 10.0, 0.8));

    let track = load_audio(&path).unwrap();
    let mut analyzer = TempoAnalyzer::new(
        track.to_mono().into(),
        track.sample_rate,
        BeatDetectionConfig::default(),
    );

    let initial = analyzer.initial_bpm().unwrap();
    assert!((initial - 100.0).abs() < 10.0, "initial {initial}");

    // Refresh window centered at 5s
    let refreshed = analyzer.tempo_over(2.0..8.0).unwrap();
    assert!((refreshed - 100.0).abs() < 10.0, "refreshed {refreshed}");
}

#[test]
fn test_garbage_file_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.mp3");
    std::fs::write(&path, b"definitely not audio").unwrap();

    let result = AudioSystem::from_file(&path, BeatDetectionConfig::default(), true);
    assert!(matches!(result, Err(AudioError::Decode(_))));
}
