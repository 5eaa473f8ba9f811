//! Synthetic metronome tracks.
//!
//! Used by the `--metronome` mode in place of a music file, and by tests
//! that need beats at known times.

use std::f32::consts::PI;

/// Generate a click track (metronome)
///
/// Short decaying sine clicks at `click_freq`, one per beat.
pub fn generate_click_track(
    bpm: f32,
    sample_rate: u32,
    duration: f32,
    click_freq: f32,
) -> Vec<f32> {
    let num_samples = (duration * sample_rate as f32) as usize;
    let samples_per_beat = (60.0 / bpm * sample_rate as f32) as usize;
    let click_samples = (sample_rate as f32 * 0.01) as usize; // 10ms click

    let mut samples = vec![0.0; num_samples];
    if samples_per_beat == 0 {
        return samples;
    }

    let mut pos = 0;
    while pos < num_samples {
        for i in 0..click_samples.min(num_samples - pos) {
            let t = i as f32 / sample_rate as f32;
            let envelope = (1.0 - i as f32 / click_samples as f32).powi(2);
            samples[pos + i] = envelope * (2.0 * PI * click_freq * t).sin();
        }
        pos += samples_per_beat;
    }

    samples
}

/// Generate a bass drum hit
pub fn generate_kick(sample_rate: u32) -> Vec<f32> {
    let duration = 0.15; // 150ms
    let num_samples = (duration * sample_rate as f32) as usize;

    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;

            // Pitch drops from 150 Hz to 50 Hz
            let freq = 50.0 + 100.0 * (-t * 30.0).exp();
            let amp = (-t * 15.0).exp();

            amp * (2.0 * PI * freq * t).sin()
        })
        .collect()
}

/// Kick on every beat at `bpm`, scaled to `gain`
pub fn generate_kick_track(bpm: f32, sample_rate: u32, duration: f32, gain: f32) -> Vec<f32> {
    let num_samples = (duration * sample_rate as f32) as usize;
    let samples_per_beat = (60.0 / bpm * sample_rate as f32) as usize;
    let kick = generate_kick(sample_rate);

    let mut samples = vec![0.0; num_samples];
    if samples_per_beat == 0 {
        return samples;
    }

    for pos in (0..num_samples).step_by(samples_per_beat) {
        for (out, &k) in samples[pos..].iter_mut().zip(&kick) {
            *out += k * gain;
        }
    }

    samples
}
