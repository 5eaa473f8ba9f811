//! Energy-onset beat detection and tempo estimation.

use std::f32::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};

use crate::params::BeatDetectionConfig;

/// Fewest in-range beat intervals a tempo estimate is based on
pub const MIN_TEMPO_INTERVALS: usize = 2;

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

/// Bass energy of every hop-spaced window, normalized to a peak of 1.0
fn bass_energy_envelope(
    samples: &[f32],
    sample_rate: u32,
    config: &BeatDetectionConfig,
) -> Vec<f32> {
    let fft_size = config.fft_size;
    let num_windows = (samples.len() - fft_size) / config.hop_size + 1;

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    let window: Vec<f32> = (0..fft_size).map(|i| hann_window(i, fft_size)).collect();
    let mut buffer = vec![Complex::new(0.0, 0.0); fft_size];

    let bins = config.bass_bins(sample_rate);
    let bins = bins.start..bins.end.min(fft_size / 2);
    let norm = (fft_size as f32).sqrt();

    let mut energy: Vec<f32> = (0..num_windows)
        .map(|i| {
            let start = i * config.hop_size;
            for (slot, (s, w)) in buffer
                .iter_mut()
                .zip(samples[start..start + fft_size].iter().zip(&window))
            {
                *slot = Complex::new(s * w, 0.0);
            }
            fft.process(&mut buffer);

            buffer[bins.clone()]
                .iter()
                .map(|c| {
                    let m = c.norm() / norm;
                    m * m
                })
                .sum()
        })
        .collect();

    let max_energy = energy.iter().cloned().fold(0.0f32, f32::max);
    if max_energy > 0.0 {
        for e in &mut energy {
            *e /= max_energy;
        }
    }
    energy
}

/// Detect beats as bass-energy peaks that stand out from their neighbourhood
///
/// 1. Compute energy in the bass band for each window
/// 2. Compare to the local average energy
/// 3. Keep local peaks above the threshold, at least `min_beat_spacing_s` apart
///
/// Returns beat times in seconds from the start of `samples`.
pub fn detect_beats(samples: &[f32], sample_rate: u32, config: &BeatDetectionConfig) -> Vec<f64> {
    if samples.len() < config.fft_size || sample_rate == 0 {
        return Vec::new();
    }

    let energy = bass_energy_envelope(samples, sample_rate, config);
    if energy.len() < 3 {
        return Vec::new();
    }

    let avg_window = config.average_windows;
    let local_avg: Vec<f32> = (0..energy.len())
        .map(|i| {
            let start = i.saturating_sub(avg_window);
            let end = (i + avg_window + 1).min(energy.len());
            energy[start..end].iter().sum::<f32>() / (end - start) as f32
        })
        .collect();

    let threshold = 1.0 + config.sensitivity;
    let min_spacing =
        (sample_rate as f32 / config.hop_size as f32 * config.min_beat_spacing_s) as usize;

    let mut beats = Vec::new();
    let mut last_beat: Option<usize> = None;

    for i in 1..energy.len() - 1 {
        let is_peak = energy[i] > energy[i - 1] && energy[i] > energy[i + 1];
        let exceeds_threshold = energy[i] > local_avg[i] * threshold;
        let enough_spacing = last_beat.map_or(true, |lb| i - lb >= min_spacing);

        if is_peak && exceeds_threshold && enough_spacing {
            beats.push((i * config.hop_size) as f64 / sample_rate as f64);
            last_beat = Some(i);
        }
    }

    beats
}

/// Estimate tempo from the median interval between beats
///
/// Only intervals inside `config.interval_range_s` count; with fewer than
/// [`MIN_TEMPO_INTERVALS`] of them there is no estimate. The result is
/// halved or doubled until it lands in `config.bpm_range`.
pub fn estimate_bpm(beats: &[f64], config: &BeatDetectionConfig) -> Option<f32> {
    let (min_interval, max_interval) = config.interval_range_s;
    let mut intervals: Vec<f64> = beats
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&i| i > min_interval && i < max_interval)
        .collect();

    if intervals.len() < MIN_TEMPO_INTERVALS {
        return None;
    }

    intervals.sort_by(|a, b| a.total_cmp(b));
    let median_interval = intervals[intervals.len() / 2];

    let (min_bpm, max_bpm) = config.bpm_range;
    let mut bpm = (60.0 / median_interval) as f32;
    while bpm < min_bpm {
        bpm *= 2.0;
    }
    while bpm > max_bpm {
        bpm /= 2.0;
    }
    Some(bpm)
}
