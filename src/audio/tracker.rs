//! Beat timestamps and windowed tempo estimates for a decoded track.

use std::ops::Range;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver};

use super::beats::{detect_beats, estimate_bpm};
use super::AudioError;
use crate::animation::TempoSource;
use crate::params::BeatDetectionConfig;

/// Scan `mono` for beats on a background thread
///
/// Every beat time (seconds from the start of the track) is sent in order.
/// The thread exits early once the receiver is dropped.
pub fn spawn_beat_tracker(
    mono: Arc<[f32]>,
    sample_rate: u32,
    config: BeatDetectionConfig,
) -> Result<(Receiver<f32>, thread::JoinHandle<()>), AudioError> {
    let (beat_tx, beat_rx) = unbounded();

    let handle = thread::Builder::new()
        .name("beat-tracker".to_string())
        .spawn(move || {
            let beats = detect_beats(&mono, sample_rate, &config);
            log::info!("Beat tracker found {} beats", beats.len());

            for time in beats {
                if beat_tx.send(time as f32).is_err() {
                    log::debug!("Beat receiver dropped, stopping tracker");
                    return;
                }
            }
        })?;

    Ok((beat_rx, handle))
}

/// Tempo estimates over a window of a mono track
#[derive(Clone)]
pub struct TempoAnalyzer {
    mono: Arc<[f32]>,
    sample_rate: u32,
    config: BeatDetectionConfig,
}

impl TempoAnalyzer {
    pub fn new(mono: Arc<[f32]>, sample_rate: u32, config: BeatDetectionConfig) -> Self {
        Self {
            mono,
            sample_rate,
            config,
        }
    }

    /// Track length in seconds
    pub fn duration_s(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.mono.len() as f32 / self.sample_rate as f32
    }

    /// Tempo over the opening of the track, used before the first refresh
    pub fn initial_bpm(&self) -> Option<f32> {
        let span = self.config.initial_tempo_span_s.min(self.duration_s());
        self.bpm_between(0.0..span)
    }

    /// Sample range covered by `window`, clamped to the track
    fn sample_range(&self, window: &Range<f32>) -> Range<usize> {
        let to_sample = |t: f32| {
            let index = (t.max(0.0) * self.sample_rate as f32) as usize;
            index.min(self.mono.len())
        };
        to_sample(window.start)..to_sample(window.end)
    }

    fn bpm_between(&self, window: Range<f32>) -> Option<f32> {
        let range = self.sample_range(&window);
        if range.is_empty() {
            return None;
        }
        let beats = detect_beats(&self.mono[range], self.sample_rate, &self.config);
        estimate_bpm(&beats, &self.config)
    }
}

impl TempoSource for TempoAnalyzer {
    fn tempo_over(&mut self, window: Range<f32>) -> Option<f32> {
        self.bpm_between(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::generate_kick_track;

    const SAMPLE_RATE: u32 = 44100;

    fn kick_track(bpm: f32, duration: f32) -> Arc<[f32]> {
        generate_kick_track(bpm, SAMPLE_RATE, duration, 0.8).into()
    }

    #[test]
    fn test_tracker_sends_beats_in_order() {
        let (beats, handle) =
            spawn_beat_tracker(kick_track(120.0, 4.0), SAMPLE_RATE, BeatDetectionConfig::default())
                .unwrap();
        handle.join().unwrap();

        let times: Vec<f32> = beats.try_iter().collect();
        assert!(times.len() >= 4, "expected beats, got {times:?}");
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_tempo_over_window() {
        let mut analyzer =
            TempoAnalyzer::new(kick_track(120.0, 10.0), SAMPLE_RATE, Default::default());

        let bpm = analyzer.tempo_over(2.0..8.0).unwrap();
        assert!((bpm - 120.0).abs() < 12.0, "bpm {bpm}");
    }

    #[test]
    fn test_window_outside_track() {
        let mut analyzer =
            TempoAnalyzer::new(kick_track(120.0, 4.0), SAMPLE_RATE, Default::default());

        assert_eq!(analyzer.tempo_over(10.0..16.0), None);
        assert_eq!(analyzer.tempo_over(-3.0..0.0), None);
    }

    #[test]
    fn test_initial_bpm_clamped_to_short_track() {
        let analyzer = TempoAnalyzer::new(kick_track(100.0, 8.0), SAMPLE_RATE, Default::default());
        assert!((analyzer.duration_s() - 8.0).abs() < 0.001);

        let bpm = analyzer.initial_bpm().unwrap();
        assert!((bpm - 100.0).abs() < 10.0, "bpm {bpm}");
    }
}
