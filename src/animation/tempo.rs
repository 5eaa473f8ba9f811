//! Periodic tempo refresh.

use std::ops::Range;

/// Source of tempo estimates over a window of playback time
pub trait TempoSource {
    /// Estimated BPM for `window` (seconds), or `None` if it holds too few beats
    fn tempo_over(&mut self, window: Range<f32>) -> Option<f32>;
}

/// Fires once every `interval_s` of playback time
///
/// Tracks the next due time instead of testing `time % interval == 0`, so a
/// refresh is never skipped because a frame landed between two exact values.
#[derive(Debug, Clone)]
pub struct TempoClock {
    interval_s: f32,
    next_due_s: f32,
}

impl TempoClock {
    /// First refresh fires one interval after playback starts
    pub fn new(interval_s: f32) -> Self {
        Self {
            interval_s,
            next_due_s: interval_s,
        }
    }

    /// Returns true when a refresh is due at `now_s`
    ///
    /// After firing, the next due time moves to the first interval boundary
    /// strictly after `now_s`, so a long stall fires once rather than in a burst.
    pub fn poll(&mut self, now_s: f32) -> bool {
        if now_s < self.next_due_s {
            return false;
        }
        let elapsed_intervals = ((now_s - self.next_due_s) / self.interval_s).floor() + 1.0;
        self.next_due_s += elapsed_intervals * self.interval_s;
        true
    }

    pub fn next_due_s(&self) -> f32 {
        self.next_due_s
    }
}

/// Current tempo with its refresh schedule
#[derive(Debug, Clone)]
pub struct TempoTracker {
    clock: TempoClock,
    window_half_s: f32,
    bpm: f32,
}

impl TempoTracker {
    pub fn new(initial_bpm: f32, interval_s: f32, window_half_s: f32) -> Self {
        Self {
            clock: TempoClock::new(interval_s),
            window_half_s,
            bpm: initial_bpm,
        }
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Query `source` if a refresh is due; returns the new tempo when it changed
    pub fn refresh<S: TempoSource + ?Sized>(&mut self, now_s: f32, source: &mut S) -> Option<f32> {
        if !self.clock.poll(now_s) {
            return None;
        }

        let window = (now_s - self.window_half_s)..(now_s + self.window_half_s);
        match source.tempo_over(window) {
            Some(bpm) if bpm.is_finite() && bpm > 0.0 => {
                log::debug!("Tempo at {:.1}s: {:.1} BPM", now_s, bpm);
                self.bpm = bpm;
                Some(bpm)
            }
            _ => {
                log::debug!(
                    "No tempo estimate at {:.1}s, keeping {:.1} BPM",
                    now_s,
                    self.bpm
                );
                None
            }
        }
    }
}
