//! Beat-reactive animation of the riser and oscillator groups.

use glam::Vec3;
use rand::Rng;

use super::beat_queue::{BeatPoll, BeatQueue};
use super::tempo::{TempoSource, TempoTracker};
use crate::params::AnimationParams;

/// What happened during one animator step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnimationFrame {
    /// Beat matched this frame
    pub beat: BeatPoll,

    /// Riser indices reset to the origin (primary, paired)
    pub reset: Option<(usize, usize)>,

    /// New tempo if a refresh produced one
    pub tempo_update: Option<f32>,
}

/// Beat queue, tempo and the rules that move the animated objects
pub struct BeatAnimator {
    params: AnimationParams,
    queue: BeatQueue,
    tempo: TempoTracker,
}

impl BeatAnimator {
    pub fn new(params: AnimationParams, initial_bpm: f32) -> Self {
        let tempo = TempoTracker::new(
            initial_bpm,
            params.tempo_refresh_interval_s,
            params.tempo_window_half_s,
        );
        Self {
            params,
            queue: BeatQueue::new(),
            tempo,
        }
    }

    pub fn params(&self) -> &AnimationParams {
        &self.params
    }

    pub fn queue(&self) -> &BeatQueue {
        &self.queue
    }

    pub fn bpm(&self) -> f32 {
        self.tempo.bpm()
    }

    /// Hand over beats reported by the audio tracker
    pub fn enqueue_beats<I: IntoIterator<Item = f32>>(&mut self, beats: I) {
        self.queue.extend(beats);
    }

    /// Advance the animation to `now_s`
    ///
    /// `positions` is the scene's object position table; it must be long
    /// enough for both animated ranges (see [`AnimationParams::validate`]).
    pub fn update<S, R>(
        &mut self,
        now_s: f32,
        tempo_source: &mut S,
        positions: &mut [Vec3],
        rng: &mut R,
    ) -> AnimationFrame
    where
        S: TempoSource + ?Sized,
        R: Rng,
    {
        let tempo_update = self.tempo.refresh(now_s, tempo_source);

        let beat = self.queue.poll(
            now_s,
            self.params.beat_tolerance_s,
            self.params.match_policy,
        );
        if beat.discarded > 0 {
            log::debug!("Discarded {} stale beats at {:.2}s", beat.discarded, now_s);
        }

        let reset = if beat.is_beat() {
            let primary = rng.gen_range(self.params.riser_range.clone());
            let paired = paired_riser(&self.params, primary);
            positions[primary] = Vec3::ZERO;
            positions[paired] = Vec3::ZERO;
            log::trace!("Beat at {:.2}s: risers {} and {}", now_s, primary, paired);
            Some((primary, paired))
        } else {
            None
        };

        self.decay_risers(positions);
        self.oscillate(now_s, positions);

        AnimationFrame {
            beat,
            reset,
            tempo_update,
        }
    }

    /// Lower every riser above the floor by one step, clamped at the floor
    fn decay_risers(&self, positions: &mut [Vec3]) {
        let floor = self.params.floor_height_m;
        for position in &mut positions[self.params.riser_range.clone()] {
            if position.y > floor {
                position.y = (position.y - self.params.decay_step_m).max(floor);
            }
        }
    }

    /// Place every oscillator on the tempo-driven sine, mirrored by parity
    fn oscillate(&self, now_s: f32, positions: &mut [Vec3]) {
        for index in self.params.oscillator_range.clone() {
            let height = oscillator_height(&self.params, self.bpm(), index, now_s);
            positions[index] = Vec3::new(0.0, height, 0.0);
        }
    }
}

/// Partner of `primary` inside the riser range, wrapping past the last index
pub fn paired_riser(params: &AnimationParams, primary: usize) -> usize {
    let first = *params.riser_range.start();
    let count = params.riser_count();
    first + (primary - first + params.riser_pair_offset) % count
}

/// Height of oscillator `index` at `time_s` for the given tempo
pub fn oscillator_height(params: &AnimationParams, bpm: f32, index: usize, time_s: f32) -> f32 {
    let phase = params.oscillator_rate_multiplier * bpm / 60.0 * time_s;
    let sign = if index % 2 == 0 { 1.0 } else { -1.0 };
    params.oscillator_base_m + sign * params.oscillator_amplitude_m * phase.sin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::ops::Range;

    struct FixedTempo(Option<f32>);

    impl TempoSource for FixedTempo {
        fn tempo_over(&mut self, _window: Range<f32>) -> Option<f32> {
            self.0
        }
    }

    fn table() -> Vec<Vec3> {
        vec![Vec3::ZERO; 40]
    }

    #[test]
    fn test_paired_riser_wraps_within_range() {
        let params = AnimationParams::default();
        for primary in params.riser_range.clone() {
            let paired = paired_riser(&params, primary);
            assert!(params.riser_range.contains(&paired));
            assert_ne!(paired, primary);

            // Reference rule for the default 1..=10 range
            let mut expected = primary + 5;
            if expected > 10 {
                expected -= 10;
            }
            assert_eq!(paired, expected);
        }
    }

    #[test]
    fn test_paired_riser_custom_range() {
        let params = AnimationParams {
            riser_range: 4..=9,
            riser_pair_offset: 4,
            ..AnimationParams::default()
        };
        let pairs: Vec<usize> = params
            .riser_range
            .clone()
            .map(|p| paired_riser(&params, p))
            .collect();
        assert_eq!(pairs, vec![8, 9, 4, 5, 6, 7]);
    }

    #[test]
    fn test_decay_clamps_at_floor() {
        let params = AnimationParams::default();
        let mut animator = BeatAnimator::new(params.clone(), 120.0);
        let mut rng = StdRng::seed_from_u64(7);
        let mut positions = table();
        positions[3].y = -9.97;

        animator.update(0.0, &mut FixedTempo(None), &mut positions, &mut rng);
        assert_eq!(positions[3].y, params.floor_height_m);

        // Idempotent once at the floor
        for frame in 1..10 {
            let now = frame as f32 / 60.0;
            animator.update(now, &mut FixedTempo(None), &mut positions, &mut rng);
            assert_eq!(positions[3].y, params.floor_height_m);
        }
    }

    #[test]
    fn test_risers_fall_one_step_per_frame() {
        let params = AnimationParams::default();
        let mut animator = BeatAnimator::new(params.clone(), 120.0);
        let mut rng = StdRng::seed_from_u64(7);
        let mut positions = table();

        animator.update(0.0, &mut FixedTempo(None), &mut positions, &mut rng);
        for index in params.riser_range.clone() {
            assert_eq!(positions[index].y, -params.decay_step_m);
        }
        // Static objects are untouched
        assert_eq!(positions[0], Vec3::ZERO);
        assert_eq!(positions[35], Vec3::ZERO);
    }

    #[test]
    fn test_oscillator_heights() {
        let params = AnimationParams::default();
        let bpm = 120.0;

        // t = 0: both parities at the base
        assert_eq!(oscillator_height(&params, bpm, 12, 0.0), -10.0);
        assert_eq!(oscillator_height(&params, bpm, 11, 0.0), -10.0);

        // t = 15 / bpm: phase 0.5 rad, mirrored by parity
        let t = 15.0 / bpm;
        let offset = 5.0 * 0.5f32.sin();
        assert!((oscillator_height(&params, bpm, 12, t) - (-10.0 + offset)).abs() < 1e-5);
        assert!((oscillator_height(&params, bpm, 11, t) - (-10.0 - offset)).abs() < 1e-5);

        // Full period 60π / bpm returns to the base
        let period = 60.0 * std::f32::consts::PI / bpm;
        assert!((oscillator_height(&params, bpm, 12, period) + 10.0).abs() < 1e-4);
        assert!((oscillator_height(&params, bpm, 11, period) + 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_tempo_is_flat() {
        let params = AnimationParams::default();
        assert_eq!(oscillator_height(&params, 0.0, 12, 42.0), -10.0);
    }

    #[test]
    fn test_beat_resets_pair_to_origin() {
        let params = AnimationParams::default();
        let mut animator = BeatAnimator::new(params.clone(), 120.0);
        let mut rng = StdRng::seed_from_u64(99);
        let mut positions = vec![Vec3::new(0.0, -10.0, 0.0); 40];

        animator.enqueue_beats([1.0, 2.0]);
        let frame = animator.update(1.02, &mut FixedTempo(None), &mut positions, &mut rng);

        let (primary, paired) = frame.reset.expect("beat should reset risers");
        assert!(params.riser_range.contains(&primary));
        assert_eq!(paired, paired_riser(&params, primary));

        // Reset happens before decay, so the pair sits one step below the origin
        assert_eq!(positions[primary], Vec3::new(0.0, -params.decay_step_m, 0.0));
        assert_eq!(positions[paired], Vec3::new(0.0, -params.decay_step_m, 0.0));
        assert_eq!(animator.queue().len(), 1);
    }

    #[test]
    fn test_tempo_refresh_drives_oscillation() {
        let params = AnimationParams::default();
        let mut animator = BeatAnimator::new(params.clone(), 120.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut positions = table();

        let mut source = FixedTempo(Some(90.0));
        let frame = animator.update(3.0, &mut source, &mut positions, &mut rng);
        assert_eq!(frame.tempo_update, Some(90.0));
        assert_eq!(animator.bpm(), 90.0);
        assert_eq!(positions[12].y, oscillator_height(&params, 90.0, 12, 3.0));
    }
}
