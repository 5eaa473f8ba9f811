//! Beat-reactive animation parameters.

use std::ops::RangeInclusive;

use super::ConfigError;

/// How a matched beat is removed from the pending queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Remove the matching timestamp closest to the current time, then
    /// discard timestamps that fell behind the tolerance window
    #[default]
    Nearest,

    /// Remove the front of the queue whenever any timestamp matches
    Front,
}

/// Beat matching, tempo refresh and riser/oscillator rules
#[derive(Debug, Clone)]
pub struct AnimationParams {
    /// Half-width of the beat match window (seconds)
    pub beat_tolerance_s: f32,

    /// Beat removal policy
    pub match_policy: MatchPolicy,

    /// Interval between tempo refreshes (seconds of playback time)
    pub tempo_refresh_interval_s: f32,

    /// Half-width of the audio window analysed on refresh (seconds)
    /// Window is [now - half, now + half]
    pub tempo_window_half_s: f32,

    /// Tempo used until the first estimate arrives (BPM)
    pub fallback_bpm: f32,

    /// Object indices of riser group A (reset on beat, then decay)
    /// Index 0 is the floor, so the risers start right after it
    pub riser_range: RangeInclusive<usize>,

    /// Offset from the random riser to its partner, wrapped inside `riser_range`
    /// Half the group size, so a beat lights two opposite columns of the ring
    pub riser_pair_offset: usize,

    /// Height the risers sink to (meters); also the resting height of the
    /// oscillators. Deep enough to hide the columns under the floor
    pub floor_height_m: f32,

    /// Height lost per frame by a riser above the floor (meters)
    pub decay_step_m: f32,

    /// Object indices of riser group B (tempo-driven oscillation)
    pub oscillator_range: RangeInclusive<usize>,

    /// Oscillator base height (meters)
    pub oscillator_base_m: f32,

    /// Oscillator amplitude (meters)
    pub oscillator_amplitude_m: f32,

    /// Angular rate multiplier applied to beats-per-second
    /// Phase is `multiplier * bpm / 60 * t` radians
    pub oscillator_rate_multiplier: f32,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            beat_tolerance_s: 0.1,
            match_policy: MatchPolicy::Nearest,
            tempo_refresh_interval_s: 3.0,
            tempo_window_half_s: 3.0,
            fallback_bpm: 120.0,
            riser_range: 1..=10,
            riser_pair_offset: 5,
            floor_height_m: -10.0,
            decay_step_m: 0.05,
            oscillator_range: 11..=30,
            oscillator_base_m: -10.0,
            oscillator_amplitude_m: 5.0,
            oscillator_rate_multiplier: 2.0,
        }
    }
}

impl AnimationParams {
    /// Number of risers in group A
    pub fn riser_count(&self) -> usize {
        self.riser_range.clone().count()
    }

    /// Number of oscillators in group B
    pub fn oscillator_count(&self) -> usize {
        self.oscillator_range.clone().count()
    }

    /// Check the parameters against a scene with `object_count` objects
    pub fn validate(&self, object_count: usize) -> Result<(), ConfigError> {
        if self.riser_range.is_empty() {
            return Err(ConfigError::EmptyRange("riser"));
        }
        if self.oscillator_range.is_empty() {
            return Err(ConfigError::EmptyRange("oscillator"));
        }
        for (name, range) in [
            ("riser", &self.riser_range),
            ("oscillator", &self.oscillator_range),
        ] {
            if *range.end() >= object_count {
                return Err(ConfigError::RangeOutOfBounds {
                    name,
                    end: *range.end(),
                    object_count,
                });
            }
        }
        let (a, b) = (&self.riser_range, &self.oscillator_range);
        if a.start() <= b.end() && b.start() <= a.end() {
            return Err(ConfigError::OverlappingRanges);
        }
        if self.beat_tolerance_s <= 0.0 {
            return Err(ConfigError::NonPositive("beat_tolerance_s"));
        }
        if self.tempo_refresh_interval_s <= 0.0 {
            return Err(ConfigError::NonPositive("tempo_refresh_interval_s"));
        }
        if self.decay_step_m <= 0.0 {
            return Err(ConfigError::NonPositive("decay_step_m"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fit_room() {
        let params = AnimationParams::default();
        assert_eq!(params.riser_count(), 10);
        assert_eq!(params.oscillator_count(), 20);
        assert!(params.validate(31).is_ok());
    }

    #[test]
    fn test_range_past_scene_rejected() {
        let params = AnimationParams::default();
        assert!(matches!(
            params.validate(30),
            Err(ConfigError::RangeOutOfBounds {
                name: "oscillator",
                ..
            })
        ));
    }

    #[test]
    fn test_overlap_rejected() {
        let params = AnimationParams {
            oscillator_range: 10..=20,
            ..AnimationParams::default()
        };
        assert!(matches!(
            params.validate(64),
            Err(ConfigError::OverlappingRanges)
        ));
    }
}
