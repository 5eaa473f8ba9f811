//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (meters, seconds, radians, BPM)
//! - Documented ranges and meanings
//! - Validation where a bad value would break an invariant

mod animation;
mod audio;
mod hmd;
mod render;
mod viewer;

use thiserror::Error;

// Re-export all types
pub use animation::{AnimationParams, MatchPolicy};
pub use audio::BeatDetectionConfig;
pub use hmd::HmdParams;
pub use render::{eye_aspect_ratio, RenderConfig};
pub use viewer::ViewerParams;

/// Rejected parameter combinations
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} range is empty")]
    EmptyRange(&'static str),

    #[error("{name} range ends at index {end} but the scene has {object_count} objects")]
    RangeOutOfBounds {
        name: &'static str,
        end: usize,
        object_count: usize,
    },

    #[error("riser and oscillator ranges overlap")]
    OverlappingRanges,

    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("FFT size must be a power of 2 of at least 2, got {0}")]
    FftSize(usize),

    #[error("BPM range {0}..{1} must span at least an octave")]
    BpmRange(f32, f32),
}
