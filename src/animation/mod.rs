//! Beat-synchronised animation: beat queue, tempo refresh and object rules.

mod animator;
mod beat_queue;
mod tempo;

pub use animator::{oscillator_height, paired_riser, AnimationFrame, BeatAnimator};
pub use beat_queue::{BeatPoll, BeatQueue};
pub use tempo::{TempoClock, TempoSource, TempoTracker};
