//! Audio decoding, playback and beat analysis.
//!
//! The decoded track is played through cpal while a background thread scans
//! the same samples for beats and hands their timestamps to the frame loop
//! over a channel. Tempo estimates are computed on demand from a window of
//! the mono mix.

mod beats;
mod loader;
mod playback;
mod synth;
mod system;
mod tracker;

use thiserror::Error;

use crate::params::ConfigError;

pub use beats::{detect_beats, estimate_bpm, hann_window, MIN_TEMPO_INTERVALS};
pub use loader::{load_audio, AudioTrack};
pub use playback::Playback;
pub use synth::{generate_click_track, generate_kick, generate_kick_track};
pub use system::AudioSystem;
pub use tracker::{spawn_beat_tracker, TempoAnalyzer};

/// Errors from decoding or playing audio
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("failed to open audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode audio: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("no decodable audio track found")]
    NoAudioTrack,

    #[error("audio track has no sample rate")]
    UnknownSampleRate,

    #[error("invalid beat detection config: {0}")]
    Config(#[from] ConfigError),

    #[error("no audio output device found")]
    NoOutputDevice,

    #[error("failed to query output config: {0}")]
    OutputConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}
