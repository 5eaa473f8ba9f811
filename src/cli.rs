//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::hmd::HmdBackend;
use crate::params::{AnimationParams, MatchPolicy, ViewerParams};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Beatroom")]
#[command(about = "Beat-reactive room for head-mounted displays", long_about = None)]
pub struct Args {
    /// Music file to play and analyze (WAV, MP3, FLAC, AAC)
    #[arg(long, value_name = "PATH", default_value = "music.mp3")]
    pub audio: PathBuf,

    /// Play a synthesized kick track at this tempo instead of a file
    #[arg(long, value_name = "BPM")]
    pub metronome: Option<f32>,

    /// Movement speed multiplier
    #[arg(long, value_name = "FACTOR", default_value = "1.0")]
    pub speed: f32,

    /// How detected beats are matched: nearest (default), front
    #[arg(long, value_name = "POLICY", default_value = "nearest")]
    pub match_policy: String,

    /// Seed for riser selection (random if omitted)
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Headset backend: desktop (default), none
    #[arg(long, value_name = "BACKEND", default_value = "desktop")]
    pub hmd: String,

    /// Analyze the track without playing it
    #[arg(long)]
    pub mute: bool,
}

impl Args {
    /// Parse the beat match policy
    pub fn parse_match_policy(&self) -> MatchPolicy {
        match self.match_policy.to_lowercase().as_str() {
            "nearest" => MatchPolicy::Nearest,
            "front" => {
                log::info!("Beat matching: front of queue");
                MatchPolicy::Front
            }
            other => {
                log::warn!("Unknown match policy '{}', using nearest", other);
                MatchPolicy::Nearest
            }
        }
    }

    /// Parse the headset backend
    pub fn parse_hmd_backend(&self) -> HmdBackend {
        match self.hmd.to_lowercase().as_str() {
            "desktop" => HmdBackend::Desktop,
            "none" => HmdBackend::None,
            other => {
                log::warn!("Unknown HMD backend '{}', using desktop", other);
                HmdBackend::Desktop
            }
        }
    }

    pub fn animation_params(&self) -> AnimationParams {
        AnimationParams {
            match_policy: self.parse_match_policy(),
            ..AnimationParams::default()
        }
    }

    pub fn viewer_params(&self) -> ViewerParams {
        if self.speed <= 0.0 {
            log::warn!("Speed {} is not positive, using 1.0", self.speed);
            return ViewerParams::default();
        }
        ViewerParams {
            speed: self.speed,
            ..ViewerParams::default()
        }
    }
}
