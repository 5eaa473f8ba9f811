//! Audio system tying playback, beat tracking and tempo analysis together.

use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam_channel::Receiver;

use super::playback::Playback;
use super::synth::generate_kick_track;
use super::tracker::{spawn_beat_tracker, TempoAnalyzer};
use super::{load_audio, AudioError, AudioTrack};
use crate::animation::TempoSource;
use crate::params::BeatDetectionConfig;

/// Sample rate of synthesized metronome tracks (Hz)
const METRONOME_SAMPLE_RATE: u32 = 44100;

/// Length of synthesized metronome tracks (seconds)
const METRONOME_DURATION_S: f32 = 180.0;

/// Metronome kick level, leaving headroom below full scale
const METRONOME_GAIN: f32 = 0.5;

/// Audio system managing playback and beat analysis
pub struct AudioSystem {
    /// Output stream; `None` for a muted run
    playback: Option<Playback>,

    /// Beat times from the tracker thread, in playback seconds
    beats: Receiver<f32>,

    /// Tracker thread handle (kept for the lifetime of the system)
    _tracker: thread::JoinHandle<()>,

    analyzer: TempoAnalyzer,

    duration_s: f32,

    /// Wall-clock start of playback
    started: Instant,
}

impl AudioSystem {
    /// Start beat tracking and, unless `mute` is set, playback of `track`
    ///
    /// A missing or failing output device is not fatal: the run continues
    /// muted and the visuals are still driven by the analysis.
    pub fn new(
        track: AudioTrack,
        config: BeatDetectionConfig,
        mute: bool,
    ) -> Result<Self, AudioError> {
        config.validate()?;

        let track = Arc::new(track);
        let mono: Arc<[f32]> = track.to_mono().into();
        let (beats, tracker) =
            spawn_beat_tracker(Arc::clone(&mono), track.sample_rate, config.clone())?;
        let analyzer = TempoAnalyzer::new(mono, track.sample_rate, config);

        let playback = if mute {
            log::info!("Audio muted");
            None
        } else {
            match Playback::start(Arc::clone(&track)) {
                Ok(playback) => Some(playback),
                Err(e) => {
                    log::warn!("{}; continuing without sound", e);
                    None
                }
            }
        };

        Ok(Self {
            playback,
            beats,
            _tracker: tracker,
            analyzer,
            duration_s: track.duration() as f32,
            started: Instant::now(),
        })
    }

    /// Decode `path` and start it
    pub fn from_file(
        path: &Path,
        config: BeatDetectionConfig,
        mute: bool,
    ) -> Result<Self, AudioError> {
        let track = load_audio(path)?;
        Self::new(track, config, mute)
    }

    /// Synthesize a kick on every beat at `bpm` and start it
    pub fn metronome(
        bpm: f32,
        config: BeatDetectionConfig,
        mute: bool,
    ) -> Result<Self, AudioError> {
        log::info!("Metronome at {} BPM", bpm);
        let samples = generate_kick_track(
            bpm,
            METRONOME_SAMPLE_RATE,
            METRONOME_DURATION_S,
            METRONOME_GAIN,
        );
        Self::new(AudioTrack::mono(samples, METRONOME_SAMPLE_RATE), config, mute)
    }

    /// Seconds of wall-clock time since playback started
    pub fn elapsed_s(&self) -> f32 {
        self.started.elapsed().as_secs_f32()
    }

    /// Beat times delivered since the last call
    pub fn drain_beats(&self) -> impl Iterator<Item = f32> + '_ {
        self.beats.try_iter()
    }

    /// Tempo over the opening of the track, used before the first refresh
    pub fn initial_bpm(&self) -> Option<f32> {
        self.analyzer.initial_bpm()
    }

    /// Track length in seconds
    pub fn duration_s(&self) -> f32 {
        self.duration_s
    }

    pub fn is_muted(&self) -> bool {
        self.playback.is_none()
    }

    /// True once the whole track has played
    pub fn is_finished(&self) -> bool {
        match &self.playback {
            Some(playback) => playback.is_finished(),
            None => self.elapsed_s() >= self.duration_s,
        }
    }
}

impl TempoSource for AudioSystem {
    fn tempo_over(&mut self, window: Range<f32>) -> Option<f32> {
        self.analyzer.tempo_over(window)
    }
}
