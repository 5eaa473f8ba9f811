//! Playback of a decoded track on the default output device.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::{AudioError, AudioTrack};

/// Track playing on a cpal output stream
///
/// The callback only reads the shared samples and advances an atomic frame
/// counter, so the frame loop never contends for a lock.
pub struct Playback {
    /// Output stream (kept alive)
    _stream: cpal::Stream,

    /// Output frames written so far
    played_frames: Arc<AtomicUsize>,

    output_rate: u32,

    duration_s: f64,
}

impl Playback {
    /// Start playing `track` on the default output device
    pub fn start(track: Arc<AudioTrack>) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoOutputDevice)?;

        let config = device.default_output_config()?;
        let output_rate = config.sample_rate().0;
        let output_channels = config.channels() as usize;

        log::info!(
            "Audio: {} @ {}Hz, {} channel(s)",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            output_rate,
            output_channels
        );
        if output_rate != track.sample_rate {
            log::debug!(
                "Resampling {}Hz -> {}Hz (nearest sample)",
                track.sample_rate,
                output_rate
            );
        }

        let played_frames = Arc::new(AtomicUsize::new(0));
        let callback_frames = Arc::clone(&played_frames);
        let duration_s = track.duration();

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let start = callback_frames.load(Ordering::Relaxed);
                let written = fill_output(data, &track, start, output_rate, output_channels);
                callback_frames.fetch_add(written, Ordering::Relaxed);
            },
            |err| log::error!("Audio stream error: {}", err),
            None,
        )?;

        stream.play()?;

        Ok(Self {
            _stream: stream,
            played_frames,
            output_rate,
            duration_s,
        })
    }

    /// Playback position in seconds
    pub fn position_s(&self) -> f64 {
        self.played_frames.load(Ordering::Relaxed) as f64 / self.output_rate as f64
    }

    pub fn is_finished(&self) -> bool {
        self.position_s() >= self.duration_s
    }
}

/// Fill an interleaved output buffer starting at output frame `start_frame`
///
/// Source frames are picked by nearest sample for the output rate. Output
/// channels beyond the source's wrap around onto its channels. Past the end of
/// the track the buffer is filled with silence. Returns the frames written.
pub fn fill_output(
    data: &mut [f32],
    track: &AudioTrack,
    start_frame: usize,
    output_rate: u32,
    output_channels: usize,
) -> usize {
    if output_channels == 0 {
        return 0;
    }

    let source_frames = track.num_frames();
    let ratio = track.sample_rate as f64 / output_rate as f64;

    for (i, frame) in data.chunks_mut(output_channels).enumerate() {
        let source_frame = ((start_frame + i) as f64 * ratio) as usize;
        if source_frame >= source_frames || track.channels == 0 {
            frame.fill(0.0);
            continue;
        }

        let base = source_frame * track.channels;
        for (channel, out) in frame.iter_mut().enumerate() {
            *out = track.samples[base + channel % track.channels];
        }
    }

    data.len() / output_channels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_fills_every_output_channel() {
        let track = AudioTrack::mono(vec![0.1, 0.2, 0.3], 48000);
        let mut out = [0.0; 6];

        let written = fill_output(&mut out, &track, 0, 48000, 2);
        assert_eq!(written, 3);
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2, 0.3, 0.3]);
    }

    #[test]
    fn test_nearest_sample_upsampling() {
        // 2x output rate repeats each source frame
        let track = AudioTrack::mono(vec![1.0, 2.0], 22050);
        let mut out = [0.0; 4];

        fill_output(&mut out, &track, 0, 44100, 1);
        assert_eq!(out, [1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_silence_after_end() {
        let track = AudioTrack {
            samples: vec![0.5, -0.5],
            sample_rate: 44100,
            channels: 2,
        };
        let mut out = [9.0; 4];

        fill_output(&mut out, &track, 0, 44100, 2);
        assert_eq!(out, [0.5, -0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_resumes_from_start_frame() {
        let track = AudioTrack::mono(vec![0.0, 1.0, 2.0, 3.0], 44100);
        let mut out = [0.0; 2];

        fill_output(&mut out, &track, 2, 44100, 1);
        assert_eq!(out, [2.0, 3.0]);
    }
}
