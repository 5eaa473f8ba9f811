//! Audio file decoding using Symphonia.
//!
//! Supports WAV, MP3, FLAC, and AAC formats.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::AudioError;

/// Decoded audio track
#[derive(Debug, Clone)]
pub struct AudioTrack {
    /// Interleaved samples (f32, normalized to -1.0..1.0)
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: usize,
}

impl AudioTrack {
    /// Mono track from raw samples
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Number of frames (samples per channel)
    pub fn num_frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels
    }

    /// Average the channels down to one
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks(self.channels)
            .map(|frame| frame.iter().sum::<f32>() / self.channels as f32)
            .collect()
    }
}

/// Packet-by-packet decoder for the first audio track of a file
struct TrackReader {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    /// From the container, else from the first decoded block
    sample_rate: Option<u32>,
    channels: Option<usize>,
    buffer: Option<SampleBuffer<f32>>,
    skipped_packets: usize,
}

impl TrackReader {
    fn open(path: &Path) -> Result<Self, AudioError> {
        let source = MediaSourceStream::new(Box::new(File::open(path)?), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let format = symphonia::default::get_probe()
            .format(
                &hint,
                source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )?
            .format;

        let (track_id, codec_params) = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .map(|t| (t.id, t.codec_params.clone()))
            .ok_or(AudioError::NoAudioTrack)?;

        let decoder =
            symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate: codec_params.sample_rate,
            channels: codec_params.channels.map(|c| c.count()),
            buffer: None,
            skipped_packets: 0,
        })
    }

    /// Append the next decoded block of interleaved samples to `out`
    ///
    /// Returns `false` at the end of the stream.
    fn read_block(&mut self, out: &mut Vec<f32>) -> Result<bool, AudioError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(false);
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // Corrupt frames are dropped rather than failing the whole file
                Err(SymphoniaError::DecodeError(_)) => {
                    self.skipped_packets += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            self.sample_rate = self.sample_rate.or(Some(spec.rate));
            self.channels = self.channels.or(Some(spec.channels.count()));

            // Grow the scratch buffer when a block outsizes it
            let needed = decoded.capacity() * spec.channels.count();
            if self.buffer.as_ref().map_or(true, |b| b.capacity() < needed) {
                self.buffer = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
            }
            if let Some(buffer) = &mut self.buffer {
                buffer.copy_interleaved_ref(decoded);
                out.extend_from_slice(buffer.samples());
            }
            return Ok(true);
        }
    }
}

/// Decode an audio file into interleaved f32 samples
pub fn load_audio(path: &Path) -> Result<AudioTrack, AudioError> {
    let mut reader = TrackReader::open(path)?;

    let mut samples = Vec::new();
    while reader.read_block(&mut samples)? {}

    if reader.skipped_packets > 0 {
        log::warn!(
            "{}: skipped {} undecodable packets",
            path.display(),
            reader.skipped_packets
        );
    }

    let track = AudioTrack {
        samples,
        sample_rate: reader.sample_rate.ok_or(AudioError::UnknownSampleRate)?,
        channels: reader.channels.unwrap_or(1),
    };
    log::info!(
        "Loaded {}: {:.1}s @ {}Hz, {} channel(s)",
        path.display(),
        track.duration(),
        track.sample_rate,
        track.channels
    );
    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        let track = AudioTrack {
            samples: vec![0.0; 44100 * 2], // 1 second of stereo
            sample_rate: 44100,
            channels: 2,
        };
        assert!((track.duration() - 1.0).abs() < 0.001);
        assert_eq!(track.num_frames(), 44100);
    }

    #[test]
    fn test_to_mono() {
        let track = AudioTrack {
            samples: vec![1.0, 0.0, 0.5, 0.5],
            sample_rate: 44100,
            channels: 2,
        };
        assert_eq!(track.to_mono(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_missing_file() {
        let result = load_audio(Path::new("/nonexistent/music.mp3"));
        assert!(matches!(result, Err(AudioError::Io(_))));
    }

    #[test]
    fn test_decodes_mono_wav_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..5000i32 {
            writer.write_sample((i % 200 - 100) as i16 * 100).unwrap();
        }
        writer.finalize().unwrap();

        let track = load_audio(&path).unwrap();
        assert_eq!(track.channels, 1);
        assert_eq!(track.sample_rate, 22050);
        assert_eq!(track.samples.len(), 5000);
        assert!((track.samples[0] - (-10000.0 / 32768.0)).abs() < 1e-4);
    }
}
