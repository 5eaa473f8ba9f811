//! Beat detection and tempo estimation configuration.

use std::ops::Range;

use super::ConfigError;

/// Energy-onset beat detection settings
#[derive(Debug, Clone)]
pub struct BeatDetectionConfig {
    /// FFT window size (power of 2, at least 2)
    pub fft_size: usize,

    /// Hop between analysis windows (samples)
    /// 512 ≈ 11.6ms at 44.1kHz
    pub hop_size: usize,

    /// Band whose energy drives onset detection (Hz)
    pub bass_range_hz: (f32, f32),

    /// Peak must exceed the local average by this fraction (0.3 = 30%)
    pub sensitivity: f32,

    /// Local average context on each side of a window (windows)
    /// 8 ≈ 100ms at the default hop
    pub average_windows: usize,

    /// Minimum spacing between two beats (seconds)
    pub min_beat_spacing_s: f32,

    /// Accepted inter-beat interval range when estimating tempo (seconds)
    pub interval_range_s: (f64, f64),

    /// Tempo range estimates are folded into by halving or doubling (BPM)
    pub bpm_range: (f32, f32),

    /// Span analyzed for the tempo used before the first refresh (seconds)
    pub initial_tempo_span_s: f32,
}

impl Default for BeatDetectionConfig {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            hop_size: 512,
            bass_range_hz: (20.0, 200.0),
            sensitivity: 0.3,
            average_windows: 8,
            min_beat_spacing_s: 0.2,
            interval_range_s: (0.2, 2.0),
            bpm_range: (60.0, 200.0),
            initial_tempo_span_s: 280.0,
        }
    }
}

impl BeatDetectionConfig {
    /// Convert frequency (Hz) to FFT bin index
    pub fn hz_to_bin(&self, hz: f32, sample_rate: u32) -> usize {
        (hz * self.fft_size as f32 / sample_rate as f32).round() as usize
    }

    /// FFT bin range of the bass band
    pub fn bass_bins(&self, sample_rate: u32) -> Range<usize> {
        self.hz_to_bin(self.bass_range_hz.0, sample_rate)
            ..self.hz_to_bin(self.bass_range_hz.1, sample_rate)
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), ConfigError> {
        // A one-point window has no Hann shape
        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Err(ConfigError::FftSize(self.fft_size));
        }
        if self.initial_tempo_span_s <= 0.0 {
            return Err(ConfigError::NonPositive("initial_tempo_span_s"));
        }
        if self.hop_size == 0 {
            return Err(ConfigError::NonPositive("hop_size"));
        }
        if self.bpm_range.0 <= 0.0 || self.bpm_range.1 < self.bpm_range.0 * 2.0 {
            return Err(ConfigError::BpmRange(self.bpm_range.0, self.bpm_range.1));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bass_bins() {
        let config = BeatDetectionConfig::default();

        // 44100 / 1024 ≈ 43.07 Hz per bin
        let bins = config.bass_bins(44100);
        assert_eq!(bins.start, 0);
        assert_eq!(bins.end, 5);
    }

    #[test]
    fn test_validate() {
        assert!(BeatDetectionConfig::default().validate().is_ok());

        let config = BeatDetectionConfig {
            fft_size: 1000,
            ..BeatDetectionConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::FftSize(1000))));

        for fft_size in [0, 1] {
            let config = BeatDetectionConfig {
                fft_size,
                ..BeatDetectionConfig::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::FftSize(fft_size)));
        }
        let smallest = BeatDetectionConfig {
            fft_size: 2,
            ..BeatDetectionConfig::default()
        };
        assert!(smallest.validate().is_ok());

        // Folding by two needs an octave of room
        let config = BeatDetectionConfig {
            bpm_range: (100.0, 150.0),
            ..BeatDetectionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
