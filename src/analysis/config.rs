//! Analysis configuration
//!
//! All tunable spectral parameters in one place. The render thread owns the
//! live copy inside `Spectrogram`; changes go through
//! `Spectrogram::reconfigure`, never by mutating fields in place.

use serde::{Deserialize, Serialize};

use super::AnalysisError;

/// FFT sizes offered to the user
pub const FFT_SIZES: [usize; 6] = [512, 1024, 2048, 4096, 8192, 16384];

/// Upper bound on waterfall depth; the history store is sized for this
pub const MAX_HISTORY_LINES: usize = 560;

/// Bar count bounds
pub const MIN_BARS: usize = 1;
pub const MAX_BARS: usize = 4096;

/// Default lowest displayed frequency in Hz
pub const MIN_FREQ: f32 = 20.0;

/// Tunable spectral resolution
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Transform length, one of `FFT_SIZES`
    pub fft_size: usize,
    /// Number of display bars (frequency columns)
    pub bar_count: usize,
    /// Visible waterfall depth, at most `MAX_HISTORY_LINES`
    pub history_depth: usize,
    /// User fine-tune added to the driver latency, in samples
    pub latency_adjust: i64,
    /// Lowest displayed frequency in Hz
    pub min_freq: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: 4096,
            bar_count: 1000,
            history_depth: 140,
            latency_adjust: 0,
            min_freq: MIN_FREQ,
        }
    }
}

impl AnalysisConfig {
    /// High-resolution settings used by the flat spectrogram view
    pub fn spectrogram_preset(&self) -> Self {
        Self {
            fft_size: 16384,
            history_depth: MAX_HISTORY_LINES,
            ..*self
        }
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !FFT_SIZES.contains(&self.fft_size) {
            return Err(AnalysisError::UnsupportedFftSize(self.fft_size));
        }
        if !(MIN_BARS..=MAX_BARS).contains(&self.bar_count) {
            return Err(AnalysisError::BarCount(self.bar_count));
        }
        if !(1..=MAX_HISTORY_LINES).contains(&self.history_depth) {
            return Err(AnalysisError::HistoryDepth(self.history_depth));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_listed_fft_size() {
        let config = AnalysisConfig {
            fft_size: 3000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::UnsupportedFftSize(3000))
        ));
    }

    #[test]
    fn test_rejects_depth_over_max() {
        let config = AnalysisConfig {
            history_depth: MAX_HISTORY_LINES + 1,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::HistoryDepth(_))));
    }

    #[test]
    fn test_rejects_zero_bars() {
        let config = AnalysisConfig {
            bar_count: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::BarCount(0))));
    }

    #[test]
    fn test_spectrogram_preset() {
        let config = AnalysisConfig {
            bar_count: 300,
            ..Default::default()
        };
        let preset = config.spectrogram_preset();
        assert_eq!(preset.fft_size, 16384);
        assert_eq!(preset.history_depth, MAX_HISTORY_LINES);
        assert_eq!(preset.bar_count, 300);
        assert!(preset.validate().is_ok());
    }
}
