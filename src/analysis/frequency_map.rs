//! Log-frequency bar mapping
//!
//! Each display bar maps to a fractional FFT bin. Bars are spaced evenly in
//! log-frequency between the configured floor and Nyquist, so low frequencies
//! get many bars and the top octave only a few.

use super::AnalysisError;

/// Horizontal extent of the 3D waterfall plane, in world units
pub const PLANE_SPAN: f32 = 5.2;

/// One bar's entry in the map
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BarMapping {
    /// Fractional FFT bin index, within `[1, fft_size/2 - 2]`
    pub bin: f32,
    /// World-space x position across `PLANE_SPAN`
    pub x: f32,
    /// Hue seed (0.0 to 0.66) for rainbow-by-frequency coloring
    pub hue: f32,
}

/// Precomputed bar-to-bin table
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrequencyMap {
    bars: Vec<BarMapping>,
}

impl FrequencyMap {
    /// Build the table for `bar_count` bars.
    ///
    /// Must be rebuilt whenever bar count, FFT size or sample rate changes.
    pub fn new(
        bar_count: usize,
        fft_size: usize,
        sample_rate: u32,
        min_freq: f32,
    ) -> Result<Self, AnalysisError> {
        let sr = sample_rate.max(1) as f32;
        let min_f = min_freq.max(1.0);
        // Keep ratio > 1 even for absurdly low sample rates
        let max_f = (sr * 0.5).max(min_f * 1.001);
        let ratio = max_f / min_f;
        let max_bin = (fft_size / 2).saturating_sub(2).max(1) as f32;

        let mut bars = Vec::new();
        bars.try_reserve_exact(bar_count)?;
        bars.extend((0..bar_count).map(|i| {
            let t = if bar_count == 1 {
                0.0
            } else {
                i as f32 / (bar_count - 1) as f32
            };
            let freq = min_f * ratio.powf(t);
            let bin = (freq * fft_size as f32 / sr).clamp(1.0, max_bin);

            BarMapping {
                bin,
                x: -PLANE_SPAN * 0.5 + t * PLANE_SPAN,
                hue: 0.66 * t,
            }
        }));

        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[BarMapping] {
        &self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_matches_bar_count() {
        let map = FrequencyMap::new(37, 4096, 44100, 20.0).unwrap();
        assert_eq!(map.bars().len(), 37);
    }

    #[test]
    fn test_bins_monotonic() {
        for &bars in &[2usize, 8, 100, 1000] {
            for &fft in &[512usize, 4096, 16384] {
                let map = FrequencyMap::new(bars, fft, 48000, 20.0).unwrap();
                for pair in map.bars().windows(2) {
                    assert!(pair[1].bin >= pair[0].bin);
                }
            }
        }
    }

    #[test]
    fn test_bins_strictly_increasing_when_unclamped() {
        // With a large FFT every bar lands above bin 1, so spacing is strict
        let map = FrequencyMap::new(64, 16384, 44100, 20.0).unwrap();
        for pair in map.bars().windows(2) {
            assert!(pair[1].bin > pair[0].bin);
        }
    }

    #[test]
    fn test_bins_clamped() {
        let map = FrequencyMap::new(50, 512, 44100, 1.0).unwrap();
        for bar in map.bars() {
            assert!(bar.bin >= 1.0);
            assert!(bar.bin <= 254.0);
        }
        assert_eq!(map.bars()[0].bin, 1.0);
        assert_eq!(map.bars()[49].bin, 254.0);
    }

    #[test]
    fn test_single_bar_uses_floor() {
        let map = FrequencyMap::new(1, 4096, 44100, 20.0).unwrap();
        let expected = 20.0 * 4096.0 / 44100.0;
        assert!((map.bars()[0].bin - expected).abs() < 1e-4);
        assert_eq!(map.bars()[0].hue, 0.0);
    }

    #[test]
    fn test_x_span_and_hue() {
        let map = FrequencyMap::new(11, 4096, 44100, 20.0).unwrap();
        let first = map.bars()[0];
        let last = map.bars()[10];
        assert!((first.x + PLANE_SPAN / 2.0).abs() < 1e-5);
        assert!((last.x - PLANE_SPAN / 2.0).abs() < 1e-5);
        assert!((last.hue - 0.66).abs() < 1e-5);
    }

    #[test]
    fn test_top_bar_at_nyquist() {
        let map = FrequencyMap::new(10, 4096, 44100, 20.0).unwrap();
        // Nyquist lands at bin 2048, clamped to 2046
        assert_eq!(map.bars()[9].bin, 2046.0);
    }

    #[test]
    fn test_oversized_table_is_an_error() {
        assert!(matches!(
            FrequencyMap::new(usize::MAX / 8, 4096, 44100, 20.0),
            Err(AnalysisError::Allocation(_))
        ));
    }
}
