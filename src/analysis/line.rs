//! Display line builder
//!
//! Turns one magnitude frame into `bar_count` normalized values by
//! interpolating between neighbouring bins and compressing logarithmically.

use super::frequency_map::FrequencyMap;

/// Sensitivity of the log compression curve
pub const MAG_GAIN: f32 = 140.0;

/// Fill `line` (one value per bar, each in [0, 1]) from `magnitudes`.
///
/// `line` must be as long as the map; `magnitudes` needs at least two bins.
pub fn build_line(magnitudes: &[f32], map: &FrequencyMap, line: &mut [f32]) {
    let n_bins = magnitudes.len();
    if n_bins < 2 {
        line.iter_mut().for_each(|v| *v = 0.0);
        return;
    }

    let log_den = (1.0 + MAG_GAIN).log10();
    let max_bin0 = (n_bins - 2) as f32;

    for (out, bar) in line.iter_mut().zip(map.bars()) {
        let floor = bar.bin.floor();
        let frac = bar.bin - floor;
        let bin0 = floor.clamp(0.0, max_bin0) as usize;
        let bin1 = bin0 + 1;

        let m = magnitudes[bin0] * (1.0 - frac) + magnitudes[bin1] * frac;
        let v = (1.0 + m * MAG_GAIN).log10() / log_den;
        *out = v.clamp(0.0, 1.0);
    }
}
