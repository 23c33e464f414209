//! Graded color lookup table
//!
//! Grading runs in three steps: an input gamma curve, the colormap lookup,
//! then a chroma boost around the color's own minimum channel. The LUT bakes
//! all three at a fixed quantization and is only rebuilt when marked dirty.

use serde::{Deserialize, Serialize};

use super::colormap::Colormap;

/// Number of quantization steps in the LUT
pub const LUT_SIZE: usize = 1024;

/// Tunable grading applied on top of the colormap
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorGrading {
    /// Exponent applied to the input value; below 1 lifts quiet detail
    pub gamma: f32,
    /// Chroma multiplier; 1.0 leaves the colormap untouched
    pub saturation: f32,
}

impl Default for ColorGrading {
    fn default() -> Self {
        Self {
            gamma: 0.2,
            saturation: 1.5,
        }
    }
}

impl ColorGrading {
    /// Grading used by the 3D line view, which keeps the map's own chroma
    pub fn line_view(&self) -> Self {
        Self {
            saturation: 1.0,
            ..*self
        }
    }
}

/// Scale chroma (`max - min`) by `boost` around the minimum channel.
///
/// Boosted chroma never exceeds the max channel, so no channel goes negative.
pub fn boost_saturation(rgb: [f32; 3], boost: f32) -> [f32; 3] {
    let max_c = rgb[0].max(rgb[1]).max(rgb[2]);
    let min_c = rgb[0].min(rgb[1]).min(rgb[2]);
    let delta = max_c - min_c;
    if delta <= 0.001 {
        return rgb;
    }

    let chroma = (delta * boost).min(max_c);
    let scale = chroma / delta;
    rgb.map(|c| min_c + (c - min_c) * scale)
}

/// Full grading pipeline for one value, result in [0, 1] per channel
pub fn grade(colormap: Colormap, value: f32, grading: &ColorGrading) -> [f32; 3] {
    let v = value.clamp(0.0, 1.0).powf(grading.gamma);
    let rgb = colormap.color_at(v);
    boost_saturation(rgb, grading.saturation).map(|c| c.clamp(0.0, 1.0))
}

/// Precomputed RGB8 table for the current colormap and grading
pub struct ColorLut {
    colormap: Colormap,
    grading: ColorGrading,
    table: Vec<[u8; 3]>,
    dirty: bool,
}

impl ColorLut {
    pub fn new(colormap: Colormap, grading: ColorGrading) -> Self {
        let mut lut = Self {
            colormap,
            grading,
            table: vec![[0; 3]; LUT_SIZE],
            dirty: true,
        };
        lut.refresh();
        lut
    }

    pub fn set_colormap(&mut self, colormap: Colormap) {
        if colormap != self.colormap {
            self.colormap = colormap;
            self.dirty = true;
        }
    }

    pub fn set_grading(&mut self, grading: ColorGrading) {
        if grading != self.grading {
            self.grading = grading;
            self.dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rebuild the table if anything changed since the last rebuild
    pub fn refresh(&mut self) {
        if !self.is_dirty() {
            return;
        }
        for (i, entry) in self.table.iter_mut().enumerate() {
            let v = i as f32 / (LUT_SIZE - 1) as f32;
            let rgb = grade(self.colormap, v, &self.grading);
            *entry = rgb.map(|c| (c * 255.0) as u8);
        }
        self.dirty = false;
    }

    /// Quantized color for a normalized value
    pub fn lookup(&self, value: f32) -> [u8; 3] {
        let idx = (value * (LUT_SIZE - 1) as f32) as isize;
        self.table[idx.clamp(0, LUT_SIZE as isize - 1) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boost_keeps_gray() {
        assert_eq!(boost_saturation([0.4, 0.4, 0.4], 1.5), [0.4, 0.4, 0.4]);
    }

    #[test]
    fn test_boost_clamped_by_max_channel() {
        // delta 0.4 * 3 = 1.2, capped at max channel 0.6
        let out = boost_saturation([0.6, 0.3, 0.2], 3.0);
        assert!((out[0] - 0.8).abs() < 1e-6);
        assert!((out[2] - 0.2).abs() < 1e-6);
        for c in out {
            assert!(c >= 0.0);
        }
    }

    #[test]
    fn test_boost_scales_chroma() {
        let out = boost_saturation([0.5, 0.3, 0.2], 1.5);
        // chroma 0.3 -> 0.45 around min 0.2
        assert!((out[0] - 0.65).abs() < 1e-6);
        assert!((out[1] - 0.35).abs() < 1e-6);
        assert!((out[2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_unit_saturation_is_identity() {
        let grading = ColorGrading {
            gamma: 1.0,
            saturation: 1.0,
        };
        for &v in &[0.0, 0.3, 0.77, 1.0] {
            let expected = Colormap::Viridis.color_at(v);
            let got = grade(Colormap::Viridis, v, &grading);
            for (a, b) in got.iter().zip(&expected) {
                assert!((a - b).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_gamma_lifts_midrange() {
        let grading = ColorGrading {
            gamma: 0.2,
            saturation: 1.0,
        };
        // 0.5^0.2 is about 0.87 through the map
        let got = grade(Colormap::Grayscale, 0.5, &grading);
        assert!((got[0] - 0.5f32.powf(0.2)).abs() < 1e-5);
    }

    #[test]
    fn test_lookup_endpoints() {
        let lut = ColorLut::new(Colormap::Grayscale, ColorGrading::default());
        assert_eq!(lut.lookup(0.0), [0, 0, 0]);
        assert_eq!(lut.lookup(1.0), [255, 255, 255]);
        assert_eq!(lut.lookup(-1.0), [0, 0, 0]);
        assert_eq!(lut.lookup(4.0), [255, 255, 255]);
    }

    #[test]
    fn test_dirty_until_refreshed() {
        let mut lut = ColorLut::new(Colormap::Inferno, ColorGrading::default());
        assert!(!lut.is_dirty());
        let before = lut.lookup(0.5);

        lut.set_colormap(Colormap::Inferno);
        assert!(!lut.is_dirty());

        lut.set_colormap(Colormap::Grayscale);
        assert!(lut.is_dirty());
        // Stale until rebuilt
        assert_eq!(lut.lookup(0.5), before);

        lut.refresh();
        assert!(!lut.is_dirty());
        assert_ne!(lut.lookup(0.5), before);
    }
}
