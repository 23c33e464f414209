//! Raster compositor for the flat spectrogram view
//!
//! Builds one RGB image straight from the history ring through the LUT:
//! columns are time, rows are bars (row 0 = lowest bar). The whole picture is
//! uploaded as a single texture instead of drawing a primitive per cell.

use image::{Rgb, RgbImage};

use super::lut::ColorLut;
use crate::analysis::HistoryRing;

/// Widest image ever produced, regardless of the viewport
pub const MAX_TEXTURE_WIDTH: u32 = 2048;

/// Reusable image buffer for the spectrogram texture
pub struct RasterCompositor {
    image: RgbImage,
}

impl Default for RasterCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterCompositor {
    pub fn new() -> Self {
        Self {
            image: RgbImage::new(1, 1),
        }
    }

    /// History row shown in column `x` of a `width`-wide image.
    ///
    /// Column 0 shows row 0 (newest); the last column shows the oldest row.
    pub fn column_row(x: u32, width: u32, depth: usize) -> usize {
        if width <= 1 || depth <= 1 {
            return 0;
        }
        let t = x as f32 / (width - 1) as f32;
        let row = (t * (depth - 1) as f32).round() as usize;
        row.min(depth - 1)
    }

    /// Fill the image for a viewport `width` pixels wide.
    ///
    /// `lut` must already be refreshed.
    pub fn compose(&mut self, history: &HistoryRing, lut: &ColorLut, width: u32) -> &RgbImage {
        let width = width.clamp(1, MAX_TEXTURE_WIDTH);
        let height = history.bar_count().max(1) as u32;

        if self.image.width() != width || self.image.height() != height {
            self.image = RgbImage::new(width, height);
        }

        let depth = history.depth();
        for x in 0..width {
            let Some(row) = history.row(Self::column_row(x, width, depth)) else {
                continue;
            };
            for (i, &v) in row.iter().enumerate() {
                self.image.put_pixel(x, i as u32, Rgb(lut.lookup(v)));
            }
        }

        &self.image
    }
}
