//! Flat spectrogram display widget
//!
//! Uploads the raster compositor's image as one texture and draws it as a
//! single textured rect, low frequencies at the bottom.

use eframe::egui::{self, pos2, Color32, ColorImage, Rect, TextureHandle, TextureOptions};

use super::lut::ColorLut;
use super::raster::RasterCompositor;
use crate::analysis::HistoryRing;

#[derive(Default)]
pub struct SpectrogramView {
    raster: RasterCompositor,
    texture: Option<TextureHandle>,
}

impl SpectrogramView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the spectrogram into all available space
    pub fn show(&mut self, ui: &mut egui::Ui, history: &HistoryRing, lut: &ColorLut) -> egui::Response {
        let size = ui.available_size();
        let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
        let rect = response.rect;

        let px_width = (rect.width() * ui.ctx().pixels_per_point()).round().max(1.0) as u32;
        let img = self.raster.compose(history, lut, px_width);
        let color_image = ColorImage::from_rgb(
            [img.width() as usize, img.height() as usize],
            img.as_raw(),
        );

        if let Some(texture) = &mut self.texture {
            texture.set(color_image, TextureOptions::LINEAR);
        } else {
            self.texture = Some(ui.ctx().load_texture(
                "spectrogram",
                color_image,
                TextureOptions::LINEAR,
            ));
        }

        if let Some(texture) = &self.texture {
            // Image row 0 is the lowest bar; flip V so it lands at the bottom
            let uv = Rect::from_min_max(pos2(0.0, 1.0), pos2(1.0, 0.0));
            painter.image(texture.id(), rect, uv, Color32::WHITE);
        }

        response
    }
}
