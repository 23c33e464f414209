//! Waveform overview strip
//!
//! Shows the whole file as per-pixel min/max envelopes with a playhead.
//! The envelope cache is rebuilt only when the strip width or the source
//! buffer changes.

use std::sync::Arc;

use eframe::egui::{self, Color32, Pos2, Rect, Stroke, Vec2};

/// Strip height in points
pub const WAVEFORM_HEIGHT: f32 = 80.0;
const MAX_WIDTH: f32 = 800.0;

/// Min/max of each column, `width + 1` entries each
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Envelope {
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

impl Envelope {
    /// Summarize `samples` into `width + 1` columns.
    ///
    /// Each column covers `len / width` samples starting at its own offset;
    /// min and max always include 0 so silence draws as a flat line.
    pub fn build(samples: &[f32], width: usize) -> Self {
        let total = samples.len();
        if total == 0 {
            return Self::default();
        }
        let width = width.max(1);
        let downsample = (total / width).max(1);

        let (min, max) = (0..=width)
            .map(|x| {
                let start = ((x as f32 / width as f32) * total as f32) as usize;
                let start = start.min(total - 1);
                let end = (start + downsample).min(total);
                samples[start..end]
                    .iter()
                    .fold((0.0f32, 0.0f32), |(lo, hi), &s| (lo.min(s), hi.max(s)))
            })
            .unzip();

        Self { min, max }
    }
}

#[derive(Default)]
pub struct WaveformView {
    envelope: Envelope,
    cache_width: usize,
    source: Option<Arc<[f32]>>,
}

impl WaveformView {
    pub fn new() -> Self {
        Self::default()
    }

    fn update_cache(&mut self, samples: &Arc<[f32]>, width: usize) {
        let same_source = self
            .source
            .as_ref()
            .is_some_and(|s| Arc::ptr_eq(s, samples));
        if same_source && self.cache_width == width {
            return;
        }
        self.envelope = Envelope::build(samples, width);
        self.cache_width = width;
        self.source = Some(Arc::clone(samples));
    }

    /// Draw the strip; `progress` is the playhead position in [0, 1], if any
    pub fn show(&mut self, ui: &mut egui::Ui, samples: &Arc<[f32]>, progress: Option<f32>) -> egui::Response {
        let width = ui.available_width().min(MAX_WIDTH);
        let (response, painter) =
            ui.allocate_painter(Vec2::new(width, WAVEFORM_HEIGHT), egui::Sense::hover());
        let rect = response.rect;

        painter.rect_filled(rect, 2.0, Color32::from_rgba_unmultiplied(10, 10, 14, 220));
        let center_y = rect.center().y;
        painter.line_segment(
            [Pos2::new(rect.left(), center_y), Pos2::new(rect.right(), center_y)],
            Stroke::new(1.0, Color32::from_gray(60)),
        );

        if samples.is_empty() {
            return response;
        }

        let columns = rect.width().max(1.0) as usize;
        self.update_cache(samples, columns);
        self.draw_envelope(&painter, rect);

        if let Some(progress) = progress {
            let x = rect.left() + progress.clamp(0.0, 1.0) * rect.width();
            painter.line_segment(
                [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
                Stroke::new(3.0, Color32::from_rgba_unmultiplied(255, 51, 51, 242)),
            );
        }

        painter.rect_stroke(rect, 2.0, Stroke::new(2.0, Color32::from_rgba_unmultiplied(128, 128, 128, 180)));
        response
    }

    fn draw_envelope(&self, painter: &egui::Painter, rect: Rect) {
        let center_y = rect.center().y;
        let half = rect.height() * 0.5;
        let fill = Stroke::new(1.0, Color32::from_rgba_unmultiplied(90, 160, 255, 150));

        for (x, (&lo, &hi)) in self.envelope.min.iter().zip(&self.envelope.max).enumerate() {
            let px = rect.left() + x as f32;
            if px > rect.right() {
                break;
            }
            // Screen Y grows downward
            let top = center_y - hi.clamp(-1.0, 1.0) * half;
            let bottom = center_y - lo.clamp(-1.0, 1.0) * half;
            painter.line_segment([Pos2::new(px, top), Pos2::new(px, bottom)], fill);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_size() {
        let samples: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.1).sin()).collect();
        let env = Envelope::build(&samples, 100);
        assert_eq!(env.min.len(), 101);
        assert_eq!(env.max.len(), 101);
    }

    #[test]
    fn test_envelope_bounds() {
        let samples = vec![0.5, -0.25, 0.75, -1.0];
        let env = Envelope::build(&samples, 2);
        // Columns start at 0, 2 and 3 (clamped), two samples each
        assert_eq!(env.max[0], 0.5);
        assert_eq!(env.min[0], -0.25);
        assert_eq!(env.max[1], 0.75);
        assert_eq!(env.min[1], -1.0);
        assert_eq!(env.min[2], -1.0);
        assert_eq!(env.max[2], 0.0);
    }

    #[test]
    fn test_envelope_includes_zero() {
        let env = Envelope::build(&[0.3; 50], 10);
        assert!(env.min.iter().all(|&v| v == 0.0));
        assert!(env.max.iter().all(|&v| (v - 0.3).abs() < 1e-6));
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(Envelope::build(&[], 100), Envelope::default());
    }

    #[test]
    fn test_cache_rebuilt_on_new_source() {
        let mut view = WaveformView::new();
        let a: Arc<[f32]> = Arc::from(vec![0.5f32; 100]);
        let b: Arc<[f32]> = Arc::from(vec![-0.5f32; 100]);

        view.update_cache(&a, 10);
        assert_eq!(view.envelope.max[0], 0.5);

        view.update_cache(&a, 10);
        assert_eq!(view.envelope.max[0], 0.5);

        view.update_cache(&b, 10);
        assert_eq!(view.envelope.min[0], -0.5);
        assert_eq!(view.envelope.max[0], 0.0);
    }
}
