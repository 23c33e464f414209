//! 3D waterfall display widget
//!
//! Draws each history row as a line strip in perspective. Row 0 sits at the
//! front edge of the plane and older rows recede, dimming and fading as they
//! go.
//!
//! ## Coordinate System
//!
//! - X: frequency, spanning `PLANE_SPAN` centred on the origin
//! - Y: magnitude, `value * y_scale`
//! - Z: age, from `+Z_SPAN/2` (newest) to `-Z_SPAN/2` (oldest)
//!
//! The camera orbits the origin. Lines are emitted as one egui mesh of thin
//! quads so every vertex can carry its own color; rows are drawn back to
//! front since egui has no depth test.

use eframe::egui::{self, ecolor::Hsva, epaint::Mesh, Color32, Pos2, Rect, Stroke, Vec2};
use nalgebra::{Matrix4, Vector3, Vector4};

use super::colormap::Colormap;
use super::lut::{grade, ColorGrading};
use crate::analysis::{FrequencyMap, HistoryRing, PLANE_SPAN};

/// Depth extent of the plane
pub const Z_SPAN: f32 = PLANE_SPAN;

const FOV_DEGREES: f32 = 55.0;
const NEAR: f32 = 0.05;
const FAR: f32 = 100.0;

/// Orbit camera around the origin, angles in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: -45.0,
            pitch: 35.0,
            distance: 9.0,
        }
    }
}

impl OrbitCamera {
    pub const MIN_DISTANCE: f32 = 1.4;
    pub const MAX_DISTANCE: f32 = 12.0;

    /// Rotate by a drag of `delta` pixels
    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw += delta.x * 0.25;
        self.pitch = (self.pitch + delta.y * 0.25).clamp(-89.0, 89.0);
    }

    /// Move closer (positive) or farther (negative); one wheel notch is 1.0
    pub fn zoom(&mut self, notches: f32) {
        self.distance = (self.distance - notches * 0.18).clamp(Self::MIN_DISTANCE, Self::MAX_DISTANCE);
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.yaw = (self.yaw + degrees).rem_euclid(360.0);
    }

    /// View matrix, with the scene lifted by `y_offset`
    pub fn view_matrix(&self, y_offset: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(0.0, 0.0, -self.distance))
            * Matrix4::from_axis_angle(&Vector3::x_axis(), self.pitch.to_radians())
            * Matrix4::from_axis_angle(&Vector3::y_axis(), self.yaw.to_radians())
            * Matrix4::new_translation(&Vector3::new(0.0, y_offset, 0.0))
    }

    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        Matrix4::new_perspective(aspect, FOV_DEGREES.to_radians(), NEAR, FAR)
    }
}

/// How the lines are colored
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineColoring {
    /// One solid color for every line, bypassing the colormap
    Solid(Color32),
    /// Rainbow by frequency, red at the lowest bar through to blue at the highest
    Spectrum,
    /// Graded colormap lookup per vertex
    Colormap(Colormap),
}

/// Display settings for the waterfall
#[derive(Clone, Debug)]
pub struct WaterfallSettings {
    pub coloring: LineColoring,
    pub grading: ColorGrading,
    pub background: Color32,
    /// Line thickness in pixels
    pub line_width: f32,
    pub y_scale: f32,
    pub y_offset: f32,
    pub show_grid: bool,
    pub auto_rotate: bool,
}

impl Default for WaterfallSettings {
    fn default() -> Self {
        Self {
            coloring: LineColoring::Solid(Color32::from_rgb(0, 255, 0)),
            grading: ColorGrading::default(),
            background: Color32::from_rgb(5, 5, 8),
            line_width: 1.0,
            y_scale: 1.2,
            y_offset: 0.0,
            show_grid: false,
            auto_rotate: false,
        }
    }
}

/// Brightness and opacity factors for row `row` of `depth`
pub fn age_fade(row: usize, depth: usize) -> (f32, f32) {
    let t = if depth <= 1 {
        0.0
    } else {
        row as f32 / (depth - 1) as f32
    };
    (1.0 - 0.75 * t, 1.0 - 0.8 * t)
}

/// 3D waterfall widget
pub struct Waterfall {
    pub settings: WaterfallSettings,
    pub camera: OrbitCamera,
}

impl Default for Waterfall {
    fn default() -> Self {
        Self::new()
    }
}

impl Waterfall {
    pub fn new() -> Self {
        Self {
            settings: WaterfallSettings::default(),
            camera: OrbitCamera::default(),
        }
    }

    pub fn reset_camera(&mut self) {
        self.camera = OrbitCamera::default();
    }

    /// Draw the waterfall into all available space
    pub fn show(&mut self, ui: &mut egui::Ui, history: &HistoryRing, map: &FrequencyMap) -> egui::Response {
        let size = ui.available_size();
        let (response, painter) = ui.allocate_painter(size, egui::Sense::drag());
        let rect = response.rect;

        if response.dragged() {
            self.camera.orbit(response.drag_delta());
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.camera.zoom(scroll / 50.0);
            }
        }
        if self.settings.auto_rotate {
            let dt = ui.input(|i| i.stable_dt).min(0.1);
            self.camera.rotate(3.0 * dt);
        }

        painter.rect_filled(rect, 0.0, self.settings.background);

        let aspect = rect.width() / rect.height().max(1.0);
        let mvp = self.camera.projection_matrix(aspect) * self.camera.view_matrix(self.settings.y_offset);
        let project = |x: f32, y: f32, z: f32| project_point(&mvp, rect, x, y, z);

        if self.settings.show_grid {
            draw_grid(&painter, &project);
        }

        let mesh = self.build_mesh(history, map, &project);
        painter.add(egui::Shape::mesh(mesh));

        response
    }

    /// Emit one quad per line segment, oldest row first
    fn build_mesh(
        &self,
        history: &HistoryRing,
        map: &FrequencyMap,
        project: &impl Fn(f32, f32, f32) -> Option<Pos2>,
    ) -> Mesh {
        let mut mesh = Mesh::default();
        let depth = history.depth();
        let half_width = self.settings.line_width.max(0.5) * 0.5;
        let y_scale = self.settings.y_scale;
        let grading = self.settings.grading.line_view();

        for row_idx in (0..depth).rev() {
            let Some(row) = history.row(row_idx) else {
                continue;
            };
            let t = if depth <= 1 {
                0.0
            } else {
                row_idx as f32 / (depth - 1) as f32
            };
            let z = Z_SPAN * 0.5 - t * Z_SPAN;
            let (fade, alpha) = age_fade(row_idx, depth);

            let mut prev: Option<(Pos2, Color32)> = None;
            for (&v, bar) in row.iter().zip(map.bars()) {
                let Some(pos) = project(bar.x, v * y_scale, z) else {
                    prev = None;
                    continue;
                };
                let color = self.vertex_color(v, bar.hue, fade, alpha, &grading);
                if let Some((p0, c0)) = prev {
                    add_segment(&mut mesh, p0, c0, pos, color, half_width);
                }
                prev = Some((pos, color));
            }
        }
        mesh
    }

    fn vertex_color(&self, v: f32, hue: f32, fade: f32, alpha: f32, grading: &ColorGrading) -> Color32 {
        let a = (alpha * 255.0) as u8;
        match self.settings.coloring {
            LineColoring::Solid(c) => Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), a),
            LineColoring::Spectrum => Hsva::new(hue, 1.0, fade, alpha).into(),
            LineColoring::Colormap(map) => {
                let [r, g, b] = grade(map, v, grading).map(|c| (c * fade * 255.0) as u8);
                Color32::from_rgba_unmultiplied(r, g, b, a)
            }
        }
    }
}

/// Project a world point to screen space, or `None` behind the near plane
fn project_point(mvp: &Matrix4<f32>, rect: Rect, x: f32, y: f32, z: f32) -> Option<Pos2> {
    let clip = mvp * Vector4::new(x, y, z, 1.0);
    if clip.w <= NEAR {
        return None;
    }
    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let center = rect.center();
    Some(Pos2::new(
        center.x + ndc_x * rect.width() * 0.5,
        center.y - ndc_y * rect.height() * 0.5, // Flip Y
    ))
}

/// Append a thin quad from `p0` to `p1`, colors interpolated along it
fn add_segment(mesh: &mut Mesh, p0: Pos2, c0: Color32, p1: Pos2, c1: Color32, half_width: f32) {
    let dir = p1 - p0;
    let len = dir.length();
    if len < 1e-4 {
        return;
    }
    let n = Vec2::new(-dir.y, dir.x) / len * half_width;

    let base = mesh.vertices.len() as u32;
    mesh.colored_vertex(p0 + n, c0);
    mesh.colored_vertex(p0 - n, c0);
    mesh.colored_vertex(p1 + n, c1);
    mesh.colored_vertex(p1 - n, c1);
    mesh.add_triangle(base, base + 1, base + 2);
    mesh.add_triangle(base + 1, base + 3, base + 2);
}

/// Ground grid below the plane
fn draw_grid(painter: &egui::Painter, project: &impl Fn(f32, f32, f32) -> Option<Pos2>) {
    const DIVS: usize = 12;
    const SPAN_MUL: f32 = 1.75;
    const GRID_Y: f32 = -0.5;

    let grid_x = PLANE_SPAN * SPAN_MUL;
    let grid_z = Z_SPAN * SPAN_MUL;
    let stroke = Stroke::new(1.0, Color32::from_rgb(26, 26, 31));

    let line = |a: (f32, f32), b: (f32, f32)| {
        if let (Some(p0), Some(p1)) = (project(a.0, GRID_Y, a.1), project(b.0, GRID_Y, b.1)) {
            painter.line_segment([p0, p1], stroke);
        }
    };

    for i in 0..=DIVS {
        let t = i as f32 / DIVS as f32;
        let x = -grid_x * 0.5 + t * grid_x;
        line((x, -grid_z * 0.5), (x, grid_z * 0.5));
        let z = -grid_z * 0.5 + t * grid_z;
        line((-grid_x * 0.5, z), (grid_x * 0.5, z));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_fade() {
        assert_eq!(age_fade(0, 140), (1.0, 1.0));
        let (c, a) = age_fade(139, 140);
        assert!((c - 0.25).abs() < 1e-6);
        assert!((a - 0.2).abs() < 1e-6);
        assert_eq!(age_fade(0, 1), (1.0, 1.0));
    }

    #[test]
    fn test_vertex_coloring_modes() {
        let mut waterfall = Waterfall::new();
        let grading = ColorGrading::default().line_view();

        waterfall.settings.coloring = LineColoring::Solid(Color32::from_rgb(10, 20, 30));
        let c = waterfall.vertex_color(0.7, 0.3, 0.5, 1.0, &grading);
        assert_eq!((c.r(), c.g(), c.b(), c.a()), (10, 20, 30, 255));

        waterfall.settings.coloring = LineColoring::Spectrum;
        assert_eq!(waterfall.vertex_color(0.7, 0.0, 1.0, 1.0, &grading), Color32::RED);

        waterfall.settings.coloring = LineColoring::Colormap(Colormap::Grayscale);
        let c = waterfall.vertex_color(0.0, 0.5, 1.0, 1.0, &grading);
        assert_eq!((c.r(), c.g(), c.b()), (0, 0, 0));
    }

    #[test]
    fn test_camera_limits() {
        let mut camera = OrbitCamera::default();
        camera.orbit(Vec2::new(0.0, 10_000.0));
        assert_eq!(camera.pitch, 89.0);
        camera.zoom(1000.0);
        assert_eq!(camera.distance, OrbitCamera::MIN_DISTANCE);
        camera.zoom(-1000.0);
        assert_eq!(camera.distance, OrbitCamera::MAX_DISTANCE);
        camera.rotate(400.0);
        assert!(camera.yaw >= 0.0 && camera.yaw < 360.0);
    }

    #[test]
    fn test_origin_projects_to_center() {
        let camera = OrbitCamera::default();
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0));
        let mvp = camera.projection_matrix(800.0 / 600.0) * camera.view_matrix(0.0);
        let p = project_point(&mvp, rect, 0.0, 0.0, 0.0).unwrap();
        assert!((p.x - 400.0).abs() < 1e-2);
        assert!((p.y - 300.0).abs() < 1e-2);
    }

    #[test]
    fn test_point_behind_camera_culled() {
        let camera = OrbitCamera {
            yaw: 0.0,
            pitch: 0.0,
            distance: 2.0,
        };
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(100.0, 100.0));
        let mvp = camera.projection_matrix(1.0) * camera.view_matrix(0.0);
        assert!(project_point(&mvp, rect, 0.0, 0.0, 5.0).is_none());
        assert!(project_point(&mvp, rect, 0.0, 0.0, -1.0).is_some());
    }

    #[test]
    fn test_segment_adds_quad() {
        let mut mesh = Mesh::default();
        add_segment(&mut mesh, Pos2::ZERO, Color32::RED, Pos2::new(10.0, 0.0), Color32::BLUE, 1.0);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);

        // Degenerate segment adds nothing
        add_segment(&mut mesh, Pos2::ZERO, Color32::RED, Pos2::ZERO, Color32::RED, 1.0);
        assert_eq!(mesh.vertices.len(), 4);
    }

    #[test]
    fn test_higher_value_projects_higher() {
        let camera = OrbitCamera::default();
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0));
        let mvp = camera.projection_matrix(800.0 / 600.0) * camera.view_matrix(0.0);
        let low = project_point(&mvp, rect, 0.0, 0.0, 0.0).unwrap();
        let high = project_point(&mvp, rect, 0.0, 1.2, 0.0).unwrap();
        assert!(high.y < low.y);
    }
}
