//! waterfall-rs - Audio waterfall and spectrogram viewer
//!
//! Plays an audio file and draws its spectrum as a scrolling 3D waterfall or
//! a flat 2D spectrogram, kept in step with what is audible.
//!
//! ## Threads
//!
//! - The cpal callback fills output buffers and advances the playback clock
//! - The UI thread owns everything else: once per frame it reads the clock,
//!   runs the analysis pipeline and draws
//!
//! The two share only single-word atomics (clock position and flags, gain,
//! latency report) and the immutable sample data.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use serde::{Deserialize, Serialize};

mod analysis;
mod audio;
mod render;
mod settings;

use analysis::{AnalysisConfig, AnalysisError, Spectrogram, FFT_SIZES, MAX_BARS, MAX_HISTORY_LINES, MIN_BARS};
use audio::{AudioEngine, PlaybackClock, SampleBuffer};
use render::{ColorLut, Colormap, LineColoring, SpectrogramView, Waterfall, WaveformView};
use settings::AppSettings;

/// Repaint interval while nothing is playing
const IDLE_REPAINT: Duration = Duration::from_millis(100);

/// Seek step for the skip buttons
const SEEK_STEP_SECS: i64 = 5;

/// File extensions offered by the open dialog
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "m4a", "mp4", "aac"];

fn main() -> eframe::Result<()> {
    env_logger::init();
    log::info!("Starting waterfall-rs");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("waterfall-rs")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "waterfall-rs",
        options,
        Box::new(|cc| Ok(Box::new(WaterfallApp::new(cc)?))),
    )
}

/// Main display mode
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    Waterfall,
    Spectrogram,
}

impl ViewMode {
    fn name(&self) -> &'static str {
        match self {
            ViewMode::Waterfall => "3D Waterfall",
            ViewMode::Spectrogram => "2D Spectrogram",
        }
    }
}

/// Line coloring choice for the 3D view
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum LineStyle {
    #[default]
    Solid,
    Spectrum,
    Colormap,
}

impl LineStyle {
    fn name(&self) -> &'static str {
        match self {
            LineStyle::Solid => "Solid color",
            LineStyle::Spectrum => "Rainbow by frequency",
            LineStyle::Colormap => "Colormap",
        }
    }
}

/// Format seconds as `m:ss`
fn format_time(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Main application state
pub struct WaterfallApp {
    clock: Arc<PlaybackClock>,
    audio: AudioEngine,
    source: SampleBuffer,

    spectrogram: Spectrogram,
    /// 3D analysis settings stashed while the 2D preset is active
    saved_3d: Option<AnalysisConfig>,
    view_mode: ViewMode,

    // Coloring
    lut: ColorLut,
    colormap: Colormap,
    line_style: LineStyle,
    line_color: egui::Color32,

    // Widgets
    waterfall: Waterfall,
    spectrogram_view: SpectrogramView,
    waveform: WaveformView,

    show_settings: bool,
    show_waveform: bool,
}

impl WaterfallApp {
    fn new(_cc: &eframe::CreationContext<'_>) -> Result<Self, AnalysisError> {
        let clock = Arc::new(PlaybackClock::new());
        let audio = AudioEngine::new(Arc::clone(&clock));
        let source = SampleBuffer::from_mono(Vec::new(), 44100);
        let spectrogram = Spectrogram::new(AnalysisConfig::default(), source.sample_rate())?;
        let waterfall = Waterfall::new();
        let lut = ColorLut::new(Colormap::default(), waterfall.settings.grading);

        let mut app = Self {
            clock,
            audio,
            source,
            spectrogram,
            saved_3d: None,
            view_mode: ViewMode::Waterfall,
            lut,
            colormap: Colormap::default(),
            line_style: LineStyle::Solid,
            line_color: egui::Color32::from_rgb(0, 255, 0),
            waterfall,
            spectrogram_view: SpectrogramView::new(),
            waveform: WaveformView::new(),
            show_settings: true,
            show_waveform: true,
        };

        AppSettings::load().apply(&mut app);
        Ok(app)
    }

    /// Reconfigure the analysis, keeping the old settings on failure
    fn apply_config(&mut self, config: AnalysisConfig) {
        if let Err(e) = self.spectrogram.reconfigure(config) {
            log::warn!("Analysis settings rejected: {}", e);
            self.audio.status = format!("Settings rejected: {}", e);
        }
    }

    /// Switch view, swapping in the high-resolution preset for 2D
    fn set_view_mode(&mut self, mode: ViewMode) {
        if mode == self.view_mode {
            return;
        }
        let current = *self.spectrogram.config();
        match mode {
            ViewMode::Spectrogram => {
                self.saved_3d = Some(current);
                self.apply_config(current.spectrogram_preset());
            }
            ViewMode::Waterfall => {
                if let Some(saved) = self.saved_3d.take() {
                    self.apply_config(AnalysisConfig {
                        fft_size: saved.fft_size,
                        history_depth: saved.history_depth,
                        ..current
                    });
                }
            }
        }
        self.view_mode = mode;
        log::info!("View mode: {}", mode.name());
    }

    /// Decode `path` and make it the playing source.
    ///
    /// On failure the current source keeps playing untouched.
    fn load_file(&mut self, path: &Path) {
        let buffer = match SampleBuffer::load(path) {
            Ok(buffer) => buffer,
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                self.audio.status = format!("Failed to load file: {}", e);
                return;
            }
        };

        if let Err(e) = self.spectrogram.set_sample_rate(buffer.sample_rate()) {
            log::error!("Failed to prepare analysis for {}: {}", path.display(), e);
            self.audio.status = format!("Failed to load file: {}", e);
            return;
        }

        // The stream captures the old samples; drop it before swapping
        self.audio.stop();
        self.clock.set_length(buffer.len() as u64);
        self.spectrogram.reset();
        self.spectrogram.latency_mut().clear();

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.audio.status = format!(
            "{} ({}, {} Hz, {} ch, {})",
            name,
            buffer.format(),
            buffer.sample_rate(),
            buffer.source_channels(),
            format_time(buffer.duration_secs())
        );
        self.source = buffer;
    }

    fn open_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("Audio", AUDIO_EXTENSIONS)
            .pick_file();
        if let Some(path) = picked {
            self.load_file(&path);
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.iter().find_map(|f| f.path.clone()));
        if let Some(path) = dropped {
            self.load_file(&path);
        }
    }

    /// Latch the driver latency once per stream, forget it when stopped
    fn sync_latency(&mut self) {
        if !self.audio.is_playing() {
            self.spectrogram.latency_mut().clear();
            return;
        }
        if let Some(frames) = self.audio.reported_latency() {
            self.spectrogram.latency_mut().latch(frames);
        }
    }

    /// Stop playback and wipe the display
    fn clear_visualization(&mut self) {
        self.audio.stop();
        self.spectrogram.reset();
    }

    fn seek_seconds(&self, secs: i64) {
        self.clock.seek_by(secs * self.source.sample_rate() as i64);
    }

    fn transport_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("waterfall-rs");
            ui.separator();

            if ui.button("📂 Open…").clicked() {
                self.open_dialog();
            }
            ui.separator();

            let has_audio = !self.source.is_empty();
            let play_text = if self.audio.is_playing() && !self.audio.is_paused() {
                "⏸ Pause"
            } else {
                "▶ Play"
            };
            if ui.add_enabled(has_audio, egui::Button::new(play_text)).clicked() {
                self.audio.toggle(&self.source);
            }
            if ui.add_enabled(self.audio.is_playing(), egui::Button::new("⏹ Stop")).clicked() {
                self.audio.stop();
            }
            if ui.add_enabled(has_audio, egui::Button::new("⏮ Restart")).clicked() {
                self.audio.restart(&self.source);
            }
            if ui.add_enabled(has_audio, egui::Button::new("⏪ 5s")).clicked() {
                self.seek_seconds(-SEEK_STEP_SECS);
            }
            if ui.add_enabled(has_audio, egui::Button::new("5s ⏩")).clicked() {
                self.seek_seconds(SEEK_STEP_SECS);
            }

            let mut looping = self.clock.is_looping();
            if ui.checkbox(&mut looping, "Loop").changed() {
                self.clock.set_looping(looping);
            }
            ui.separator();

            let mut muted = self.audio.is_muted();
            let mute_text = if muted { "🔇" } else { "🔊" };
            if ui.toggle_value(&mut muted, mute_text).changed() {
                self.audio.set_muted(muted);
            }
            let mut volume = self.audio.volume();
            if ui
                .add(egui::Slider::new(&mut volume, 0.0..=1.0).show_value(false))
                .changed()
            {
                self.audio.set_volume(volume);
            }

            ui.separator();
            ui.toggle_value(&mut self.show_settings, "⚙ Settings");
            ui.separator();
            ui.label(&self.audio.status);
        });
    }

    fn settings_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("View");
        ui.separator();
        let mut mode = self.view_mode;
        for candidate in [ViewMode::Waterfall, ViewMode::Spectrogram] {
            ui.radio_value(&mut mode, candidate, candidate.name());
        }
        self.set_view_mode(mode);

        ui.separator();
        let mut config = *self.spectrogram.config();
        ui.collapsing("Analysis", |ui| {
            egui::ComboBox::from_label("FFT size")
                .selected_text(config.fft_size.to_string())
                .show_ui(ui, |ui| {
                    for size in FFT_SIZES {
                        ui.selectable_value(&mut config.fft_size, size, size.to_string());
                    }
                });
            ui.add(
                egui::Slider::new(&mut config.bar_count, MIN_BARS..=MAX_BARS)
                    .text("Bars")
                    .logarithmic(true),
            );
            ui.add(egui::Slider::new(&mut config.history_depth, 1..=MAX_HISTORY_LINES).text("History"));
            ui.add(
                egui::Slider::new(&mut config.min_freq, 10.0..=500.0)
                    .text("Min freq (Hz)")
                    .logarithmic(true),
            );
            ui.horizontal(|ui| {
                ui.add(egui::DragValue::new(&mut config.latency_adjust).range(-16384..=16384));
                ui.label("Latency adjust (samples)");
            });
            let latency = self.spectrogram.latency();
            if latency.is_latched() {
                ui.small(format!("Driver latency: {} samples", latency.base()));
            } else {
                ui.small("Driver latency: not reported yet");
            }
            let history = self.spectrogram.history();
            ui.small(format!("History: {} / {} lines", history.filled(), history.depth()));
        });
        if config != *self.spectrogram.config() {
            self.apply_config(config);
        }

        ui.separator();
        ui.collapsing("Color", |ui| {
            egui::ComboBox::from_label("Line coloring (3D)")
                .selected_text(self.line_style.name())
                .show_ui(ui, |ui| {
                    for style in [LineStyle::Solid, LineStyle::Spectrum, LineStyle::Colormap] {
                        ui.selectable_value(&mut self.line_style, style, style.name());
                    }
                });
            egui::ComboBox::from_label("Colormap")
                .selected_text(self.colormap.name())
                .show_ui(ui, |ui| {
                    for map in Colormap::ALL {
                        ui.selectable_value(&mut self.colormap, map, map.name());
                    }
                });
            ui.horizontal(|ui| {
                ui.color_edit_button_srgba(&mut self.line_color);
                ui.label("Line color");
            });
            let grading = &mut self.waterfall.settings.grading;
            ui.add(egui::Slider::new(&mut grading.gamma, 0.05..=1.0).text("Gamma"));
            ui.add(egui::Slider::new(&mut grading.saturation, 0.5..=3.0).text("Saturation (2D)"));
        });

        if self.view_mode == ViewMode::Waterfall {
            ui.separator();
            ui.collapsing("3D Display", |ui| {
                let display = &mut self.waterfall.settings;
                ui.add(egui::Slider::new(&mut display.line_width, 0.5..=5.0).text("Line width"));
                ui.add(egui::Slider::new(&mut display.y_scale, 0.1..=4.0).text("Y scale"));
                ui.add(egui::Slider::new(&mut display.y_offset, -2.0..=2.0).text("Y offset"));
                ui.checkbox(&mut display.show_grid, "Show grid");
                ui.checkbox(&mut display.auto_rotate, "Auto-rotate camera");
                if ui.button("Reset camera").clicked() {
                    self.waterfall.reset_camera();
                }
            });
        }

        ui.separator();
        ui.collapsing("Tools", |ui| {
            ui.checkbox(&mut self.show_waveform, "Show waveform");
            if ui.button("Clear visualization").clicked() {
                self.clear_visualization();
            }
            if ui.button("Refresh audio device").clicked() {
                self.audio.refresh_device(&self.source);
                self.spectrogram.latency_mut().clear();
            }
        });
    }

    fn waveform_ui(&mut self, ui: &mut egui::Ui) {
        let len = self.source.len();
        let sr = self.source.sample_rate().max(1) as f64;

        let playhead = (self.audio.is_playing() && len > 0).then(|| {
            let audible = self.spectrogram.audible_position(self.clock.read());
            audible as f32 / len as f32
        });

        ui.vertical_centered(|ui| {
            if self.show_waveform {
                self.waveform
                    .show(ui, &self.source.shared_samples(), playhead);
            }

            ui.horizontal(|ui| {
                let position = self.clock.read() as f64;
                ui.label(format!(
                    "{} / {}",
                    format_time(position / sr),
                    format_time(self.source.duration_secs())
                ));
                let mut fraction = if len > 0 { position / len as f64 } else { 0.0 };
                let slider = egui::Slider::new(&mut fraction, 0.0..=1.0).show_value(false);
                if ui.add_enabled(len > 0, slider).changed() {
                    self.clock.seek_fraction(fraction);
                }
            });
        });
    }
}

impl eframe::App for WaterfallApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);
        self.sync_latency();

        let running = self.audio.is_playing() && !self.audio.is_paused();
        if running {
            self.spectrogram.process(&self.source, self.clock.read());
        }
        if running || (self.view_mode == ViewMode::Waterfall && self.waterfall.settings.auto_rotate) {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(IDLE_REPAINT);
        }

        // Top panel
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            self.transport_ui(ui);
        });

        // Settings panel
        if self.show_settings {
            egui::SidePanel::left("settings_panel")
                .min_width(240.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| self.settings_ui(ui));
                });
        }

        // Waveform and position
        if !self.source.is_empty() {
            egui::TopBottomPanel::bottom("waveform_panel").show(ctx, |ui| {
                self.waveform_ui(ui);
            });
        }

        // Coloring changes take effect before anything is drawn
        self.lut.set_colormap(self.colormap);
        self.lut.set_grading(self.waterfall.settings.grading);
        self.lut.refresh();
        self.waterfall.settings.coloring = match self.line_style {
            LineStyle::Solid => LineColoring::Solid(self.line_color),
            LineStyle::Spectrum => LineColoring::Spectrum,
            LineStyle::Colormap => LineColoring::Colormap(self.colormap),
        };

        // Main display
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let history = self.spectrogram.history();
                match self.view_mode {
                    ViewMode::Waterfall => {
                        self.waterfall
                            .show(ui, history, self.spectrogram.frequency_map());
                    }
                    ViewMode::Spectrogram => {
                        self.spectrogram_view.show(ui, history, &self.lut);
                    }
                }

                if self.source.is_empty() {
                    ui.painter().text(
                        ui.max_rect().center(),
                        egui::Align2::CENTER_CENTER,
                        "Open or drop an audio file",
                        egui::FontId::proportional(18.0),
                        egui::Color32::GRAY,
                    );
                }
            });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        AppSettings::from_app(self).save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65.9), "1:05");
        assert_eq!(format_time(-3.0), "0:00");
    }
}
