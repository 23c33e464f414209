use std::path::PathBuf;

use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisConfig;
use crate::render::{ColorGrading, Colormap};
use crate::{LineStyle, ViewMode, WaterfallApp};

/// Returns the path to the settings file: `~/.config/waterfall-rs/settings.json`
fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("waterfall-rs");
    path.push("settings.json");
    path
}

/// Persisted application settings.
///
/// Serialized as JSON to the platform config directory.
/// Fields use `#[serde(default)]` so that adding new settings
/// won't break existing config files.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    // Analysis (always the 3D settings; 2D uses its own preset)
    pub analysis: AnalysisConfig,
    pub view_mode: ViewMode,

    // Color
    pub colormap: Colormap,
    pub line_style: LineStyle,
    pub grading: ColorGrading,
    // Stored as u8 triples since Color32 isn't serde-friendly
    pub line_r: u8,
    pub line_g: u8,
    pub line_b: u8,

    // 3D display
    pub line_width: f32,
    pub y_scale: f32,
    pub y_offset: f32,
    pub show_grid: bool,
    pub auto_rotate: bool,

    // Panels
    pub show_settings: bool,
    pub show_waveform: bool,

    // Playback
    pub looping: bool,
    pub volume: f32,
    pub muted: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            view_mode: ViewMode::Waterfall,

            colormap: Colormap::default(),
            line_style: LineStyle::Solid,
            grading: ColorGrading::default(),
            line_r: 0,
            line_g: 255,
            line_b: 0,

            line_width: 1.0,
            y_scale: 1.2,
            y_offset: 0.0,
            show_grid: false,
            auto_rotate: false,

            show_settings: true,
            show_waveform: true,

            looping: true,
            volume: 1.0,
            muted: false,
        }
    }
}

impl AppSettings {
    /// Load settings from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let path = settings_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Failed to parse settings ({}), using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                log::info!("No settings file found ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to disk as pretty JSON.
    pub fn save(&self) {
        let path = settings_path();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("Failed to create config directory: {}", e);
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    log::warn!("Failed to write settings: {}", e);
                }
            }
            Err(e) => {
                log::warn!("Failed to serialize settings: {}", e);
            }
        }
    }

    /// Extract current settings from the running application.
    pub fn from_app(app: &WaterfallApp) -> Self {
        let display = &app.waterfall.settings;
        Self {
            analysis: app.saved_3d.unwrap_or(*app.spectrogram.config()),
            view_mode: app.view_mode,

            colormap: app.colormap,
            line_style: app.line_style,
            grading: display.grading,
            line_r: app.line_color.r(),
            line_g: app.line_color.g(),
            line_b: app.line_color.b(),

            line_width: display.line_width,
            y_scale: display.y_scale,
            y_offset: display.y_offset,
            show_grid: display.show_grid,
            auto_rotate: display.auto_rotate,

            show_settings: app.show_settings,
            show_waveform: app.show_waveform,

            looping: app.clock.is_looping(),
            volume: app.audio.volume(),
            muted: app.audio.is_muted(),
        }
    }

    /// Apply loaded settings to the running application.
    pub fn apply(&self, app: &mut WaterfallApp) {
        app.apply_config(self.analysis);
        app.set_view_mode(self.view_mode);

        app.colormap = self.colormap;
        app.line_style = self.line_style;
        app.line_color = egui::Color32::from_rgb(self.line_r, self.line_g, self.line_b);

        let display = &mut app.waterfall.settings;
        display.grading = self.grading;
        display.line_width = self.line_width;
        display.y_scale = self.y_scale;
        display.y_offset = self.y_offset;
        display.show_grid = self.show_grid;
        display.auto_rotate = self.auto_rotate;

        app.show_settings = self.show_settings;
        app.show_waveform = self.show_waveform;

        app.clock.set_looping(self.looping);
        app.audio.set_volume(self.volume);
        app.audio.set_muted(self.muted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: AppSettings = serde_json::from_str(r#"{ "y_scale": 2.0 }"#).unwrap();
        assert_eq!(settings.y_scale, 2.0);
        assert_eq!(settings.analysis, AnalysisConfig::default());
        assert!(settings.looping);
    }

    #[test]
    fn test_nested_partial_analysis() {
        let settings: AppSettings =
            serde_json::from_str(r#"{ "analysis": { "fft_size": 8192 } }"#).unwrap();
        assert_eq!(settings.analysis.fft_size, 8192);
        assert_eq!(settings.analysis.bar_count, AnalysisConfig::default().bar_count);
    }

    #[test]
    fn test_json_survives_save_format() {
        let settings = AppSettings {
            colormap: Colormap::Turbo,
            view_mode: ViewMode::Spectrogram,
            ..Default::default()
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        let back: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
