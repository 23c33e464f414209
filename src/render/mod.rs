//! Render module - colorization and display widgets
//!
//! This module provides:
//! - Named colormaps and the graded color LUT
//! - Raster compositor for the flat spectrogram texture
//! - Flat spectrogram, 3D waterfall and waveform overview widgets

mod colormap;
mod lut;
mod raster;
mod spectrogram;
mod waterfall;
mod waveform;

pub use colormap::Colormap;
pub use lut::{ColorGrading, ColorLut};
pub use spectrogram::SpectrogramView;
pub use waterfall::{LineColoring, Waterfall};
pub use waveform::WaveformView;
