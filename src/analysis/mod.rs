//! Analysis module - turns the playing buffer into waterfall lines
//!
//! This module provides:
//! - Analysis configuration and validation
//! - Latency-compensated Hann FFT analyzer
//! - Log-frequency bar mapping and line builder
//! - Rolling history of display lines
//! - `Spectrogram`, the pipeline tying them together
//!
//! Everything here is owned by the UI thread. The audio callback only ever
//! touches the playback clock.

mod analyzer;
mod config;
mod frequency_map;
mod history;
mod line;
mod pipeline;

use std::collections::TryReserveError;
use thiserror::Error;

pub use config::{AnalysisConfig, FFT_SIZES, MAX_BARS, MAX_HISTORY_LINES, MIN_BARS};
pub use frequency_map::{FrequencyMap, PLANE_SPAN};
pub use history::HistoryRing;
pub use pipeline::Spectrogram;

/// Errors that can occur while (re)configuring the analysis pipeline
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Unsupported FFT size: {0}")]
    UnsupportedFftSize(usize),

    #[error("Bar count out of range: {0}")]
    BarCount(usize),

    #[error("History depth out of range: {0}")]
    HistoryDepth(usize),

    #[error("Failed to allocate analysis buffers: {0}")]
    Allocation(#[from] TryReserveError),
}

/// Zero-filled vector whose allocation failure is reported instead of aborting
fn try_zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>, AnalysisError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, T::default());
    Ok(v)
}
