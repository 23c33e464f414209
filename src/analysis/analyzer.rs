//! Latency-compensated windowed spectral analyzer
//!
//! Each cycle reads `fft_size` samples centred on what is currently coming
//! out of the speaker, applies a Hann window and computes the magnitude
//! spectrum with a real-input FFT.
//!
//! ## Synchronization
//!
//! The playback clock says what was last handed to the driver. What is
//! audible is older by the output latency, and a windowed FFT describes the
//! centre of its window rather than its end, so the window start is
//!
//! ```text
//! start = wrap(clock - latency - fft_size / 2, buffer_len)
//! ```

use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use super::{try_zeroed, AnalysisError};
use crate::audio::wrap_index;

/// Compute the analysis window start for a clock position.
///
/// Negative offsets wrap to the end of the buffer.
pub fn window_start(position: u64, latency: i64, fft_size: usize, len: usize) -> usize {
    let centre = (fft_size / 2) as i64;
    wrap_index(position as i64 - latency - centre, len)
}

/// Hann window of length `size`
fn hann_window(size: usize) -> Vec<f32> {
    let denom = (size.max(2) - 1) as f32;
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos()))
        .collect()
}

/// Output-latency bookkeeping, in samples
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LatencyCompensation {
    /// Driver-reported output latency plus one buffer period, latched at stream start
    base: Option<i64>,
}

impl LatencyCompensation {
    /// Record the driver latency once per stream; later reports are ignored
    pub fn latch(&mut self, samples: u64) {
        if self.base.is_none() {
            self.base = Some(samples as i64);
            log::info!("Output latency latched at {} samples", samples);
        }
    }

    /// Forget the latched value (stream stopped)
    pub fn clear(&mut self) {
        self.base = None;
    }

    pub fn base(&self) -> i64 {
        self.base.unwrap_or(0)
    }

    pub fn is_latched(&self) -> bool {
        self.base.is_some()
    }

    /// Total shift including the user adjustment
    pub fn total(&self, adjust: i64) -> i64 {
        self.base() + adjust
    }
}

/// Windowed real FFT with owned, preallocated buffers
///
/// All buffers are sized for one FFT length; changing the length means
/// building a new analyzer.
pub struct SpectralAnalyzer {
    fft: Arc<dyn RealToComplex<f32>>,
    fft_size: usize,
    window: Vec<f32>,
    input: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    /// First `fft_size / 2` bin magnitudes of the latest frame
    magnitudes: Vec<f32>,
}

impl SpectralAnalyzer {
    /// Plan a transform and allocate every buffer for `fft_size`
    pub fn new(fft_size: usize) -> Result<Self, AnalysisError> {
        if fft_size < 4 || !fft_size.is_power_of_two() {
            return Err(AnalysisError::UnsupportedFftSize(fft_size));
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);

        let mut window = Vec::new();
        window.try_reserve_exact(fft_size)?;
        window.extend(hann_window(fft_size));

        Ok(Self {
            input: try_zeroed(fft_size)?,
            spectrum: try_zeroed(fft_size / 2 + 1)?,
            scratch: try_zeroed(fft.get_scratch_len())?,
            magnitudes: try_zeroed(fft_size / 2)?,
            window,
            fft,
            fft_size,
        })
    }

    /// Magnitudes of the latest frame, length `fft_size / 2`
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    /// Zero the magnitude frame
    pub fn clear(&mut self) {
        self.magnitudes.iter_mut().for_each(|m| *m = 0.0);
    }

    /// Analyze one window starting at `start`, reading circularly.
    ///
    /// An empty buffer leaves the previous frame untouched. A buffer shorter
    /// than the FFT is windowed from its first sample and zero-padded.
    pub fn analyze(&mut self, samples: &[f32], start: usize) {
        let len = samples.len();
        if len == 0 {
            return;
        }

        if len < self.fft_size {
            self.input.iter_mut().for_each(|x| *x = 0.0);
            for (inp, (&s, &w)) in self.input.iter_mut().zip(samples.iter().zip(&self.window)) {
                *inp = s * w;
            }
        } else {
            let start = start % len;
            for (i, (inp, &w)) in self.input.iter_mut().zip(&self.window).enumerate() {
                let idx = (start + i) % len;
                *inp = samples[idx] * w;
            }
        }

        if let Err(e) =
            self.fft
                .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
        {
            // Buffer lengths are fixed at construction, so this is unreachable in practice
            log::warn!("FFT failed: {}", e);
            return;
        }

        let norm = self.fft_size as f32;
        for (mag, c) in self.magnitudes.iter_mut().zip(&self.spectrum) {
            *mag = c.norm() / norm;
        }
    }
}
