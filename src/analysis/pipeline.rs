//! Analysis pipeline
//!
//! One `process` call per display frame runs
//! clock -> analyzer -> line builder -> history. Reconfiguration builds every
//! derived resource into locals first and swaps them in only when all of
//! them succeeded, so a failure leaves the previous configuration running.

use super::analyzer::{window_start, LatencyCompensation, SpectralAnalyzer};
use super::config::AnalysisConfig;
use super::frequency_map::FrequencyMap;
use super::history::HistoryRing;
use super::line::build_line;
use super::{try_zeroed, AnalysisError};
use crate::audio::SampleBuffer;

pub struct Spectrogram {
    config: AnalysisConfig,
    sample_rate: u32,
    analyzer: SpectralAnalyzer,
    map: FrequencyMap,
    /// Scratch display line, one value per bar
    line: Vec<f32>,
    history: HistoryRing,
    latency: LatencyCompensation,
}

impl Spectrogram {
    pub fn new(config: AnalysisConfig, sample_rate: u32) -> Result<Self, AnalysisError> {
        config.validate()?;
        let analyzer = SpectralAnalyzer::new(config.fft_size)?;
        let map = FrequencyMap::new(
            config.bar_count,
            config.fft_size,
            sample_rate,
            config.min_freq,
        )?;

        Ok(Self {
            line: try_zeroed(config.bar_count)?,
            history: HistoryRing::new(config.bar_count, config.history_depth)?,
            config,
            sample_rate,
            analyzer,
            map,
            latency: LatencyCompensation::default(),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Apply a new configuration, rebuilding only what it invalidates.
    ///
    /// Setting the current configuration again is a no-op.
    pub fn reconfigure(&mut self, config: AnalysisConfig) -> Result<(), AnalysisError> {
        if config == self.config {
            return Ok(());
        }
        config.validate()?;

        let fft_changed = config.fft_size != self.config.fft_size;
        let bars_changed = config.bar_count != self.config.bar_count;
        let map_changed = fft_changed || bars_changed || config.min_freq != self.config.min_freq;

        let analyzer = if fft_changed {
            Some(SpectralAnalyzer::new(config.fft_size)?)
        } else {
            None
        };
        let map = if map_changed {
            Some(FrequencyMap::new(
                config.bar_count,
                config.fft_size,
                self.sample_rate,
                config.min_freq,
            )?)
        } else {
            None
        };
        let resized = if bars_changed {
            Some((
                HistoryRing::new(config.bar_count, config.history_depth)?,
                try_zeroed(config.bar_count)?,
            ))
        } else {
            None
        };

        // Commit
        if let Some(analyzer) = analyzer {
            self.analyzer = analyzer;
        }
        if let Some(map) = map {
            self.map = map;
        }
        if let Some((history, line)) = resized {
            self.history = history;
            self.line = line;
        } else {
            self.history.set_depth(config.history_depth);
        }
        self.config = config;

        log::info!(
            "Analysis configured: FFT {}, {} bars, depth {}",
            config.fft_size,
            config.bar_count,
            config.history_depth
        );
        Ok(())
    }

    /// Rebuild the frequency map for a newly loaded file's sample rate.
    ///
    /// On failure the previous rate and map stay in place.
    pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<(), AnalysisError> {
        if sample_rate == self.sample_rate {
            return Ok(());
        }
        self.map = FrequencyMap::new(
            self.config.bar_count,
            self.config.fft_size,
            sample_rate,
            self.config.min_freq,
        )?;
        self.sample_rate = sample_rate;
        Ok(())
    }

    /// Run one analysis cycle at clock `position` and push the resulting line.
    ///
    /// Returns false (and pushes nothing) for an empty buffer.
    pub fn process(&mut self, buffer: &SampleBuffer, position: u64) -> bool {
        let samples = buffer.samples();
        if samples.is_empty() {
            return false;
        }

        let latency = self.latency.total(self.config.latency_adjust);
        let start = window_start(position, latency, self.config.fft_size, samples.len());

        self.analyzer.analyze(samples, start);
        build_line(self.analyzer.magnitudes(), &self.map, &mut self.line);
        self.history.push(&self.line);
        true
    }

    /// Clock position shifted back to what is currently audible, floored at 0
    pub fn audible_position(&self, position: u64) -> u64 {
        let latency = self.latency.total(self.config.latency_adjust);
        (position as i64 - latency).max(0) as u64
    }

    pub fn history(&self) -> &HistoryRing {
        &self.history
    }

    pub fn frequency_map(&self) -> &FrequencyMap {
        &self.map
    }

    pub fn latency(&self) -> &LatencyCompensation {
        &self.latency
    }

    pub fn latency_mut(&mut self) -> &mut LatencyCompensation {
        &mut self.latency
    }

    /// Clear history and the current frame
    pub fn reset(&mut self) {
        self.history.reset();
        self.analyzer.clear();
        self.line.iter_mut().for_each(|v| *v = 0.0);
    }
}
