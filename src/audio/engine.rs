//! Audio engine - handles cpal audio output
//!
//! This module plays a loaded `SampleBuffer` through the default output
//! device and drives the shared `PlaybackClock`.
//!
//! ## Real-time rules
//!
//! The fill callback never blocks, allocates or logs. Everything it reads
//! from the UI side is a single atomic word (clock position, paused and loop
//! flags, gain). The sample data itself is an `Arc<[f32]>` captured when the
//! stream is built; a reload always drops the stream first.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

use super::clock::PlaybackClock;
use super::source::SampleBuffer;

/// Preferred callback size in frames
pub const FRAMES_PER_BUFFER: u32 = 256;

/// Errors that can occur while starting playback
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No audio loaded")]
    NothingLoaded,

    #[error("No output device found")]
    NoDevice,

    #[error("Failed to query output configs: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("Failed to get default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("Failed to build stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("Failed to start stream: {0}")]
    Play(#[from] cpal::PlayStreamError),

    #[error("Unsupported sample format: {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),
}

/// State shared with the audio callback
///
/// Each field is one atomic word; there is nothing else to synchronize.
struct Shared {
    clock: Arc<PlaybackClock>,
    /// Output gain as `f32` bits
    gain: AtomicU32,
    /// Hardware latency plus one callback period, in frames (0 = not yet reported)
    latency_frames: AtomicU64,
}

impl Shared {
    fn gain(&self) -> f32 {
        f32::from_bits(self.gain.load(Ordering::Relaxed))
    }
}

/// Fill one interleaved output buffer from the mono source.
///
/// Every output channel receives the same mono sample; the clock advances by
/// one per frame.
fn write_audio_samples<T: Sample + FromSample<f32>>(
    data: &mut [T],
    channels: usize,
    samples: &[f32],
    clock: &PlaybackClock,
    gain: f32,
) {
    let channels = channels.max(1);
    let num_frames = data.len() / channels;
    let len = samples.len();

    if clock.is_paused() || len == 0 {
        for sample in data.iter_mut() {
            *sample = T::EQUILIBRIUM;
        }
        return;
    }

    let start = clock.read() as usize;
    let looping = clock.is_looping();

    for (frame_num, frame) in data.chunks_mut(channels).enumerate() {
        let pos = start + frame_num;
        let idx = if looping {
            Some(pos % len)
        } else if pos < len {
            Some(pos)
        } else {
            None
        };

        let value = match idx {
            Some(i) => T::from_sample(samples[i] * gain),
            None => T::EQUILIBRIUM,
        };
        for ch in frame.iter_mut() {
            *ch = value;
        }
    }

    clock.advance(num_frames as u64);
}

/// High-level audio output engine
///
/// Manages the cpal stream and transport controls.
pub struct AudioEngine {
    /// The audio output stream (kept alive to continue playback)
    stream: Option<cpal::Stream>,

    /// Atomics shared with the audio callback
    shared: Arc<Shared>,

    /// Output volume (0.0 to 1.0), before mute
    volume: f32,

    /// Whether output is muted
    muted: bool,

    /// Status message
    pub status: String,

    /// Sample rate of the running stream
    stream_rate: u32,

    /// Output channels of the running stream
    stream_channels: u16,
}

impl AudioEngine {
    /// Create a new audio engine driving `clock`
    pub fn new(clock: Arc<PlaybackClock>) -> Self {
        Self {
            stream: None,
            shared: Arc::new(Shared {
                clock,
                gain: AtomicU32::new(1.0f32.to_bits()),
                latency_frames: AtomicU64::new(0),
            }),
            volume: 1.0,
            muted: false,
            status: "Ready".to_string(),
            stream_rate: 0,
            stream_channels: 0,
        }
    }

    /// Check if a stream is running (paused or not)
    pub fn is_playing(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.shared.clock.is_paused()
    }

    /// Latest latency report from the callback, in frames
    ///
    /// `None` until the first callback of the current stream has run.
    pub fn reported_latency(&self) -> Option<u64> {
        match self.shared.latency_frames.load(Ordering::Relaxed) {
            0 => None,
            frames => Some(frames),
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if self.muted && self.volume > 0.0 {
            self.muted = false;
        }
        self.publish_gain();
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.publish_gain();
    }

    fn publish_gain(&self) {
        let gain = if self.muted { 0.0 } else { self.volume };
        self.shared.gain.store(gain.to_bits(), Ordering::Relaxed);
    }

    /// Start playback of `source` from the current clock position
    pub fn start(&mut self, source: &SampleBuffer) {
        if self.stream.is_some() {
            return; // Already playing
        }

        match self.try_start(source) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.shared.clock.set_paused(false);
                self.status = format!(
                    "Playing at {} Hz, {} channel(s)",
                    self.stream_rate, self.stream_channels
                );
                log::info!("Audio started successfully");
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                log::error!("Failed to start audio: {}", e);
            }
        }
    }

    fn try_start(&mut self, source: &SampleBuffer) -> Result<cpal::Stream, EngineError> {
        if source.is_empty() {
            return Err(EngineError::NothingLoaded);
        }

        log::info!("Starting audio engine...");

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(EngineError::NoDevice)?;

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        log::info!("Using output device: {}", device_name);

        let (config, sample_format) = choose_config(&device, source.sample_rate())?;
        log::info!("Audio config: {:?} ({:?})", config, sample_format);

        self.stream_rate = config.sample_rate.0;
        self.stream_channels = config.channels;
        self.shared.latency_frames.store(0, Ordering::Relaxed);
        self.publish_gain();

        let stream = match sample_format {
            cpal::SampleFormat::F32 => self.build_stream::<f32>(&device, &config, source)?,
            cpal::SampleFormat::I16 => self.build_stream::<i16>(&device, &config, source)?,
            cpal::SampleFormat::U16 => self.build_stream::<u16>(&device, &config, source)?,
            format => return Err(EngineError::UnsupportedFormat(format)),
        };

        stream.play()?;
        Ok(stream)
    }

    fn build_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        source: &SampleBuffer,
    ) -> Result<cpal::Stream, EngineError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = config.channels as usize;
        let rate = config.sample_rate.0 as f64;
        let samples = source.shared_samples();
        let shared = Arc::clone(&self.shared);

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], info: &cpal::OutputCallbackInfo| {
                write_audio_samples(data, channels, &samples, &shared.clock, shared.gain());

                // Report how far ahead of the speaker this buffer is being written
                let ts = info.timestamp();
                let ahead = ts
                    .playback
                    .duration_since(&ts.callback)
                    .map(|d| (d.as_secs_f64() * rate).round() as u64)
                    .unwrap_or(0);
                let period = (data.len() / channels.max(1)) as u64;
                shared
                    .latency_frames
                    .store((ahead + period).max(1), Ordering::Relaxed);
            },
            |err| log::error!("Audio stream error: {}", err),
            None,
        )?;
        Ok(stream)
    }

    /// Toggle the paused flag of a running stream
    pub fn set_paused(&mut self, paused: bool) {
        if self.stream.is_none() {
            return;
        }
        self.shared.clock.set_paused(paused);
        self.status = if paused { "Paused" } else { "Playing" }.to_string();
    }

    /// Stop playback and rewind to the start
    pub fn stop(&mut self) {
        self.stream = None;
        self.shared.clock.set_paused(false);
        self.shared.clock.reset();
        self.shared.latency_frames.store(0, Ordering::Relaxed);
        self.status = "Stopped".to_string();
        log::info!("Audio stopped");
    }

    /// Toggle playback state
    pub fn toggle(&mut self, source: &SampleBuffer) {
        if self.is_playing() {
            let paused = self.is_paused();
            self.set_paused(!paused);
        } else {
            self.start(source);
        }
    }

    /// Rewind and make sure a stream is running
    pub fn restart(&mut self, source: &SampleBuffer) {
        self.shared.clock.reset();
        if !self.is_playing() {
            self.start(source);
        }
    }

    /// Reopen the default device, keeping position and paused state
    pub fn refresh_device(&mut self, source: &SampleBuffer) {
        let was_playing = self.is_playing();
        let was_paused = self.is_paused();
        let position = self.shared.clock.read();

        self.stop();

        if was_playing && !source.is_empty() {
            self.shared.clock.seek(position);
            self.start(source);
            if was_paused {
                self.set_paused(true);
            }
        }
    }
}

/// Pick an output config at the source's sample rate if the device offers one
fn choose_config(
    device: &cpal::Device,
    sample_rate: u32,
) -> Result<(cpal::StreamConfig, cpal::SampleFormat), EngineError> {
    let wanted = cpal::SampleRate(sample_rate);

    let matching = device
        .supported_output_configs()?
        .filter(|range| range.min_sample_rate() <= wanted && wanted <= range.max_sample_rate())
        .max_by_key(|range| sample_format_rank(range.sample_format()));

    if let Some(range) = matching {
        let buffer_size = match range.buffer_size() {
            cpal::SupportedBufferSize::Range { min, max }
                if *min <= FRAMES_PER_BUFFER && FRAMES_PER_BUFFER <= *max =>
            {
                cpal::BufferSize::Fixed(FRAMES_PER_BUFFER)
            }
            _ => cpal::BufferSize::Default,
        };
        let supported = range.with_sample_rate(wanted);
        let sample_format = supported.sample_format();
        let mut config: cpal::StreamConfig = supported.into();
        config.buffer_size = buffer_size;
        return Ok((config, sample_format));
    }

    log::warn!(
        "Output device does not support {} Hz, using its default rate (pitch will shift)",
        sample_rate
    );
    let supported = device.default_output_config()?;
    let sample_format = supported.sample_format();
    Ok((supported.into(), sample_format))
}

/// Preference order when several configs cover the wanted rate
fn sample_format_rank(format: cpal::SampleFormat) -> u8 {
    match format {
        cpal::SampleFormat::F32 => 3,
        cpal::SampleFormat::I16 => 2,
        cpal::SampleFormat::U16 => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock_with(len: u64, looping: bool) -> PlaybackClock {
        let clock = PlaybackClock::new();
        clock.set_length(len);
        clock.set_looping(looping);
        clock
    }

    #[test]
    fn test_fill_duplicates_mono_across_channels() {
        let samples = [0.1, 0.2, 0.3, 0.4];
        let clock = clock_with(4, true);
        let mut out = [0.0f32; 6];

        write_audio_samples(&mut out, 2, &samples, &clock, 1.0);

        assert_eq!(out, [0.1, 0.1, 0.2, 0.2, 0.3, 0.3]);
        assert_eq!(clock.read(), 3);
    }

    #[test]
    fn test_fill_loops_to_start() {
        let samples = [1.0, 2.0, 3.0];
        let clock = clock_with(3, true);
        clock.seek(2);
        let mut out = [0.0f32; 3];

        write_audio_samples(&mut out, 1, &samples, &clock, 1.0);

        assert_eq!(out, [3.0, 1.0, 2.0]);
        assert_eq!(clock.read(), 2);
    }

    #[test]
    fn test_fill_silence_when_exhausted() {
        let samples = [1.0, 2.0, 3.0];
        let clock = clock_with(3, false);
        clock.seek(2);
        let mut out = [9.0f32; 3];

        write_audio_samples(&mut out, 1, &samples, &clock, 1.0);

        assert_eq!(out, [3.0, 0.0, 0.0]);
        assert_eq!(clock.read(), 3);
    }

    #[test]
    fn test_fill_paused_emits_silence_and_holds() {
        let samples = [1.0, 2.0];
        let clock = clock_with(2, true);
        clock.set_paused(true);
        let mut out = [5.0f32; 4];

        write_audio_samples(&mut out, 2, &samples, &clock, 1.0);

        assert_eq!(out, [0.0; 4]);
        assert_eq!(clock.read(), 0);
    }

    #[test]
    fn test_fill_applies_gain_and_converts() {
        let samples = [0.5];
        let clock = clock_with(1, true);
        let mut out = [0i16; 2];

        write_audio_samples(&mut out, 2, &samples, &clock, 0.0);
        assert_eq!(out, [0, 0]);

        write_audio_samples(&mut out, 2, &samples, &clock, 1.0);
        assert!(out[0] > 16000 && out[0] == out[1]);
    }

    #[test]
    fn test_volume_unmutes() {
        let mut engine = AudioEngine::new(Arc::new(PlaybackClock::new()));
        engine.set_muted(true);
        assert!(engine.is_muted());
        assert_eq!(engine.shared.gain(), 0.0);

        engine.set_volume(0.5);
        assert!(!engine.is_muted());
        assert!((engine.shared.gain() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_stop_resets_clock() {
        let clock = Arc::new(PlaybackClock::new());
        clock.set_length(1000);
        clock.seek(500);
        clock.set_paused(true);

        let mut engine = AudioEngine::new(Arc::clone(&clock));
        engine.stop();

        assert_eq!(clock.read(), 0);
        assert!(!clock.is_paused());
        assert!(engine.reported_latency().is_none());
    }
}
