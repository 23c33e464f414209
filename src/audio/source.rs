//! Decoded mono sample source
//!
//! A `SampleBuffer` is produced once per file load and never mutated. The
//! samples live behind an `Arc<[f32]>` so the audio callback can hold its own
//! handle without any synchronization: a reload builds a new buffer and the
//! old stream (and its handle) is dropped before the new one starts.
//!
//! WAV goes through `hound`; everything else is probed by `symphonia`.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use symphonia::core::audio::SampleBuffer as DecodedBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// Errors that can occur while decoding an audio file
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode WAV: {0}")]
    Wav(#[from] hound::Error),

    #[error("Failed to decode audio: {0}")]
    Codec(#[from] SymphoniaError),

    #[error("No audio track found")]
    NoTrack,

    #[error("Stream does not declare a sample rate")]
    MissingSampleRate,

    #[error("Stream does not declare a channel layout")]
    MissingChannels,

    #[error("Stream has zero channels")]
    NoChannels,
}

/// Immutable mono audio plus its sample rate
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    samples: Arc<[f32]>,
    sample_rate: u32,
    /// Channel count of the file before downmixing
    source_channels: u16,
    /// Short container name for display ("WAV", "MP3", ...)
    format: String,
}

impl SampleBuffer {
    /// Wrap already-mono samples
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            source_channels: 1,
            format: "PCM".to_string(),
        }
    }

    /// Downmix interleaved samples to mono by averaging channels
    pub fn from_interleaved(interleaved: &[f32], channels: u16, sample_rate: u32) -> Self {
        Self {
            samples: mix_to_mono(interleaved, channels).into(),
            sample_rate,
            source_channels: channels,
            format: "PCM".to_string(),
        }
    }

    /// Decode a file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let mut buffer = match extension.as_deref() {
            Some("wav") | Some("wave") => load_wav(path)?,
            _ => load_with_symphonia(path, extension.as_deref())?,
        };

        if let Some(ext) = extension {
            buffer.format = ext.to_ascii_uppercase();
        }

        log::info!(
            "Loaded {}: {} Hz, {} channel(s) downmixed to mono, {:.2} s",
            path.display(),
            buffer.sample_rate,
            buffer.source_channels,
            buffer.duration_secs()
        );

        Ok(buffer)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Shared handle to the sample data for the audio thread
    pub fn shared_samples(&self) -> Arc<[f32]> {
        Arc::clone(&self.samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn source_channels(&self) -> u16 {
        self.source_channels
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Arithmetic mean across interleaved channels.
///
/// A trailing partial frame is dropped.
pub fn mix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let ch = channels.max(1) as usize;
    if ch == 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

fn load_wav(path: &Path) -> Result<SampleBuffer, DecodeError> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(DecodeError::NoChannels);
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(SampleBuffer::from_interleaved(
        &interleaved,
        spec.channels,
        spec.sample_rate,
    ))
}

fn load_with_symphonia(path: &Path, extension: Option<&str>) -> Result<SampleBuffer, DecodeError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(DecodeError::MissingSampleRate)?;
    let channels = track
        .codec_params
        .channels
        .ok_or(DecodeError::MissingChannels)?
        .count() as u16;
    if channels == 0 {
        return Err(DecodeError::NoChannels);
    }
    let track_id = track.id;

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let mut buf = DecodedBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            // Corrupt packets are skipped, not fatal
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping undecodable packet: {}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(SampleBuffer::from_interleaved(&interleaved, channels, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_to_mono_averages() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        let mono = mix_to_mono(&stereo, 2);
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_mix_to_mono_drops_partial_frame() {
        let mono = mix_to_mono(&[0.3, 0.3, 0.3, 0.9, 0.9], 3);
        assert_eq!(mono.len(), 1);
        assert!((mono[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_from_interleaved_keeps_source_channels() {
        let buffer = SampleBuffer::from_interleaved(&[0.2, 0.4, 0.6, 0.8], 2, 44100);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.source_channels(), 2);
        assert_eq!(buffer.sample_rate(), 44100);
    }

    #[test]
    fn test_duration() {
        let buffer = SampleBuffer::from_mono(vec![0.0; 22050], 44100);
        assert!((buffer.duration_secs() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_load_missing_file() {
        let result = SampleBuffer::load("/definitely/not/here.wav");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_wav_roundtrip() {
        let path = std::env::temp_dir().join("waterfall_rs_source_test.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        {
            let mut writer = hound::WavWriter::create(&path, spec).unwrap();
            for _ in 0..100 {
                writer.write_sample(16384i16).unwrap();
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }

        let buffer = SampleBuffer::load(&path).unwrap();
        assert_eq!(buffer.len(), 100);
        assert_eq!(buffer.sample_rate(), 8000);
        assert_eq!(buffer.source_channels(), 2);
        assert_eq!(buffer.format(), "WAV");
        assert!((buffer.samples()[0] - 0.25).abs() < 1e-3);

        let _ = std::fs::remove_file(&path);
    }
}
