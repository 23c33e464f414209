//! Audio module - handles decoding, playback and the shared clock
//!
//! This module provides:
//! - Immutable mono sample source with file decoding
//! - Lock-free playback clock shared with the audio thread
//! - Audio engine for cpal integration

mod clock;
mod engine;
mod source;

// Re-export public types
pub use clock::{wrap_index, PlaybackClock};
pub use engine::AudioEngine;
pub use source::SampleBuffer;
