//! Playback clock shared between the audio callback and the render loop
//!
//! The clock is the only playback state both threads touch. Every field is a
//! single atomic word accessed with `Ordering::Relaxed`: readers tolerate a
//! position that lags the hardware by a few samples, and the analyzer's
//! latency compensation already absorbs that skew.
//!
//! ## Ownership
//!
//! - `advance()` is called only by the audio callback while a stream runs
//! - `seek()`, `read()` and the flag setters may be called from any thread
//! - `set_length()` is called by the render thread while no stream exists

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Wrap a possibly negative sample offset into `[0, len)`.
///
/// Returns 0 for an empty buffer.
pub fn wrap_index(idx: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    idx.rem_euclid(len as i64) as usize
}

/// Monotonic, wrap-around mono sample counter
///
/// One tick per output frame, never per channel.
#[derive(Debug, Default)]
pub struct PlaybackClock {
    /// Current read position in mono samples
    position: AtomicU64,
    /// Length of the loaded sample buffer
    length: AtomicU64,
    /// Emit silence without advancing
    paused: AtomicBool,
    /// Wrap to the start at end-of-buffer instead of holding
    looping: AtomicBool,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self {
            looping: AtomicBool::new(true),
            ..Default::default()
        }
    }

    /// Current position, non-blocking
    pub fn read(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    /// Jump to `pos`, clamped to `[0, length]`
    pub fn seek(&self, pos: u64) {
        let len = self.length.load(Ordering::Relaxed);
        self.position.store(pos.min(len), Ordering::Relaxed);
    }

    /// Seek by a signed number of samples, saturating at both ends
    pub fn seek_by(&self, delta: i64) {
        let pos = self.read() as i64;
        self.seek(pos.saturating_add(delta).max(0) as u64);
    }

    /// Seek to a fraction (0.0 to 1.0) of the buffer
    pub fn seek_fraction(&self, fraction: f64) {
        let len = self.length() as f64;
        self.seek((fraction.clamp(0.0, 1.0) * len) as u64);
    }

    /// Advance by `frames` samples.
    ///
    /// Wraps modulo the buffer length when looping, otherwise holds at the
    /// end. Returns `false` once the clock sits at end-of-buffer and the
    /// callback should emit silence.
    pub fn advance(&self, frames: u64) -> bool {
        let len = self.length.load(Ordering::Relaxed);
        if len == 0 {
            return false;
        }
        let looping = self.looping.load(Ordering::Relaxed);

        // fetch_update keeps a concurrent seek from being overwritten with a stale position
        let _ = self
            .position
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |pos| {
                Some(if looping {
                    pos.wrapping_add(frames) % len
                } else {
                    pos.saturating_add(frames).min(len)
                })
            });

        looping || self.read() < len
    }

    /// Reset to the start of the buffer
    pub fn reset(&self) {
        self.position.store(0, Ordering::Relaxed);
    }

    /// Set the buffer length; resets the position.
    ///
    /// Only valid while no output stream is reading the clock.
    pub fn set_length(&self, len: u64) {
        self.length.store(len, Ordering::Relaxed);
        self.position.store(0, Ordering::Relaxed);
    }

    pub fn length(&self) -> u64 {
        self.length.load(Ordering::Relaxed)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    pub fn is_looping(&self) -> bool {
        self.looping.load(Ordering::Relaxed)
    }

    pub fn set_looping(&self, looping: bool) {
        self.looping.store(looping, Ordering::Relaxed);
    }
}
