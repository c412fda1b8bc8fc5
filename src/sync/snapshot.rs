//! Cross-thread atomic state snapshot
//!
//! A set of independently-atomic scalars written by the session and audio
//! threads and read by the UI at frame rate. There is deliberately no
//! group consistency: each field is last-writer-wins on its own, and a
//! reader may observe a torn view across fields written in the same
//! update cycle. Keeping the fields independent is what keeps every
//! access lock-free.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

/// Atomic f32 stored as raw bits in an `AtomicU32`.
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub const fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub fn load(&self, order: Ordering) -> f32 {
        f32::from_bits(self.0.load(order))
    }

    pub fn store(&self, value: f32, order: Ordering) {
        self.0.store(value.to_bits(), order);
    }
}

/// Shared scalar state for high-frequency reads without any mutex.
///
/// Writers: the session thread publishes timing fields after each protocol
/// step; the audio thread publishes peak levels and transient results once
/// per block. The UI thread only reads (except the sensitivity threshold,
/// which it owns).
pub struct AtomicSnapshot {
    // Session timing (session thread writes)
    pub bpm: AtomicF32,
    pub bpi: AtomicI32,
    pub interval_position: AtomicI32,
    pub interval_length: AtomicI32,
    pub beat_position: AtomicI32,

    // Peak levels (audio thread writes)
    pub master_peak_left: AtomicF32,
    pub master_peak_right: AtomicF32,
    pub local_peak_left: AtomicF32,
    pub local_peak_right: AtomicF32,

    // Transient feedback (audio thread writes, UI consumes)
    pub transient_detected: AtomicBool,
    pub transient_beat_offset: AtomicF32,

    // Detection sensitivity (UI writes, audio reads)
    pub transient_threshold: AtomicF32,
}

impl AtomicSnapshot {
    pub fn new() -> Self {
        Self {
            bpm: AtomicF32::new(0.0),
            bpi: AtomicI32::new(0),
            interval_position: AtomicI32::new(0),
            interval_length: AtomicI32::new(0),
            beat_position: AtomicI32::new(0),
            master_peak_left: AtomicF32::new(0.0),
            master_peak_right: AtomicF32::new(0.0),
            local_peak_left: AtomicF32::new(0.0),
            local_peak_right: AtomicF32::new(0.0),
            transient_detected: AtomicBool::new(false),
            transient_beat_offset: AtomicF32::new(0.0),
            transient_threshold: AtomicF32::new(crate::constants::DEFAULT_TRANSIENT_THRESHOLD),
        }
    }

    /// Publish session timing after a protocol step (session thread only).
    pub fn publish_timing(&self, bpm: f32, bpi: i32, position: i32, length: i32, beat: i32) {
        self.bpm.store(bpm, Ordering::Relaxed);
        self.bpi.store(bpi, Ordering::Relaxed);
        self.interval_position.store(position, Ordering::Relaxed);
        self.interval_length.store(length, Ordering::Relaxed);
        self.beat_position.store(beat, Ordering::Relaxed);
    }

    /// Publish a detected transient (audio thread only).
    ///
    /// The offset is stored before the flag is released so a reader that
    /// observes the flag sees the matching offset.
    pub fn publish_transient(&self, beat_offset: f32) {
        self.transient_beat_offset.store(beat_offset, Ordering::Relaxed);
        self.transient_detected.store(true, Ordering::Release);
    }

    /// Consume the pending transient, if any (UI thread only).
    pub fn take_transient(&self) -> Option<f32> {
        if self.transient_detected.load(Ordering::Acquire) {
            let offset = self.transient_beat_offset.load(Ordering::Relaxed);
            self.transient_detected.store(false, Ordering::Release);
            Some(offset)
        } else {
            None
        }
    }
}

impl Default for AtomicSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
