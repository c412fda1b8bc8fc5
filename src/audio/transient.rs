//! Transient detection and beat-phase tracking
//!
//! Runs inside the host audio callback, once per block. Reads only
//! atomics from the shared snapshot and the sample buffers; never touches
//! a mutex, a channel, or the allocator. Publishes each detected onset as
//! a signed offset relative to the nearest beat so the UI can show how
//! early or late the player lands.

use std::sync::atomic::Ordering;

use crate::sync::AtomicSnapshot;

/// Per-sample envelope release coefficient.
const ENVELOPE_RELEASE: f32 = 0.985;

/// Phase error (in cycles) beyond which the tracker snaps instead of
/// blending. Large discontinuities mean a loop or seek, not drift.
const PHASE_SNAP_THRESHOLD: f64 = 0.08;

/// Time constant for blending toward the protocol-reported phase.
const PHASE_BLEND_TIME_CONSTANT_SECS: f64 = 0.120;

/// Minimum spacing between triggers.
const RETRIGGER_GAP_SECS: f64 = 0.040;

/// The gate reopens (and the rising edge is measured) at this fraction of
/// the threshold, so sustain and ring-out cannot re-trigger.
const GATE_HYSTERESIS: f32 = 0.6;

/// Envelope follower plus drift-corrected beat-phase clock.
///
/// The protocol reports interval position at a low rate from the session
/// thread; between updates the tracker advances its own sample-accurate
/// phase and gently corrects toward the reported value.
pub struct TransientBeatTracker {
    sample_rate: f64,
    samples_per_beat: f64,
    beat_phase: f64,
    envelope: f32,
    gate_open: bool,
    samples_since_trigger: u32,
    min_gap_samples: u32,
}

impl TransientBeatTracker {
    pub fn new(sample_rate: f64) -> Self {
        let min_gap_samples = (sample_rate * RETRIGGER_GAP_SECS) as u32;
        Self {
            sample_rate,
            // 60 BPM fallback until the snapshot supplies a tempo.
            samples_per_beat: sample_rate,
            beat_phase: 0.0,
            envelope: 0.0,
            gate_open: true,
            // Allow an onset in the very first block.
            samples_since_trigger: min_gap_samples,
            min_gap_samples,
        }
    }

    /// Current tracked phase in [0, 1); 0 is the beat.
    pub fn beat_phase(&self) -> f64 {
        self.beat_phase
    }

    /// Process one stereo block and publish any detected transient.
    pub fn process_block(&mut self, left: &[f32], right: &[f32], snapshot: &AtomicSnapshot) {
        let frames = left.len().min(right.len());
        if frames == 0 {
            return;
        }

        // A tempo at or below 1 BPM means no usable timing this block; the
        // phase clock free-runs on its last known rate.
        let bpm = snapshot.bpm.load(Ordering::Relaxed) as f64;
        if bpm > 1.0 {
            self.samples_per_beat = self.sample_rate * 60.0 / bpm;

            let position = snapshot.interval_position.load(Ordering::Relaxed);
            let length = snapshot.interval_length.load(Ordering::Relaxed);
            let bpi = snapshot.bpi.load(Ordering::Relaxed);
            if length > 0 && bpi > 0 {
                let reported =
                    (position as f64 / length as f64 * bpi as f64).rem_euclid(1.0);
                self.correct_phase(reported, frames as f64 / self.sample_rate);
            }
        }

        let threshold = snapshot.transient_threshold.load(Ordering::Relaxed);
        let reopen_level = threshold * GATE_HYSTERESIS;
        let phase_step = 1.0 / self.samples_per_beat;

        for i in 0..frames {
            let peak = left[i].abs().max(right[i].abs());
            let previous = self.envelope;
            self.envelope = peak.max(self.envelope * ENVELOPE_RELEASE);

            if !self.gate_open && self.envelope < reopen_level {
                self.gate_open = true;
            }

            if self.gate_open
                && self.envelope >= threshold
                && previous < reopen_level
                && self.samples_since_trigger >= self.min_gap_samples
            {
                // 0 = on the beat, negative = early, positive = late.
                snapshot.publish_transient((self.beat_phase - 0.5) as f32);
                self.gate_open = false;
                self.samples_since_trigger = 0;
            } else {
                self.samples_since_trigger = self.samples_since_trigger.saturating_add(1);
            }

            self.beat_phase += phase_step;
            if self.beat_phase >= 1.0 {
                self.beat_phase -= 1.0;
            }
        }
    }

    /// Pull the tracked phase toward the protocol-reported phase.
    ///
    /// Small errors blend exponentially; anything past the snap threshold
    /// is taken as a discontinuity and adopted outright.
    fn correct_phase(&mut self, reported: f64, block_secs: f64) {
        // Wrapped error in [-0.5, 0.5).
        let mut error = reported - self.beat_phase;
        error -= (error + 0.5).floor();

        if error.abs() > PHASE_SNAP_THRESHOLD {
            self.beat_phase = reported;
        } else {
            let blend = 1.0 - (-block_secs / PHASE_BLEND_TIME_CONSTANT_SECS).exp();
            self.beat_phase = (self.beat_phase + error * blend).rem_euclid(1.0);
        }
    }
}
