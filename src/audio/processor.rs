//! Audio-thread facade
//!
//! The one object the host audio callback touches. It reads and writes
//! snapshot atomics only; it takes no lock and performs no allocation in
//! the default configuration, so it always fits the real-time budget.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::audio::meter::StereoPeakMeter;
use crate::audio::transient::TransientBeatTracker;
use crate::bridge::SessionBridge;

/// Per-block processing for the audio thread: transient/beat tracking on
/// the local input, peak meters on input and output.
pub struct AudioProcessor {
    bridge: Arc<SessionBridge>,
    tracker: TransientBeatTracker,
    local_meter: StereoPeakMeter,
    master_meter: StereoPeakMeter,
    serialize_with_session: bool,
}

impl AudioProcessor {
    pub fn new(bridge: Arc<SessionBridge>, sample_rate: f64) -> Self {
        Self {
            bridge,
            tracker: TransientBeatTracker::new(sample_rate),
            local_meter: StereoPeakMeter::new(sample_rate),
            master_meter: StereoPeakMeter::new(sample_rate),
            serialize_with_session: false,
        }
    }

    /// Diagnostic opt-in: hold the session serialization lock for the
    /// whole block. Deterministic ordering against the session thread at
    /// the cost of real-time safety; debugging only.
    pub fn set_diagnostic_serialization(&mut self, enabled: bool) {
        if enabled != self.serialize_with_session {
            tracing::warn!(enabled, "diagnostic audio serialization toggled");
        }
        self.serialize_with_session = enabled;
    }

    /// Process one block. `input` is the local signal being transmitted,
    /// `output` the mixed signal handed back to the host.
    pub fn process(
        &mut self,
        input_left: &[f32],
        input_right: &[f32],
        output_left: &[f32],
        output_right: &[f32],
    ) {
        let _diagnostic_guard = if self.serialize_with_session {
            Some(self.bridge.client.lock())
        } else {
            None
        };

        let snapshot = &self.bridge.snapshot;

        self.tracker
            .process_block(input_left, input_right, snapshot);

        let (local_l, local_r) = self.local_meter.process(input_left, input_right);
        snapshot.local_peak_left.store(local_l, Ordering::Relaxed);
        snapshot.local_peak_right.store(local_r, Ordering::Relaxed);

        let (master_l, master_r) = self.master_meter.process(output_left, output_right);
        snapshot.master_peak_left.store(master_l, Ordering::Relaxed);
        snapshot.master_peak_right.store(master_r, Ordering::Relaxed);
    }

    /// Current tracked beat phase, for diagnostics.
    pub fn beat_phase(&self) -> f64 {
        self.tracker.beat_phase()
    }
}
