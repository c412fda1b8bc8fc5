//! Stereo peak metering for the UI level displays

/// Peak release time; the displayed level falls back at this rate after
/// the signal drops.
const METER_RELEASE_SECS: f32 = 0.3;

/// Block peak follower with exponential fall-back, one per metered pair.
pub struct StereoPeakMeter {
    sample_rate: f32,
    left: f32,
    right: f32,
}

impl StereoPeakMeter {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            left: 0.0,
            right: 0.0,
        }
    }

    /// Fold one block into the meter and return the smoothed peaks.
    pub fn process(&mut self, left: &[f32], right: &[f32]) -> (f32, f32) {
        let frames = left.len().min(right.len());
        let release = (-(frames as f32) / (self.sample_rate * METER_RELEASE_SECS)).exp();

        let mut peak_l = 0.0f32;
        let mut peak_r = 0.0f32;
        for i in 0..frames {
            peak_l = peak_l.max(left[i].abs());
            peak_r = peak_r.max(right[i].abs());
        }

        self.left = peak_l.max(self.left * release);
        self.right = peak_r.max(self.right * release);
        (self.left, self.right)
    }

    pub fn reset(&mut self) {
        self.left = 0.0;
        self.right = 0.0;
    }
}
