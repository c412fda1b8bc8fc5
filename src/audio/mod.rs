//! Real-time audio-thread components

pub mod meter;
pub mod processor;
pub mod transient;

pub use meter::StereoPeakMeter;
pub use processor::AudioProcessor;
pub use transient::TransientBeatTracker;
