//! Cross-thread synchronization primitives

pub mod license;
pub mod snapshot;
pub mod spsc;

pub use license::LicenseGate;
pub use snapshot::{AtomicF32, AtomicSnapshot};
pub use spsc::BoundedChannel;
