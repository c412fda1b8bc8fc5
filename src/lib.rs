//! # JamLink
//!
//! Real-time collaborative-audio session core: the synchronization layer
//! that lets one plugin instance span three timing domains without
//! glitches or deadlocks.
//!
//! ## Architecture Overview
//!
//! ```text
//!  AUDIO THREAD (host callback, hard real-time)
//!  ┌──────────────────────────────────────────────┐
//!  │ AudioProcessor                               │
//!  │   TransientBeatTracker + StereoPeakMeter     │
//!  │   reads/writes AtomicSnapshot atomics ONLY   │
//!  └───────────────┬──────────────────────────────┘
//!                  │ lock-free atomics
//!  ┌───────────────▼──────────────────────────────┐
//!  │ SessionBridge (Arc, one per plugin instance) │
//!  │   AtomicSnapshot   LicenseGate   shutdown    │
//!  │   commands ◄── BoundedChannel ─── UI         │
//!  │   events   ──► BoundedChannel ──► UI         │
//!  │   chat     ──► BoundedChannel ──► UI         │
//!  └───────────────┬──────────────────────────────┘
//!                  │ serialization lock (client calls)
//!  ┌───────────────▼──────────────────────────────┐
//!  │ SESSION THREAD (may block)                   │
//!  │ SessionLoop: drain commands → step client →  │
//!  │   publish events/snapshot → adaptive sleep   │
//!  │   license prompt blocks here, shutdown-safe  │
//!  └──────────────────────────────────────────────┘
//!
//!  UI THREAD (fixed render cadence)
//!    UiHandle: push commands, drain events/chat,
//!    read snapshot, answer license prompts
//! ```
//!
//! The audio thread never blocks, allocates, or takes a lock; the session
//! thread may block on socket work and on the license rendezvous; the UI
//! thread observes a consistent-enough view through the snapshot without
//! either of the others ever waiting on it.

pub mod audio;
pub mod bridge;
pub mod config;
pub mod error;
pub mod plugin;
pub mod session;
pub mod sync;

pub use bridge::SessionBridge;
pub use error::{Error, Result};
pub use plugin::{JamLinkPlugin, UiHandle};

/// Application-wide constants
pub mod constants {
    use std::time::Duration;

    /// UI → session command queue slots.
    pub const COMMAND_QUEUE_CAPACITY: usize = 256;

    /// Session → UI event queue slots.
    pub const EVENT_QUEUE_CAPACITY: usize = 256;

    /// Dedicated chat queue slots, kept apart from events so chat bursts
    /// cannot evict state changes.
    pub const CHAT_QUEUE_CAPACITY: usize = 128;

    /// Session loop sleep while disconnected (20 Hz poll).
    pub const SESSION_SLEEP_DISCONNECTED: Duration = Duration::from_millis(50);

    /// Session loop sleep while connecting or connected (50 Hz poll).
    pub const SESSION_SLEEP_CONNECTED: Duration = Duration::from_millis(20);

    /// How long the license rendezvous waits before treating silence as a
    /// rejection.
    pub const LICENSE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Default local channel bitrate in kbps.
    pub const DEFAULT_LOCAL_BITRATE: i32 = 128;

    /// Default transient detector sensitivity.
    pub const DEFAULT_TRANSIENT_THRESHOLD: f32 = 0.25;
}
