//! Error types for the session core
//!
//! Protocol-level failures are not represented here: they travel to the UI
//! as `StatusChanged` event payloads, never as panics or cross-thread
//! errors. The audio thread has no error channel at all; invalid snapshot
//! values degrade processing gracefully instead.

use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// A message queue was full. Transient and non-fatal: the user action
    /// is dropped and may simply be repeated.
    #[error("message queue full, action dropped")]
    QueueFull,

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("session thread failed to start: {0}")]
    ThreadSpawn(#[from] std::io::Error),
}

/// Configuration load/store errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no configuration directory available")]
    NoConfigDir,

    #[error("failed to read config: {0}")]
    Read(std::io::Error),

    #[error("failed to write config: {0}")]
    Write(std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
