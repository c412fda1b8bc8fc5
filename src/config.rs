//! Persisted settings
//!
//! Connection defaults and tuning the user expects to survive a restart.
//! The password is deliberately absent: it lives in memory only.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_TRANSIENT_THRESHOLD;
use crate::error::ConfigError;

/// On-disk settings, stored as TOML in the platform config directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Last server address, `host:port`.
    pub server: String,
    pub username: String,
    pub local_channel_name: String,
    /// Local channel bitrate in kbps.
    pub local_bitrate: i32,
    /// Transient detector sensitivity threshold.
    pub transient_threshold: f32,
    /// Diagnostic: serialize the audio callback with the session thread.
    /// Trades real-time safety for deterministic ordering; debugging only.
    pub serialize_audio: bool,
    /// Public server list URL.
    pub server_list_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: String::new(),
            username: String::new(),
            local_channel_name: "Channel".to_string(),
            local_bitrate: crate::constants::DEFAULT_LOCAL_BITRATE,
            transient_threshold: DEFAULT_TRANSIENT_THRESHOLD,
            serialize_audio: false,
            server_list_url: String::new(),
        }
    }
}

impl Config {
    /// Platform config file path, e.g. `~/.config/jamlink/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = directories::ProjectDirs::from("", "", "jamlink")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Read(e)),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Write)?;
        }
        std::fs::write(path, text).map_err(ConfigError::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(Path::new("/nonexistent/jamlink/config.toml")).unwrap();
        assert_eq!(config.local_channel_name, "Channel");
        assert!(!config.serialize_audio);
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = Config::default();
        config.server = "ninbot.com:2049".to_string();
        config.username = "alice".to_string();
        config.transient_threshold = 0.4;

        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.server, "ninbot.com:2049");
        assert_eq!(back.username, "alice");
        assert_eq!(back.transient_threshold, 0.4);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let back: Config = toml::from_str("username = \"bob\"").unwrap();
        assert_eq!(back.username, "bob");
        assert_eq!(back.local_bitrate, crate::constants::DEFAULT_LOCAL_BITRATE);
    }
}
