//! Public-server-list source interface
//!
//! The HTTP fetch and response parsing are external; the session loop only
//! issues a request when the UI asks for one and polls for the outcome once
//! per iteration.

use serde::{Deserialize, Serialize};

/// One entry from the public server list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerEntry {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub users: u32,
    pub max_users: u32,
    /// Comma-separated usernames, as published by the list.
    pub user_list: String,
    pub topic: String,
    /// Parsed tempo; 0 for lobby entries.
    pub bpm: u32,
    pub bpi: u32,
    pub is_lobby: bool,
}

impl ServerEntry {
    /// `host:port` form used for the connect command.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Completed fetch: entries on success, error text on failure.
#[derive(Debug, Clone, Default)]
pub struct ServerListResult {
    pub servers: Vec<ServerEntry>,
    pub error: Option<String>,
}

/// Non-blocking fetcher polled by the session loop.
pub trait ServerListSource: Send {
    /// Begin fetching the list at `url`. A request issued while another is
    /// in flight replaces it.
    fn request(&mut self, url: &str);

    /// Returns the finished result once, then `None` until the next
    /// request completes.
    fn poll(&mut self) -> Option<ServerListResult>;
}

/// Source that never produces a list; used when no browser UI is wired up.
#[derive(Debug, Default)]
pub struct NullServerListSource;

impl ServerListSource for NullServerListSource {
    fn request(&mut self, url: &str) {
        tracing::debug!(url, "server list request ignored (null source)");
    }

    fn poll(&mut self) -> Option<ServerListResult> {
        None
    }
}
