//! Shared state bridging the audio, session, and UI threads
//!
//! One [`SessionBridge`] exists per plugin instance, shared by `Arc` and
//! alive for the whole activation. It owns the three message queues, the
//! atomic snapshot, the license gate, the shutdown flag, and the two
//! mutexes: the serialization lock around the protocol client and the
//! state lock around connection settings.
//!
//! Lock order where both are needed: client lock first, then state lock.
//! The audio thread takes neither in the default configuration.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{
    CHAT_QUEUE_CAPACITY, COMMAND_QUEUE_CAPACITY, DEFAULT_LOCAL_BITRATE, EVENT_QUEUE_CAPACITY,
};
use crate::session::client::SessionClient;
use crate::session::command::Command;
use crate::session::event::{ChatLine, Event};
use crate::sync::{AtomicSnapshot, BoundedChannel, LicenseGate};

/// Connection and local-channel settings, guarded by the state lock.
///
/// The password lives here in memory only; it is never persisted or
/// logged.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub server: String,
    pub username: String,
    pub password: String,
    pub local_channel_name: String,
    pub local_bitrate: i32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            server: String::new(),
            username: String::new(),
            password: String::new(),
            local_channel_name: "Channel".to_string(),
            local_bitrate: DEFAULT_LOCAL_BITRATE,
        }
    }
}

/// Per-instance shared core state.
pub struct SessionBridge {
    /// UI → session commands.
    pub commands: BoundedChannel<Command, COMMAND_QUEUE_CAPACITY>,
    /// Session → UI state-change events.
    pub events: BoundedChannel<Event, EVENT_QUEUE_CAPACITY>,
    /// Session → UI chat lines, separate so chat bursts cannot evict
    /// state events.
    pub chat: BoundedChannel<ChatLine, CHAT_QUEUE_CAPACITY>,
    /// Lock-free scalar state for frame-rate reads.
    pub snapshot: AtomicSnapshot,
    /// Blocking license accept/reject handshake.
    pub license: LicenseGate,
    /// Observed at every blocking or long-running point.
    pub shutdown: Arc<AtomicBool>,
    /// State lock: connection settings and UI-owned strings.
    pub settings: Mutex<ConnectionSettings>,
    /// Serialization lock: all protocol-client calls except the host
    /// audio entry point go through here, on the session thread.
    pub client: Mutex<Option<Box<dyn SessionClient>>>,
}

impl SessionBridge {
    pub fn new() -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        Self {
            commands: BoundedChannel::new(),
            events: BoundedChannel::new(),
            chat: BoundedChannel::new(),
            snapshot: AtomicSnapshot::new(),
            license: LicenseGate::new(shutdown.clone()),
            shutdown,
            settings: Mutex::new(ConnectionSettings::default()),
            client: Mutex::new(None),
        }
    }

    /// Bridge with a short license deadline; test use only.
    pub fn with_license_timeout(timeout: Duration) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        Self {
            license: LicenseGate::with_timeout(shutdown.clone(), timeout),
            shutdown,
            ..Self::new()
        }
    }

    /// Hand the protocol client to the session side. Called before the
    /// session loop starts.
    pub fn install_client(&self, client: Box<dyn SessionClient>) {
        *self.client.lock() = Some(client);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Signal every blocking point to unwind, including a pending license
    /// wait.
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.license.cancel();
    }
}

impl Default for SessionBridge {
    fn default() -> Self {
        Self::new()
    }
}
