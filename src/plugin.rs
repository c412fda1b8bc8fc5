//! Plugin shell
//!
//! Ties the pieces together the way a host sees them: one instance owning
//! the shared bridge, a session thread started on activate and joined on
//! deactivate, an [`AudioProcessor`] for the audio callback, and a
//! [`UiHandle`] for the render thread.

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::audio::AudioProcessor;
use crate::bridge::SessionBridge;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::client::SessionClient;
use crate::session::command::Command;
use crate::session::event::{ChatLine, Event};
use crate::session::run_loop::SessionLoop;
use crate::session::server_list::ServerListSource;
use crate::sync::AtomicSnapshot;
use std::sync::atomic::Ordering;

/// One plugin instance.
pub struct JamLinkPlugin {
    bridge: Arc<SessionBridge>,
    session_thread: Option<JoinHandle<()>>,
    sample_rate: f64,
    serialize_audio: bool,
}

impl JamLinkPlugin {
    pub fn new(config: &Config) -> Self {
        let bridge = Arc::new(SessionBridge::new());
        {
            let mut settings = bridge.settings.lock();
            settings.server = config.server.clone();
            settings.username = config.username.clone();
            settings.local_channel_name = config.local_channel_name.clone();
            settings.local_bitrate = config.local_bitrate;
        }
        bridge
            .snapshot
            .transient_threshold
            .store(config.transient_threshold, Ordering::Relaxed);

        Self {
            bridge,
            session_thread: None,
            sample_rate: 48_000.0,
            serialize_audio: config.serialize_audio,
        }
    }

    pub fn bridge(&self) -> &Arc<SessionBridge> {
        &self.bridge
    }

    /// Start the session thread. Called when the host adds the plugin to
    /// the audio graph.
    pub fn activate(
        &mut self,
        sample_rate: f64,
        client: Box<dyn SessionClient>,
        server_list: Box<dyn ServerListSource>,
    ) -> Result<()> {
        if self.session_thread.is_some() {
            tracing::warn!("activate called while already active");
            return Ok(());
        }

        self.sample_rate = sample_rate;
        self.bridge.shutdown.store(false, Ordering::Release);
        self.bridge.install_client(client);

        let handle = SessionLoop::spawn(self.bridge.clone(), server_list)?;
        self.session_thread = Some(handle);
        tracing::info!(sample_rate, "plugin activated");
        Ok(())
    }

    /// Stop the session thread and join it. Safe to call with a license
    /// prompt outstanding: the shutdown signal force-rejects it.
    pub fn deactivate(&mut self) {
        self.bridge.signal_shutdown();
        if let Some(handle) = self.session_thread.take() {
            if handle.join().is_err() {
                tracing::error!("session thread panicked");
            }
        }
        *self.bridge.client.lock() = None;
        tracing::info!("plugin deactivated");
    }

    /// Processor for the host audio callback. Fresh tracker state per
    /// activation.
    pub fn audio_processor(&self) -> AudioProcessor {
        let mut processor = AudioProcessor::new(self.bridge.clone(), self.sample_rate);
        processor.set_diagnostic_serialization(self.serialize_audio);
        processor
    }

    /// Handle for the UI thread. One per instance; the command queue is
    /// single-producer.
    pub fn ui(&self) -> UiHandle {
        UiHandle {
            bridge: self.bridge.clone(),
        }
    }
}

impl Drop for JamLinkPlugin {
    fn drop(&mut self) {
        if self.session_thread.is_some() {
            self.deactivate();
        }
    }
}

/// UI-thread surface: push commands, drain events and chat, read the
/// snapshot, answer license prompts.
///
/// Not `Clone`: the underlying queues are single-producer and
/// single-consumer, so exactly one UI thread may hold this.
pub struct UiHandle {
    bridge: Arc<SessionBridge>,
}

impl UiHandle {
    /// Queue a command for the session thread. `Err(QueueFull)` is
    /// transient: the action was dropped, not failed permanently.
    pub fn send(&self, command: Command) -> Result<()> {
        if self.bridge.commands.try_push(command) {
            Ok(())
        } else {
            Err(Error::QueueFull)
        }
    }

    pub fn drain_events<F: FnMut(Event)>(&self, visitor: F) -> usize {
        self.bridge.events.drain(visitor)
    }

    pub fn drain_chat<F: FnMut(ChatLine)>(&self, visitor: F) -> usize {
        self.bridge.chat.drain(visitor)
    }

    pub fn snapshot(&self) -> &AtomicSnapshot {
        &self.bridge.snapshot
    }

    /// License text awaiting an answer, if any.
    pub fn license_prompt(&self) -> Option<String> {
        self.bridge.license.pending_text()
    }

    /// Answer the pending license prompt. Call exactly once per prompt.
    pub fn respond_license(&self, accept: bool) {
        self.bridge.license.respond(accept);
    }

    /// Update the transient detector sensitivity (audio thread reads it).
    pub fn set_transient_threshold(&self, threshold: f32) {
        self.bridge
            .snapshot
            .transient_threshold
            .store(threshold, Ordering::Relaxed);
    }
}
