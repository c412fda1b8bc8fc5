//! Session-protocol client interface
//!
//! The wire protocol, codec, and peer bookkeeping live behind this trait;
//! the core only needs a polling step, a status code, and a handful of
//! accessors and mutators. All methods except the host audio entry point
//! are called by the session thread under the serialization lock.

use crate::session::command::ChatKind;

/// Connection status reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// Result of one protocol step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// More immediate work is queued; step again before sleeping.
    MoreWork,
    /// Nothing to do until new data arrives.
    Idle,
}

/// A chat-layer notification delivered from inside [`SessionClient::step`].
#[derive(Debug, Clone)]
pub enum ChatNotice {
    /// Topic broadcast. `user` is empty when the server set the topic.
    Topic { user: String, text: String },
    Message { user: String, text: String },
    Private { user: String, text: String },
    Join { user: String },
    Part { user: String },
}

/// Installed by the session loop; invoked on the session thread during
/// [`SessionClient::step`].
pub type ChatHandler = Box<dyn FnMut(ChatNotice) + Send>;

/// License prompt callback: receives the agreement text, returns whether
/// the user accepted. Invoked synchronously from within
/// [`SessionClient::step`] and may block for a human-timescale wait.
pub type LicenseHandler = Box<dyn FnMut(&str) -> bool + Send>;

/// Polling interface to the session-protocol implementation.
pub trait SessionClient: Send {
    /// Run one slice of protocol work. Chat and license handlers fire from
    /// inside this call.
    fn step(&mut self) -> StepOutcome;

    fn status(&self) -> SessionStatus;

    /// Human-readable error from the last failure, if any.
    fn error_text(&self) -> Option<String>;

    /// Current interval position and length, in protocol units.
    fn position(&self) -> (i32, i32);

    /// Current tempo as (beats per minute, beats per interval).
    fn tempo(&self) -> (f32, i32);

    /// True once after the user/channel lists changed.
    fn take_users_changed(&mut self) -> bool;

    fn connect(&mut self, server: &str, username: &str, password: &str);
    fn disconnect(&mut self);

    fn set_local_channel_info(
        &mut self,
        channel: i32,
        name: &str,
        bitrate: Option<i32>,
        transmit: Option<bool>,
    );

    fn set_local_channel_monitor(
        &mut self,
        channel: i32,
        volume: Option<f32>,
        pan: Option<f32>,
        mute: Option<bool>,
        solo: Option<bool>,
    );

    fn set_user_mute(&mut self, user: i32, mute: bool);

    #[allow(clippy::too_many_arguments)]
    fn set_user_channel_state(
        &mut self,
        user: i32,
        channel: i32,
        subscribed: Option<bool>,
        volume: Option<f32>,
        pan: Option<f32>,
        mute: Option<bool>,
        solo: Option<bool>,
    );

    fn send_chat(&mut self, kind: ChatKind, target: Option<&str>, text: &str);

    fn set_chat_handler(&mut self, handler: ChatHandler);
    fn set_license_handler(&mut self, handler: LicenseHandler);
}
