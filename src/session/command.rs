//! Commands sent from the UI thread to the session thread
//!
//! Commands are created on user action, pushed onto the command queue, and
//! consumed exactly once by the session loop. They are move-only data; a
//! command that does not fit in the queue is dropped and the user action is
//! reported as rejected, never retried automatically.

/// Chat message kind for outgoing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    /// Public message to the whole server.
    Message,
    /// Private message to a single user.
    Private,
    /// Topic change request.
    Topic,
}

impl ChatKind {
    /// Protocol keyword for this kind.
    pub fn as_protocol_str(self) -> &'static str {
        match self {
            ChatKind::Message => "MSG",
            ChatKind::Private => "PRIVMSG",
            ChatKind::Topic => "TOPIC",
        }
    }
}

/// UI-to-session command set.
///
/// Every consumption site matches exhaustively, so adding a variant is a
/// compile-checked obligation.
#[derive(Debug, Clone)]
pub enum Command {
    Connect {
        server: String,
        username: String,
        /// Kept in memory only; never logged, never persisted.
        password: String,
    },
    Disconnect,
    SetLocalChannelInfo {
        channel: i32,
        name: String,
        bitrate: Option<i32>,
        transmit: Option<bool>,
    },
    SetLocalChannelMonitor {
        channel: i32,
        volume: Option<f32>,
        pan: Option<f32>,
        mute: Option<bool>,
        solo: Option<bool>,
    },
    SetUserMute {
        user: i32,
        mute: bool,
    },
    SetUserChannelState {
        user: i32,
        channel: i32,
        subscribed: Option<bool>,
        volume: Option<f32>,
        pan: Option<f32>,
        mute: Option<bool>,
        solo: Option<bool>,
    },
    RequestServerList {
        url: String,
    },
    SendChat {
        kind: ChatKind,
        /// Recipient for private messages.
        target: Option<String>,
        text: String,
    },
}
