//! Events sent from the session thread to the UI thread
//!
//! State-change events and chat lines ride two separate queues so a chat
//! burst can never evict a status transition. Both directions share the
//! same ownership rule as commands: produced once, consumed once, never
//! mutated in flight.

use crate::session::client::SessionStatus;
use crate::session::server_list::ServerEntry;

/// Session-to-UI event set.
#[derive(Debug, Clone)]
pub enum Event {
    /// Connection status transition. The error text comes from the
    /// protocol client and is display-only.
    StatusChanged {
        status: SessionStatus,
        error: Option<String>,
    },
    /// User or channel lists changed; the UI should re-query them.
    UsersChanged,
    TopicChanged {
        topic: String,
    },
    /// A public-server-list fetch completed.
    ServerListReady {
        servers: Vec<ServerEntry>,
        error: Option<String>,
    },
}

/// Kind of a rendered chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatLineKind {
    Message,
    /// `/me` action message.
    Action,
    Private,
    Topic,
    Join,
    Part,
}

/// One line for the chat log, carried on the dedicated chat queue.
#[derive(Debug, Clone)]
pub struct ChatLine {
    pub kind: ChatLineKind,
    /// Empty for server-originated lines.
    pub sender: String,
    pub text: String,
}
