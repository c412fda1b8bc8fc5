//! Session protocol driving and UI messaging

pub mod client;
pub mod command;
pub mod event;
pub mod run_loop;
pub mod server_list;

pub use client::{ChatNotice, SessionClient, SessionStatus, StepOutcome};
pub use command::{ChatKind, Command};
pub use event::{ChatLine, ChatLineKind, Event};
pub use run_loop::SessionLoop;
pub use server_list::{NullServerListSource, ServerEntry, ServerListResult, ServerListSource};
