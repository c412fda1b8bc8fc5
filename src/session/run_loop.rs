//! Session thread driver
//!
//! Owns the network side of the bridge: drains UI commands, steps the
//! protocol client under the serialization lock, turns status transitions
//! and chat callbacks into events, publishes timing into the snapshot, and
//! sleeps adaptively. Protocol errors never cross the thread boundary as
//! panics; they are converted to event payloads.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::bridge::SessionBridge;
use crate::constants::{SESSION_SLEEP_CONNECTED, SESSION_SLEEP_DISCONNECTED};
use crate::session::client::{ChatNotice, SessionClient, SessionStatus, StepOutcome};
use crate::session::command::Command;
use crate::session::event::{ChatLine, ChatLineKind, Event};
use crate::session::server_list::ServerListSource;

/// Sleep between iterations: slow poll while disconnected to bound idle
/// CPU, fast poll otherwise to keep the connected UX responsive.
pub fn sleep_duration_for(status: SessionStatus) -> Duration {
    match status {
        SessionStatus::Disconnected => SESSION_SLEEP_DISCONNECTED,
        SessionStatus::Connecting | SessionStatus::Connected => SESSION_SLEEP_CONNECTED,
    }
}

/// Anonymous-login rewrite required by the server for passwordless
/// connects.
pub fn effective_username(username: &str, password: &str) -> String {
    if password.is_empty() && !username.starts_with("anonymous") {
        format!("anonymous:{}", username)
    } else {
        username.to_string()
    }
}

/// The session-thread state machine.
pub struct SessionLoop {
    bridge: Arc<SessionBridge>,
    server_list: Box<dyn ServerListSource>,
    last_status: SessionStatus,
    /// Commands drained this iteration that target the client.
    pending: Vec<Command>,
}

impl SessionLoop {
    pub fn new(bridge: Arc<SessionBridge>, server_list: Box<dyn ServerListSource>) -> Self {
        Self {
            bridge,
            server_list,
            last_status: SessionStatus::Disconnected,
            pending: Vec::new(),
        }
    }

    /// Spawn the named session thread. The loop exits when the bridge's
    /// shutdown flag is raised.
    pub fn spawn(
        bridge: Arc<SessionBridge>,
        server_list: Box<dyn ServerListSource>,
    ) -> std::io::Result<JoinHandle<()>> {
        let driver = SessionLoop::new(bridge, server_list);
        thread::Builder::new()
            .name("jamlink-session".to_string())
            .spawn(move || driver.run())
    }

    pub fn run(mut self) {
        tracing::info!("session loop started");
        self.install_handlers();
        while !self.bridge.is_shutting_down() {
            let pause = self.iterate();
            thread::sleep(pause);
        }
        tracing::info!("session loop stopped");
    }

    /// Install the chat and license callbacks on the client. Both fire on
    /// this thread from inside `step()`.
    pub fn install_handlers(&self) {
        let mut guard = self.bridge.client.lock();
        let Some(client) = guard.as_deref_mut() else {
            return;
        };

        let chat_bridge = self.bridge.clone();
        client.set_chat_handler(Box::new(move |notice| {
            handle_chat_notice(&chat_bridge, notice);
        }));

        let license_bridge = self.bridge.clone();
        client.set_license_handler(Box::new(move |text| license_bridge.license.offer(text)));
    }

    /// One full pass: drain commands, step the client, publish events and
    /// snapshot updates, poll the server list. Returns the adaptive sleep
    /// for the current status.
    pub fn iterate(&mut self) -> Duration {
        self.drain_commands();

        let mut guard = self.bridge.client.lock();
        let Some(client) = guard.as_deref_mut() else {
            drop(guard);
            self.pending.clear();
            self.poll_server_list();
            return SESSION_SLEEP_DISCONNECTED;
        };

        execute_commands(client, &mut self.pending);

        // Step until the client reports no more immediate work; a busy
        // stretch must not delay shutdown.
        while client.step() == StepOutcome::MoreWork {
            if self.bridge.is_shutting_down() {
                return SESSION_SLEEP_DISCONNECTED;
            }
        }

        let status = client.status();
        let status_changed = status != self.last_status;
        let mut error = None;
        if status_changed {
            error = client.error_text();
            tracing::info!(from = ?self.last_status, to = ?status, "status changed");
            if let Some(msg) = &error {
                tracing::warn!(error = %msg, "session error");
            }

            if status == SessionStatus::Connected {
                // Fresh connection: configure local channel 0 with the
                // configured name and bitrate, transmit enabled.
                let (name, bitrate) = {
                    let settings = self.bridge.settings.lock();
                    (settings.local_channel_name.clone(), settings.local_bitrate)
                };
                tracing::info!(channel = %name, bitrate, "initializing local channel");
                client.set_local_channel_info(0, &name, Some(bitrate), Some(true));
            }
        }

        let timing = if status == SessionStatus::Connected {
            let (position, length) = client.position();
            let (bpm, bpi) = client.tempo();
            let beat = if length > 0 && bpi > 0 {
                ((position as i64 * bpi as i64) / length as i64) as i32
            } else {
                0
            };
            Some((bpm, bpi, position, length, beat))
        } else {
            None
        };

        let users_changed = client.take_users_changed();
        drop(guard);

        // Snapshot and events are published outside the serialization lock.
        if let Some((bpm, bpi, position, length, beat)) = timing {
            self.bridge
                .snapshot
                .publish_timing(bpm, bpi, position, length, beat);
        }

        if status_changed {
            self.last_status = status;
            push_event(&self.bridge, Event::StatusChanged { status, error });
        }

        if users_changed {
            push_event(&self.bridge, Event::UsersChanged);
        }

        self.poll_server_list();

        sleep_duration_for(status)
    }

    /// Drain the command queue fully. Server-list requests go straight to
    /// the fetcher; connect credentials are recorded under the state lock;
    /// everything else waits for the serialization lock.
    fn drain_commands(&mut self) {
        let bridge = &self.bridge;
        let server_list = &mut self.server_list;
        let pending = &mut self.pending;

        bridge.commands.drain(|command| match command {
            Command::RequestServerList { url } => server_list.request(&url),
            Command::Connect {
                server,
                username,
                password,
            } => {
                {
                    let mut settings = bridge.settings.lock();
                    settings.server = server.clone();
                    settings.username = username.clone();
                    settings.password = password.clone();
                }
                pending.push(Command::Connect {
                    server,
                    username,
                    password,
                });
            }
            other => pending.push(other),
        });
    }

    fn poll_server_list(&mut self) {
        if let Some(result) = self.server_list.poll() {
            tracing::debug!(
                servers = result.servers.len(),
                error = result.error.is_some(),
                "server list ready"
            );
            push_event(
                &self.bridge,
                Event::ServerListReady {
                    servers: result.servers,
                    error: result.error,
                },
            );
        }
    }
}

fn push_event(bridge: &SessionBridge, event: Event) {
    if !bridge.events.try_push(event) {
        tracing::warn!("event queue full, dropping event");
    }
}

fn push_chat(bridge: &SessionBridge, line: ChatLine) {
    if !bridge.chat.try_push(line) {
        tracing::debug!("chat queue full, dropping line");
    }
}

/// Execute drained commands against the client under the serialization
/// lock. Exhaustive over the command set.
fn execute_commands(client: &mut dyn SessionClient, commands: &mut Vec<Command>) {
    for command in commands.drain(..) {
        match command {
            Command::Connect {
                server,
                username,
                password,
            } => {
                let user = effective_username(&username, &password);
                // Password is deliberately not logged.
                tracing::info!(server = %server, user = %user, "connecting");
                client.connect(&server, &user, &password);
            }
            Command::Disconnect => {
                tracing::info!("disconnecting");
                client.disconnect();
            }
            Command::SetLocalChannelInfo {
                channel,
                name,
                bitrate,
                transmit,
            } => client.set_local_channel_info(channel, &name, bitrate, transmit),
            Command::SetLocalChannelMonitor {
                channel,
                volume,
                pan,
                mute,
                solo,
            } => client.set_local_channel_monitor(channel, volume, pan, mute, solo),
            Command::SetUserMute { user, mute } => client.set_user_mute(user, mute),
            Command::SetUserChannelState {
                user,
                channel,
                subscribed,
                volume,
                pan,
                mute,
                solo,
            } => client.set_user_channel_state(user, channel, subscribed, volume, pan, mute, solo),
            Command::SendChat { kind, target, text } => {
                if !text.is_empty() {
                    client.send_chat(kind, target.as_deref(), &text);
                }
            }
            // Routed to the fetcher during the drain pass.
            Command::RequestServerList { .. } => {}
        }
    }
}

/// Translate a protocol chat notice into chat lines and events.
pub(crate) fn handle_chat_notice(bridge: &SessionBridge, notice: ChatNotice) {
    match notice {
        ChatNotice::Topic { user, text } => {
            let line = if !user.is_empty() {
                if !text.is_empty() {
                    format!("{} sets topic to: {}", user, text)
                } else {
                    format!("{} removes topic.", user)
                }
            } else if !text.is_empty() {
                format!("Topic is: {}", text)
            } else {
                "No topic is set.".to_string()
            };
            push_chat(
                bridge,
                ChatLine {
                    kind: ChatLineKind::Topic,
                    sender: user,
                    text: line,
                },
            );
            push_event(bridge, Event::TopicChanged { topic: text });
        }
        ChatNotice::Message { user, text } => {
            if user.is_empty() || text.is_empty() {
                return;
            }
            let line = if let Some(action) = text.strip_prefix("/me ") {
                ChatLine {
                    kind: ChatLineKind::Action,
                    sender: user,
                    text: action.trim_start().to_string(),
                }
            } else {
                ChatLine {
                    kind: ChatLineKind::Message,
                    sender: user,
                    text,
                }
            };
            push_chat(bridge, line);
        }
        ChatNotice::Private { user, text } => {
            if user.is_empty() || text.is_empty() {
                return;
            }
            push_chat(
                bridge,
                ChatLine {
                    kind: ChatLineKind::Private,
                    sender: user,
                    text,
                },
            );
        }
        ChatNotice::Join { user } => {
            if user.is_empty() {
                return;
            }
            let text = format!("{} has joined the server", user);
            push_chat(
                bridge,
                ChatLine {
                    kind: ChatLineKind::Join,
                    sender: user,
                    text,
                },
            );
        }
        ChatNotice::Part { user } => {
            if user.is_empty() {
                return;
            }
            let text = format!("{} has left the server", user);
            push_chat(
                bridge,
                ChatLine {
                    kind: ChatLineKind::Part,
                    sender: user,
                    text,
                },
            );
        }
    }
}
