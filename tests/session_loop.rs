//! End-to-end session loop scenarios against a scripted fake client.

use parking_lot::Mutex;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jamlink::bridge::SessionBridge;
use jamlink::session::client::{
    ChatHandler, ChatNotice, LicenseHandler, SessionClient, SessionStatus, StepOutcome,
};
use jamlink::session::command::{ChatKind, Command};
use jamlink::session::event::Event;
use jamlink::session::run_loop::SessionLoop;
use jamlink::session::server_list::{
    NullServerListSource, ServerEntry, ServerListResult, ServerListSource,
};

/// Observable side of the fake client, shared with the test body.
struct FakeState {
    status: SessionStatus,
    error: Option<String>,
    position: (i32, i32),
    tempo: (f32, i32),
    users_changed: bool,
    /// Status to adopt when `connect` is called.
    status_after_connect: Option<SessionStatus>,
    /// License text offered on the next `step`.
    pending_license: Option<String>,
    /// Chat notices emitted on the next `step`.
    pending_chat: Vec<ChatNotice>,
    /// `MoreWork` responses remaining before `step` reports idle.
    busy_steps: u32,

    connects: Vec<(String, String, String)>,
    channel_infos: Vec<(i32, String, Option<i32>, Option<bool>)>,
    disconnects: usize,
    license_verdicts: Vec<bool>,
}

impl FakeState {
    fn new() -> Self {
        Self {
            status: SessionStatus::Disconnected,
            error: None,
            position: (0, 0),
            tempo: (0.0, 0),
            users_changed: false,
            status_after_connect: None,
            pending_license: None,
            pending_chat: Vec::new(),
            busy_steps: 0,
            connects: Vec::new(),
            channel_infos: Vec::new(),
            disconnects: 0,
            license_verdicts: Vec::new(),
        }
    }
}

struct FakeClient {
    state: Arc<Mutex<FakeState>>,
    chat_handler: Option<ChatHandler>,
    license_handler: Option<LicenseHandler>,
}

impl FakeClient {
    fn new() -> (Self, Arc<Mutex<FakeState>>) {
        let state = Arc::new(Mutex::new(FakeState::new()));
        (
            Self {
                state: state.clone(),
                chat_handler: None,
                license_handler: None,
            },
            state,
        )
    }
}

impl SessionClient for FakeClient {
    fn step(&mut self) -> StepOutcome {
        let notices: Vec<ChatNotice> = self.state.lock().pending_chat.drain(..).collect();
        if let Some(handler) = self.chat_handler.as_mut() {
            for notice in notices {
                handler(notice);
            }
        }

        let license = self.state.lock().pending_license.take();
        if let Some(text) = license {
            if let Some(handler) = self.license_handler.as_mut() {
                let accepted = handler(&text);
                self.state.lock().license_verdicts.push(accepted);
            }
        }

        let mut state = self.state.lock();
        if state.busy_steps > 0 {
            state.busy_steps -= 1;
            StepOutcome::MoreWork
        } else {
            StepOutcome::Idle
        }
    }

    fn status(&self) -> SessionStatus {
        self.state.lock().status
    }

    fn error_text(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    fn position(&self) -> (i32, i32) {
        self.state.lock().position
    }

    fn tempo(&self) -> (f32, i32) {
        self.state.lock().tempo
    }

    fn take_users_changed(&mut self) -> bool {
        std::mem::take(&mut self.state.lock().users_changed)
    }

    fn connect(&mut self, server: &str, username: &str, password: &str) {
        let mut state = self.state.lock();
        state
            .connects
            .push((server.to_string(), username.to_string(), password.to_string()));
        if let Some(status) = state.status_after_connect {
            state.status = status;
        }
    }

    fn disconnect(&mut self) {
        let mut state = self.state.lock();
        state.disconnects += 1;
        state.status = SessionStatus::Disconnected;
    }

    fn set_local_channel_info(
        &mut self,
        channel: i32,
        name: &str,
        bitrate: Option<i32>,
        transmit: Option<bool>,
    ) {
        self.state
            .lock()
            .channel_infos
            .push((channel, name.to_string(), bitrate, transmit));
    }

    fn set_local_channel_monitor(
        &mut self,
        _channel: i32,
        _volume: Option<f32>,
        _pan: Option<f32>,
        _mute: Option<bool>,
        _solo: Option<bool>,
    ) {
    }

    fn set_user_mute(&mut self, _user: i32, _mute: bool) {}

    fn set_user_channel_state(
        &mut self,
        _user: i32,
        _channel: i32,
        _subscribed: Option<bool>,
        _volume: Option<f32>,
        _pan: Option<f32>,
        _mute: Option<bool>,
        _solo: Option<bool>,
    ) {
    }

    fn send_chat(&mut self, _kind: ChatKind, _target: Option<&str>, _text: &str) {}

    fn set_chat_handler(&mut self, handler: ChatHandler) {
        self.chat_handler = Some(handler);
    }

    fn set_license_handler(&mut self, handler: LicenseHandler) {
        self.license_handler = Some(handler);
    }
}

fn driver_with_fake(
    bridge: &Arc<SessionBridge>,
    server_list: Box<dyn ServerListSource>,
) -> (SessionLoop, Arc<Mutex<FakeState>>) {
    let (client, state) = FakeClient::new();
    bridge.install_client(Box::new(client));
    let driver = SessionLoop::new(bridge.clone(), server_list);
    driver.install_handlers();
    (driver, state)
}

fn collect_events(bridge: &SessionBridge) -> Vec<Event> {
    let mut events = Vec::new();
    bridge.events.drain(|e| events.push(e));
    events
}

#[test]
fn connect_transition_emits_one_event_and_initializes_channel() {
    let bridge = Arc::new(SessionBridge::new());
    let (mut driver, state) = driver_with_fake(&bridge, Box::new(NullServerListSource));

    {
        let mut s = state.lock();
        s.status_after_connect = Some(SessionStatus::Connected);
        s.position = (33_075, 88_200);
        s.tempo = (120.0, 8);
    }

    assert!(bridge.commands.try_push(Command::Connect {
        server: "example.com".into(),
        username: "alice".into(),
        password: String::new(),
    }));

    let pause = driver.iterate();
    assert_eq!(pause, Duration::from_millis(20));

    {
        let s = state.lock();
        // Anonymous rewrite applied on passwordless connect.
        assert_eq!(
            s.connects,
            vec![(
                "example.com".to_string(),
                "anonymous:alice".to_string(),
                String::new()
            )]
        );
        // Default local channel configured with transmit enabled.
        assert_eq!(
            s.channel_infos,
            vec![(0, "Channel".to_string(), Some(128), Some(true))]
        );
    }

    let events = collect_events(&bridge);
    assert_eq!(events.len(), 1);
    match &events[0] {
        Event::StatusChanged { status, error } => {
            assert_eq!(*status, SessionStatus::Connected);
            assert!(error.is_none());
        }
        other => panic!("unexpected event {:?}", other),
    }

    // Timing published into the snapshot: beat = 33075 * 8 / 88200.
    assert_eq!(bridge.snapshot.bpm.load(Ordering::Relaxed), 120.0);
    assert_eq!(bridge.snapshot.bpi.load(Ordering::Relaxed), 8);
    assert_eq!(bridge.snapshot.beat_position.load(Ordering::Relaxed), 3);

    // Settings recorded under the state lock; password stays in memory only.
    let settings = bridge.settings.lock();
    assert_eq!(settings.server, "example.com");
    assert_eq!(settings.username, "alice");

    // Steady state: no duplicate transition event.
    drop(settings);
    driver.iterate();
    assert!(collect_events(&bridge).is_empty());
}

#[test]
fn error_disconnect_surfaces_as_event_without_reconnect() {
    let bridge = Arc::new(SessionBridge::new());
    let (mut driver, state) = driver_with_fake(&bridge, Box::new(NullServerListSource));

    state.lock().status_after_connect = Some(SessionStatus::Connected);
    bridge.commands.try_push(Command::Connect {
        server: "example.com".into(),
        username: "bob".into(),
        password: "hunter2".into(),
    });
    driver.iterate();
    collect_events(&bridge);

    {
        let mut s = state.lock();
        s.status = SessionStatus::Disconnected;
        s.error = Some("server closed connection".into());
    }

    let pause = driver.iterate();
    assert_eq!(pause, Duration::from_millis(50));

    let events = collect_events(&bridge);
    assert_eq!(events.len(), 1);
    match &events[0] {
        Event::StatusChanged { status, error } => {
            assert_eq!(*status, SessionStatus::Disconnected);
            assert_eq!(error.as_deref(), Some("server closed connection"));
        }
        other => panic!("unexpected event {:?}", other),
    }

    // No automatic reconnect: a fresh Connect command is required.
    driver.iterate();
    assert_eq!(state.lock().connects.len(), 1);
}

#[test]
fn password_connect_skips_anonymous_rewrite() {
    let bridge = Arc::new(SessionBridge::new());
    let (mut driver, state) = driver_with_fake(&bridge, Box::new(NullServerListSource));

    bridge.commands.try_push(Command::Connect {
        server: "private.example".into(),
        username: "carol".into(),
        password: "secret".into(),
    });
    driver.iterate();

    assert_eq!(
        state.lock().connects,
        vec![(
            "private.example".to_string(),
            "carol".to_string(),
            "secret".to_string()
        )]
    );
}

#[test]
fn users_changed_flag_becomes_event() {
    let bridge = Arc::new(SessionBridge::new());
    let (mut driver, state) = driver_with_fake(&bridge, Box::new(NullServerListSource));

    state.lock().users_changed = true;
    driver.iterate();
    let events = collect_events(&bridge);
    assert!(matches!(events.as_slice(), [Event::UsersChanged]));

    driver.iterate();
    assert!(collect_events(&bridge).is_empty());
}

#[test]
fn busy_client_cannot_delay_shutdown() {
    let bridge = Arc::new(SessionBridge::new());
    let (mut driver, state) = driver_with_fake(&bridge, Box::new(NullServerListSource));

    // Step reports more work forever; only the shutdown check inside the
    // inner loop can end the iteration.
    state.lock().busy_steps = u32::MAX;
    bridge.signal_shutdown();

    let start = Instant::now();
    driver.iterate();
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn chat_burst_fills_chat_queue_without_touching_events() {
    let bridge = Arc::new(SessionBridge::new());
    let (mut driver, state) = driver_with_fake(&bridge, Box::new(NullServerListSource));

    {
        let mut s = state.lock();
        for i in 0..300 {
            s.pending_chat.push(ChatNotice::Message {
                user: "spammer".into(),
                text: format!("line {}", i),
            });
        }
        s.users_changed = true;
    }

    driver.iterate();

    // One slot reserved: 127 lines land, the rest are dropped.
    assert_eq!(bridge.chat.len(), 127);
    assert_eq!(bridge.chat.rejected_count(), 173);

    // The burst must not evict state events.
    let events = collect_events(&bridge);
    assert!(matches!(events.as_slice(), [Event::UsersChanged]));

    let mut expect = 0;
    bridge.chat.drain(|line| {
        assert_eq!(line.text, format!("line {}", expect));
        expect += 1;
    });
    assert_eq!(expect, 127);
}

#[test]
fn license_prompt_accept_round_trip() {
    let bridge = Arc::new(SessionBridge::new());
    let (driver, state) = driver_with_fake(&bridge, Box::new(NullServerListSource));
    state.lock().pending_license = Some("AGREEMENT v2".into());

    let session = std::thread::Builder::new()
        .name("test-session".into())
        .spawn(move || driver.run())
        .unwrap();

    // UI side: wait for the prompt, check the text, accept.
    let deadline = Instant::now() + Duration::from_secs(10);
    while !bridge.license.is_pending() {
        assert!(Instant::now() < deadline, "license prompt never arrived");
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(bridge.license.pending_text().as_deref(), Some("AGREEMENT v2"));
    bridge.license.respond(true);

    let deadline = Instant::now() + Duration::from_secs(10);
    while state.lock().license_verdicts.is_empty() {
        assert!(Instant::now() < deadline, "verdict never recorded");
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(state.lock().license_verdicts, vec![true]);

    bridge.signal_shutdown();
    session.join().unwrap();
}

#[test]
fn shutdown_rejects_pending_license_immediately() {
    // Default 60 s deadline: only the shutdown wake can finish this fast.
    let bridge = Arc::new(SessionBridge::new());
    let (driver, state) = driver_with_fake(&bridge, Box::new(NullServerListSource));
    state.lock().pending_license = Some("AGREEMENT".into());

    let session = std::thread::Builder::new()
        .name("test-session".into())
        .spawn(move || driver.run())
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while !bridge.license.is_pending() {
        assert!(Instant::now() < deadline, "license prompt never arrived");
        std::thread::sleep(Duration::from_millis(1));
    }

    let start = Instant::now();
    bridge.signal_shutdown();
    session.join().unwrap();
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(state.lock().license_verdicts, vec![false]);
}

/// Server-list source that completes one request per poll.
struct InstantServerList {
    requested: Vec<String>,
    ready: Option<ServerListResult>,
}

impl ServerListSource for InstantServerList {
    fn request(&mut self, url: &str) {
        self.requested.push(url.to_string());
        self.ready = Some(ServerListResult {
            servers: vec![ServerEntry {
                name: "Test Jam".into(),
                host: "jam.example".into(),
                port: 2049,
                users: 3,
                max_users: 8,
                ..ServerEntry::default()
            }],
            error: None,
        });
    }

    fn poll(&mut self) -> Option<ServerListResult> {
        self.ready.take()
    }
}

#[test]
fn server_list_request_round_trip() {
    let bridge = Arc::new(SessionBridge::new());
    let source = InstantServerList {
        requested: Vec::new(),
        ready: None,
    };
    let (mut driver, _state) = driver_with_fake(&bridge, Box::new(source));

    bridge.commands.try_push(Command::RequestServerList {
        url: "http://lists.example/servers".into(),
    });
    driver.iterate();

    let events = collect_events(&bridge);
    assert_eq!(events.len(), 1);
    match &events[0] {
        Event::ServerListReady { servers, error } => {
            assert!(error.is_none());
            assert_eq!(servers.len(), 1);
            assert_eq!(servers[0].address(), "jam.example:2049");
        }
        other => panic!("unexpected event {:?}", other),
    }
}
