//! Mock soundbar for development and testing without hardware.
//!
//! `MockSoundbar` plays both collaborators a session needs: it resolves its
//! own address and hands out links that behave like the real unit. It sends
//! the empty startup notification on subscribe, answers a status request
//! with a 14-byte status frame, and echoes every command back while
//! updating its own state.
//!
//! Faults can be injected: refused connects, a link that drops on the
//! command write or right after it, a unit that never reports status, a
//! failing disconnect, and junk frames ahead of the status report.
//!
//! Every call is logged at INFO level:
//!
//!   RUST_LOG=barlink_lib=info cargo test

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{
    DriverError, DriverResult, InputSource, LedLevel, PeripheralHandle, Power, SoundMode,
};
use crate::ports::{Link, LinkProvider, NotificationSink, PeripheralResolver};
use crate::protocol::catalog::{
    keys, KEY_PREFIX, OP_QUERY, OP_REMOTE_KEY, OP_SETTING, QUERY_STATUS, SETTING_LED,
};
use crate::protocol::status::render_status;
use crate::protocol::{frame, hex, Channel, Notification, MARKER_1, MARKER_2};
use crate::state::StatusFields;

const MAX_VOLUME: u8 = 50;
const MAX_SUBWOOFER: u8 = 32;

/// Link-level calls, in the order the mock saw them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOp {
    ReleaseStale,
    Connect,
    Subscribe(Channel),
    Write(Channel, Vec<u8>),
    Disconnect,
}

#[derive(Debug, Default)]
struct MockState {
    status: StatusFields,
    ops: Vec<LinkOp>,
    connect_attempts: u32,
    refuse_connects: u32,
    drop_on_command: u32,
    close_after_command: bool,
    silent: bool,
    failing_disconnect: bool,
    noise: Vec<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct MockSoundbar {
    address: String,
    inner: Arc<Mutex<MockState>>,
}

impl MockSoundbar {
    pub fn new(address: &str) -> Self {
        log::info!("[MOCK SOUNDBAR] Initialized at {address}");
        Self {
            address: address.to_string(),
            inner: Arc::new(Mutex::new(MockState::default())),
        }
    }

    pub fn with_status(self, status: StatusFields) -> Self {
        self.lock().status = status;
        self
    }

    /// Frames pushed ahead of every status report.
    pub fn with_noise(self, frames: Vec<Vec<u8>>) -> Self {
        self.lock().noise = frames;
        self
    }

    /// Refuse the next `count` connects with an ESP proxy style error.
    pub fn refuse_connects(self, count: u32) -> Self {
        self.lock().refuse_connects = count;
        self
    }

    pub fn refuse_all_connects(self) -> Self {
        self.refuse_connects(u32::MAX)
    }

    /// Drop the link on the next `count` command writes.
    pub fn drop_link_on_command(self, count: u32) -> Self {
        self.lock().drop_on_command = count;
        self
    }

    /// Accept and echo command writes, then close the notification stream.
    pub fn close_after_command(self) -> Self {
        self.lock().close_after_command = true;
        self
    }

    /// Never answer a status request.
    pub fn silent(self) -> Self {
        self.lock().silent = true;
        self
    }

    pub fn failing_disconnect(self) -> Self {
        self.lock().failing_disconnect = true;
        self
    }

    pub fn status(&self) -> StatusFields {
        self.lock().status
    }

    pub fn ops(&self) -> Vec<LinkOp> {
        self.lock().ops.clone()
    }

    /// Every frame written, including writes that failed.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                LinkOp::Write(_, bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn connect_attempts(&self) -> u32 {
        self.lock().connect_attempts
    }

    pub fn stale_releases(&self) -> usize {
        self.count_ops(|op| matches!(op, LinkOp::ReleaseStale))
    }

    pub fn disconnects(&self) -> usize {
        self.count_ops(|op| matches!(op, LinkOp::Disconnect))
    }

    fn count_ops(&self, predicate: impl Fn(&LinkOp) -> bool) -> usize {
        self.lock().ops.iter().filter(|op| predicate(op)).count()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        lock_mock(&self.inner)
    }
}

fn lock_mock(inner: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl PeripheralResolver for MockSoundbar {
    async fn resolve_address(&self, address: &str) -> Option<PeripheralHandle> {
        if address.eq_ignore_ascii_case(&self.address) {
            Some(PeripheralHandle {
                address: self.address.clone(),
                name: Some("Mock Soundbar".to_string()),
            })
        } else {
            log::info!("[MOCK SOUNDBAR] RESOLVE {address} → not found");
            None
        }
    }
}

#[async_trait]
impl LinkProvider for MockSoundbar {
    async fn release_stale(&self, _peripheral: &PeripheralHandle) -> DriverResult<()> {
        self.lock().ops.push(LinkOp::ReleaseStale);
        Ok(())
    }

    async fn connect(&self, peripheral: &PeripheralHandle) -> DriverResult<Box<dyn Link>> {
        let mut state = self.lock();
        state.ops.push(LinkOp::Connect);
        state.connect_attempts += 1;
        if state.refuse_connects > 0 {
            if state.refuse_connects != u32::MAX {
                state.refuse_connects -= 1;
            }
            log::info!("[MOCK SOUNDBAR] CONNECT {} → refused", peripheral.address);
            return Err(DriverError::from_transport_message(
                "Error ESP_GATT_CONN_FAIL_ESTABLISH while connecting",
            ));
        }
        log::info!("[MOCK SOUNDBAR] CONNECT {} → ok", peripheral.address);
        Ok(Box::new(MockLink {
            inner: Arc::clone(&self.inner),
            sink: None,
        }))
    }
}

struct MockLink {
    inner: Arc<Mutex<MockState>>,
    sink: Option<NotificationSink>,
}

impl MockLink {
    fn notify(&self, value: Vec<u8>) {
        if let Some(sink) = &self.sink {
            let _ = sink.send(Notification::new(value));
        }
    }
}

#[async_trait]
impl Link for MockLink {
    async fn subscribe(&mut self, channel: Channel, sink: NotificationSink) -> DriverResult<()> {
        lock_mock(&self.inner).ops.push(LinkOp::Subscribe(channel));
        log::info!("[MOCK SOUNDBAR] SUBSCRIBE {}", channel.uuid());
        self.sink = Some(sink);
        self.notify(Vec::new());
        Ok(())
    }

    async fn write(&mut self, channel: Channel, frame_bytes: &[u8]) -> DriverResult<()> {
        log::info!("[MOCK SOUNDBAR] WRITE {}", hex(frame_bytes));
        let commands = {
            let mut state = lock_mock(&self.inner);
            state.ops.push(LinkOp::Write(channel, frame_bytes.to_vec()));
            split_commands(frame_bytes)
        };

        let is_request = commands == [vec![OP_QUERY, QUERY_STATUS]];
        if is_request {
            let (silent, noise, status) = {
                let state = lock_mock(&self.inner);
                (state.silent, state.noise.clone(), state.status)
            };
            if !silent {
                for junk in noise {
                    self.notify(junk);
                }
                self.notify(frame(&render_status(&status))?);
            }
            return Ok(());
        }

        {
            let mut state = lock_mock(&self.inner);
            if state.drop_on_command > 0 {
                state.drop_on_command -= 1;
                drop(state);
                self.sink = None;
                return Err(DriverError::from_transport_message("Disconnected during write"));
            }
            for command in &commands {
                apply_command(&mut state.status, command);
            }
        }
        for command in commands {
            self.notify(frame(&command)?);
        }
        if lock_mock(&self.inner).close_after_command {
            log::info!("[MOCK SOUNDBAR] closing notification stream");
            self.sink = None;
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> DriverResult<()> {
        self.sink = None;
        let failing = {
            let mut state = lock_mock(&self.inner);
            state.ops.push(LinkOp::Disconnect);
            state.failing_disconnect
        };
        log::info!("[MOCK SOUNDBAR] DISCONNECT");
        if failing {
            return Err(DriverError::Transport("Disconnect failed: not connected".into()));
        }
        Ok(())
    }
}

/// Split a frame's payload into commands (opcode + arguments).
/// Anything that is not a recognizable frame yields no commands.
fn split_commands(frame_bytes: &[u8]) -> Vec<Vec<u8>> {
    if frame_bytes.len() < 4 || frame_bytes[0] != MARKER_1 || frame_bytes[1] != MARKER_2 {
        return Vec::new();
    }
    let mut payload = &frame_bytes[3..frame_bytes.len() - 1];
    let mut commands = Vec::new();
    while let Some(&opcode) = payload.first() {
        let arity = match opcode {
            OP_QUERY => 1,
            OP_REMOTE_KEY | OP_SETTING => 2,
            _ => break,
        };
        if payload.len() < 1 + arity {
            break;
        }
        let (command, rest) = payload.split_at(1 + arity);
        commands.push(command.to_vec());
        payload = rest;
    }
    commands
}

fn apply_command(status: &mut StatusFields, command: &[u8]) {
    match command {
        [OP_REMOTE_KEY, KEY_PREFIX, key] => apply_key(status, *key),
        [OP_SETTING, SETTING_LED, level] => status.led = LedLevel::from_code(*level),
        _ => log::info!("[MOCK SOUNDBAR] ignoring {}", hex(command)),
    }
}

fn apply_key(status: &mut StatusFields, key: u8) {
    match key {
        keys::POWER_ON => status.power = Power::On,
        keys::POWER_OFF => status.power = Power::Off,
        keys::VOLUME_UP => status.volume = status.volume.saturating_add(1).min(MAX_VOLUME),
        keys::VOLUME_DOWN => status.volume = status.volume.saturating_sub(1),
        keys::MUTE_ON => status.muted = true,
        keys::MUTE_OFF => status.muted = false,
        keys::INPUT_HDMI => status.input = InputSource::Hdmi,
        keys::INPUT_ANALOG => status.input = InputSource::Analog,
        keys::INPUT_BLUETOOTH => status.input = InputSource::Bluetooth,
        keys::INPUT_TV => status.input = InputSource::Tv,
        keys::SUBWOOFER_UP => {
            status.subwoofer = status.subwoofer.saturating_add(1).min(MAX_SUBWOOFER)
        }
        keys::SUBWOOFER_DOWN => status.subwoofer = status.subwoofer.saturating_sub(1),
        keys::BASS_EXTENSION_ON => status.bass_extension = true,
        keys::BASS_EXTENSION_OFF => status.bass_extension = false,
        keys::CLEAR_VOICE_ON => status.clear_voice = true,
        keys::CLEAR_VOICE_OFF => status.clear_voice = false,
        keys::SURROUND_STANDARD => status.sound_mode = SoundMode::Standard,
        keys::SURROUND_STEREO => status.sound_mode = SoundMode::Stereo,
        keys::SURROUND_MOVIE => status.sound_mode = SoundMode::Movie,
        keys::SURROUND_GAME => status.sound_mode = SoundMode::Game,
        keys::SURROUND_MUSIC => status.sound_mode = SoundMode::Music,
        keys::SURROUND_TV => status.sound_mode = SoundMode::Tv,
        keys::SURROUND_3D => status.sound_mode = SoundMode::ThreeD,
        other => log::info!("[MOCK SOUNDBAR] unknown key 0x{other:02x}"),
    }
}
