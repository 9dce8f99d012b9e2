//! Command catalog: symbolic name → opcode and arguments.
//!
//! Most commands are fixed byte sequences. Toggles look at the last known
//! state and pick the explicit on/off key, so repeating a toggle against a
//! stale view cannot flip the soundbar the wrong way twice.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::domain::{DriverError, DriverResult, LedLevel, Power};
use crate::state::DeviceState;

use super::Command;

/// Status query family
pub const OP_QUERY: u8 = 0x03;
/// Remote key family, argument bytes are `[KEY_PREFIX, key]`
pub const OP_REMOTE_KEY: u8 = 0x40;
/// Settings family, argument bytes are `[setting, value]`
pub const OP_SETTING: u8 = 0x48;

pub const QUERY_STATUS: u8 = 0x05;
pub const KEY_PREFIX: u8 = 0x78;
pub const SETTING_LED: u8 = 0x0A;

/// Remote key codes
pub mod keys {
    pub const POWER_ON: u8 = 0x7E;
    pub const POWER_OFF: u8 = 0x7F;
    pub const VOLUME_UP: u8 = 0x1E;
    pub const VOLUME_DOWN: u8 = 0x1F;
    pub const MUTE_ON: u8 = 0xC7;
    pub const MUTE_OFF: u8 = 0xC8;
    pub const INPUT_HDMI: u8 = 0x4A;
    pub const INPUT_ANALOG: u8 = 0xD1;
    pub const INPUT_BLUETOOTH: u8 = 0x29;
    pub const INPUT_TV: u8 = 0xDF;
    pub const SUBWOOFER_UP: u8 = 0x4C;
    pub const SUBWOOFER_DOWN: u8 = 0x4D;
    pub const BASS_EXTENSION_ON: u8 = 0x6E;
    pub const BASS_EXTENSION_OFF: u8 = 0x6F;
    pub const CLEAR_VOICE_ON: u8 = 0x5C;
    pub const CLEAR_VOICE_OFF: u8 = 0x5D;
    pub const SURROUND_STANDARD: u8 = 0xD3;
    pub const SURROUND_STEREO: u8 = 0x50;
    pub const SURROUND_MOVIE: u8 = 0xD9;
    pub const SURROUND_GAME: u8 = 0xDC;
    pub const SURROUND_MUSIC: u8 = 0xDA;
    pub const SURROUND_TV: u8 = 0xDB;
    pub const SURROUND_3D: u8 = 0xC9;
}

/// Fixed remote keys, (command name, key code).
const KEY_TABLE: &[(&str, u8)] = &[
    ("powerOn", keys::POWER_ON),
    ("powerOff", keys::POWER_OFF),
    ("volumeUp", keys::VOLUME_UP),
    ("volumeDown", keys::VOLUME_DOWN),
    ("muteOn", keys::MUTE_ON),
    ("muteOff", keys::MUTE_OFF),
    ("inputHdmi", keys::INPUT_HDMI),
    ("inputAnalog", keys::INPUT_ANALOG),
    ("inputBluetooth", keys::INPUT_BLUETOOTH),
    ("inputTv", keys::INPUT_TV),
    ("subwooferUp", keys::SUBWOOFER_UP),
    ("subwooferDown", keys::SUBWOOFER_DOWN),
    ("bassExtensionOn", keys::BASS_EXTENSION_ON),
    ("bassExtensionOff", keys::BASS_EXTENSION_OFF),
    ("clearVoiceOn", keys::CLEAR_VOICE_ON),
    ("clearVoiceOff", keys::CLEAR_VOICE_OFF),
    ("surroundStandard", keys::SURROUND_STANDARD),
    ("surroundStereo", keys::SURROUND_STEREO),
    ("surroundMovie", keys::SURROUND_MOVIE),
    ("surroundGame", keys::SURROUND_GAME),
    ("surroundMusic", keys::SURROUND_MUSIC),
    ("surroundTv", keys::SURROUND_TV),
    ("surround3d", keys::SURROUND_3D),
];

pub fn remote_key(key: u8) -> Command {
    Command::new(OP_REMOTE_KEY, &[KEY_PREFIX, key])
}

pub fn led_setting(level: LedLevel) -> Command {
    Command::new(OP_SETTING, &[SETTING_LED, level.code()])
}

pub fn status_request() -> Command {
    Command::new(OP_QUERY, &[QUERY_STATUS])
}

/// How a catalog entry turns into bytes.
#[derive(Clone)]
pub enum Resolver {
    Fixed(Command),
    Stateful(fn(&DeviceState) -> Command),
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolver::Fixed(command) => f.debug_tuple("Fixed").field(command).finish(),
            Resolver::Stateful(_) => f.write_str("Stateful(..)"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, Resolver>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every command the soundbar is known to accept.
    pub fn standard() -> Self {
        let mut catalog = Self::empty();
        catalog.register("request", Resolver::Fixed(status_request()));
        for (name, key) in KEY_TABLE {
            catalog.register(name, Resolver::Fixed(remote_key(*key)));
        }
        catalog.register("ledBright", Resolver::Fixed(led_setting(LedLevel::Bright)));
        catalog.register("ledDim", Resolver::Fixed(led_setting(LedLevel::Dim)));
        catalog.register("ledOff", Resolver::Fixed(led_setting(LedLevel::Off)));

        catalog.register(
            "powerToggle",
            Resolver::Stateful(|state| {
                remote_key(match state.power() {
                    Some(Power::On) => keys::POWER_OFF,
                    _ => keys::POWER_ON,
                })
            }),
        );
        catalog.register(
            "muteToggle",
            Resolver::Stateful(|state| {
                remote_key(match state.muted() {
                    Some(true) => keys::MUTE_OFF,
                    _ => keys::MUTE_ON,
                })
            }),
        );
        catalog.register(
            "bassExtensionToggle",
            Resolver::Stateful(|state| {
                remote_key(match state.bass_extension() {
                    Some(true) => keys::BASS_EXTENSION_OFF,
                    _ => keys::BASS_EXTENSION_ON,
                })
            }),
        );
        catalog.register(
            "clearVoiceToggle",
            Resolver::Stateful(|state| {
                remote_key(match state.clear_voice() {
                    Some(true) => keys::CLEAR_VOICE_OFF,
                    _ => keys::CLEAR_VOICE_ON,
                })
            }),
        );
        catalog
    }

    /// Add or replace a command. Returns the previous resolver, if any.
    pub fn register(&mut self, name: &str, resolver: Resolver) -> Option<Resolver> {
        self.entries.insert(name.to_string(), resolver)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn resolve(&self, name: &str, state: &DeviceState) -> DriverResult<Command> {
        match self.entries.get(name) {
            Some(Resolver::Fixed(command)) => Ok(command.clone()),
            Some(Resolver::Stateful(resolve)) => Ok(resolve(state)),
            None => Err(DriverError::UnknownCommand(name.to_string())),
        }
    }

    /// Fail on the first name the catalog does not know.
    pub fn check(&self, names: &[&str]) -> DriverResult<()> {
        match names.iter().find(|name| !self.contains(name)) {
            Some(name) => Err(DriverError::UnknownCommand(name.to_string())),
            None => Ok(()),
        }
    }
}

/// Shared instance of `Catalog::standard()`.
pub fn standard() -> &'static Catalog {
    static STANDARD: OnceLock<Catalog> = OnceLock::new();
    STANDARD.get_or_init(Catalog::standard)
}
