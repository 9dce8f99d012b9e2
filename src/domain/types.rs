//! Core domain types
//!
//! Pure value types for soundbar attributes. Unrecognized wire codes are
//! kept in an `Other` variant so a firmware that reports something new
//! still produces a usable status.

use serde::{Deserialize, Serialize};

/// Main power state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Power {
    #[default]
    Off,
    On,
}

impl Power {
    pub fn from_code(code: u8) -> Self {
        if code == 0 {
            Power::Off
        } else {
            Power::On
        }
    }

    pub fn is_on(self) -> bool {
        self == Power::On
    }
}

/// Selected input source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputSource {
    #[default]
    Hdmi,
    Analog,
    Bluetooth,
    Tv,
    Other(u8),
}

/// Single source of truth for input code ↔ variant mapping.
pub const INPUT_TABLE: &[(u8, InputSource)] = &[
    (0x00, InputSource::Hdmi),
    (0x0C, InputSource::Analog),
    (0x05, InputSource::Bluetooth),
    (0x07, InputSource::Tv),
];

impl InputSource {
    pub fn from_code(code: u8) -> Self {
        INPUT_TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, input)| *input)
            .unwrap_or(InputSource::Other(code))
    }

    pub fn code(self) -> u8 {
        match self {
            InputSource::Other(code) => code,
            known => INPUT_TABLE
                .iter()
                .find(|(_, input)| *input == known)
                .map(|(c, _)| *c)
                .unwrap_or_default(),
        }
    }
}

/// Surround / sound program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SoundMode {
    #[default]
    Standard,
    Stereo,
    Movie,
    Game,
    Music,
    Tv,
    ThreeD,
    Other(u16),
}

pub const SOUND_MODE_TABLE: &[(u16, SoundMode)] = &[
    (0x0003, SoundMode::Movie),
    (0x0008, SoundMode::Music),
    (0x000C, SoundMode::Game),
    (0x000D, SoundMode::Standard),
    (0x000A, SoundMode::ThreeD),
    (0x0100, SoundMode::Stereo),
    (0x0101, SoundMode::Tv),
];

impl SoundMode {
    pub fn from_code(code: u16) -> Self {
        SOUND_MODE_TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, mode)| *mode)
            .unwrap_or(SoundMode::Other(code))
    }

    pub fn code(self) -> u16 {
        match self {
            SoundMode::Other(code) => code,
            known => SOUND_MODE_TABLE
                .iter()
                .find(|(_, mode)| *mode == known)
                .map(|(c, _)| *c)
                .unwrap_or_default(),
        }
    }
}

/// Front panel LED brightness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LedLevel {
    Off,
    Dim,
    #[default]
    Bright,
    Other(u8),
}

impl LedLevel {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => LedLevel::Off,
            0x01 => LedLevel::Dim,
            0x02 => LedLevel::Bright,
            other => LedLevel::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            LedLevel::Off => 0x00,
            LedLevel::Dim => 0x01,
            LedLevel::Bright => 0x02,
            LedLevel::Other(code) => code,
        }
    }

    /// Catalog command that selects this level, if there is one.
    pub fn command_name(self) -> Option<&'static str> {
        match self {
            LedLevel::Off => Some("ledOff"),
            LedLevel::Dim => Some("ledDim"),
            LedLevel::Bright => Some("ledBright"),
            LedLevel::Other(_) => None,
        }
    }

    /// Parse the option labels a host select entity offers ("Bright", "Dim", "Off").
    pub fn from_option(option: &str) -> Option<Self> {
        match option {
            "Bright" => Some(LedLevel::Bright),
            "Dim" => Some(LedLevel::Dim),
            "Off" => Some(LedLevel::Off),
            _ => None,
        }
    }
}

/// Opaque reference to a resolved peripheral, handed out by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeripheralHandle {
    pub address: String,
    pub name: Option<String>,
}

impl PeripheralHandle {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_codes_roundtrip() {
        for (code, input) in INPUT_TABLE {
            assert_eq!(InputSource::from_code(*code), *input);
            assert_eq!(input.code(), *code);
        }
        assert_eq!(InputSource::from_code(0x42), InputSource::Other(0x42));
        assert_eq!(InputSource::Other(0x42).code(), 0x42);
    }

    #[test]
    fn sound_mode_unknown_code_is_preserved() {
        assert_eq!(SoundMode::from_code(0x0D), SoundMode::Standard);
        assert_eq!(SoundMode::from_code(0xBEEF), SoundMode::Other(0xBEEF));
    }

    #[test]
    fn led_options_map_to_catalog_commands() {
        assert_eq!(
            LedLevel::from_option("Bright").and_then(LedLevel::command_name),
            Some("ledBright")
        );
        assert_eq!(LedLevel::from_option("Dim").and_then(LedLevel::command_name), Some("ledDim"));
        assert_eq!(LedLevel::from_option("Off").and_then(LedLevel::command_name), Some("ledOff"));
        assert_eq!(LedLevel::from_option("Disco"), None);
    }

    #[test]
    fn any_nonzero_power_code_means_on() {
        assert_eq!(Power::from_code(0), Power::Off);
        assert_eq!(Power::from_code(1), Power::On);
        assert_eq!(Power::from_code(0x80), Power::On);
    }
}
