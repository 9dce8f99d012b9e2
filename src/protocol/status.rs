//! Layout of the 14-byte status payload.
//!
//! ```text
//! offset  width  field
//!  0      2      report id (05 00)
//!  2      1      power
//!  3      1      input
//!  4      1      mute
//!  5      1      volume
//!  6      1      subwoofer
//!  7      2      reserved
//!  9      2      sound mode, big endian
//! 11      1      bit 0 bass extension, bit 1 clear voice
//! 12      1      LED level
//! 13      1      reserved
//! ```
//!
//! The layout is a table so both directions (parse and render) and the
//! tests walk the same definition.

use crate::domain::{InputSource, LedLevel, Power, SoundMode};
use crate::state::StatusFields;

pub const STATUS_LEN: usize = 14;

/// First two payload bytes of every status report
pub const STATUS_REPORT_ID: [u8; 2] = [0x05, 0x00];

const BASS_EXTENSION_BIT: u8 = 0x01;
const CLEAR_VOICE_BIT: u8 = 0x02;

/// One field of the status payload.
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
    /// Read the field from its `width` bytes
    pub decode: fn(&[u8], &mut StatusFields),
    /// Write the field into its `width` bytes (OR-ing shared bytes)
    pub encode: fn(&StatusFields, &mut [u8]),
}

pub const STATUS_SCHEMA: &[FieldSpec] = &[
    FieldSpec {
        name: "power",
        offset: 2,
        width: 1,
        decode: |b, f| f.power = Power::from_code(b[0]),
        encode: |f, b| b[0] = u8::from(f.power.is_on()),
    },
    FieldSpec {
        name: "input",
        offset: 3,
        width: 1,
        decode: |b, f| f.input = InputSource::from_code(b[0]),
        encode: |f, b| b[0] = f.input.code(),
    },
    FieldSpec {
        name: "muted",
        offset: 4,
        width: 1,
        decode: |b, f| f.muted = b[0] != 0,
        encode: |f, b| b[0] = u8::from(f.muted),
    },
    FieldSpec {
        name: "volume",
        offset: 5,
        width: 1,
        decode: |b, f| f.volume = b[0],
        encode: |f, b| b[0] = f.volume,
    },
    FieldSpec {
        name: "subwoofer",
        offset: 6,
        width: 1,
        decode: |b, f| f.subwoofer = b[0],
        encode: |f, b| b[0] = f.subwoofer,
    },
    FieldSpec {
        name: "sound_mode",
        offset: 9,
        width: 2,
        decode: |b, f| f.sound_mode = SoundMode::from_code(u16::from_be_bytes([b[0], b[1]])),
        encode: |f, b| b.copy_from_slice(&f.sound_mode.code().to_be_bytes()),
    },
    FieldSpec {
        name: "bass_extension",
        offset: 11,
        width: 1,
        decode: |b, f| f.bass_extension = b[0] & BASS_EXTENSION_BIT != 0,
        encode: |f, b| {
            if f.bass_extension {
                b[0] |= BASS_EXTENSION_BIT
            }
        },
    },
    FieldSpec {
        name: "clear_voice",
        offset: 11,
        width: 1,
        decode: |b, f| f.clear_voice = b[0] & CLEAR_VOICE_BIT != 0,
        encode: |f, b| {
            if f.clear_voice {
                b[0] |= CLEAR_VOICE_BIT
            }
        },
    },
    FieldSpec {
        name: "led",
        offset: 12,
        width: 1,
        decode: |b, f| f.led = LedLevel::from_code(b[0]),
        encode: |f, b| b[0] = f.led.code(),
    },
];

/// Interpret a status payload. `None` unless it is exactly 14 bytes.
pub fn parse_status(payload: &[u8]) -> Option<StatusFields> {
    if payload.len() != STATUS_LEN {
        return None;
    }
    let mut fields = StatusFields::default();
    for spec in STATUS_SCHEMA {
        (spec.decode)(&payload[spec.offset..spec.offset + spec.width], &mut fields);
    }
    Some(fields)
}

/// Build the payload a soundbar in `fields` would report.
pub fn render_status(fields: &StatusFields) -> [u8; STATUS_LEN] {
    let mut payload = [0u8; STATUS_LEN];
    payload[..2].copy_from_slice(&STATUS_REPORT_ID);
    for spec in STATUS_SCHEMA {
        (spec.encode)(fields, &mut payload[spec.offset..spec.offset + spec.width]);
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    fn living_room() -> StatusFields {
        StatusFields {
            power: Power::On,
            input: InputSource::Bluetooth,
            muted: true,
            volume: 23,
            subwoofer: 16,
            sound_mode: SoundMode::Game,
            bass_extension: true,
            clear_voice: true,
            led: LedLevel::Dim,
        }
    }

    #[test]
    fn schema_fits_inside_payload() {
        for spec in STATUS_SCHEMA {
            assert!(spec.width > 0, "{} has zero width", spec.name);
            assert!(
                spec.offset >= STATUS_REPORT_ID.len() && spec.offset + spec.width <= STATUS_LEN,
                "{} out of bounds",
                spec.name
            );
        }
    }

    #[test]
    fn parse_captured_layout() {
        let payload = [
            0x05, 0x00, // report id
            0x01, // power on
            0x07, // tv input
            0x00, // not muted
            0x12, // volume 18
            0x10, // subwoofer 16
            0x00, 0x00, // reserved
            0x00, 0x03, // movie
            0x01, // bass extension only
            0x02, // led bright
            0x00,
        ];
        let fields = parse_status(&payload).unwrap();
        assert_eq!(fields.power, Power::On);
        assert_eq!(fields.input, InputSource::Tv);
        assert!(!fields.muted);
        assert_eq!(fields.volume, 18);
        assert_eq!(fields.subwoofer, 16);
        assert_eq!(fields.sound_mode, SoundMode::Movie);
        assert!(fields.bass_extension);
        assert!(!fields.clear_voice);
        assert_eq!(fields.led, LedLevel::Bright);
    }

    #[test]
    fn render_then_parse_preserves_fields() {
        let fields = living_room();
        let payload = render_status(&fields);
        assert_eq!(&payload[..2], &STATUS_REPORT_ID);
        assert_eq!(parse_status(&payload), Some(fields));
    }

    #[test]
    fn flag_byte_carries_both_toggles() {
        let payload = render_status(&living_room());
        assert_eq!(payload[11], BASS_EXTENSION_BIT | CLEAR_VOICE_BIT);
    }

    #[test]
    fn wrong_size_is_not_a_status() {
        assert_eq!(parse_status(&[0u8; 13]), None);
        assert_eq!(parse_status(&[0u8; 15]), None);
    }
}
