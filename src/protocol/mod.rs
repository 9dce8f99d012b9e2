//! Soundbar BLE wire protocol.
//!
//! This module separates the concerns of talking to the soundbar:
//! - `catalog`: symbolic command name → opcode and arguments
//! - `encode`: commands → framed bytes (pure, no I/O)
//! - `decode`: framed bytes → `DecodeResult` (pure, no I/O)
//! - `status`: layout of the 14-byte status payload
//! - `session`: one connection, driving timing and I/O
//!
//! Frame layout, both directions:
//!
//! ```text
//! CC AA <len> <payload: len bytes> <checksum>
//! ```
//!
//! The checksum makes `len + payload + checksum` sum to zero mod 256.

pub mod catalog;
pub mod decode;
pub mod encode;
pub mod session;
pub mod status;

pub use catalog::{Catalog, Resolver};
pub use decode::decode;
pub use encode::{encode, encode_with, frame};
pub use session::{Session, SessionContext, SessionPhase};

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::state::StatusFields;

pub const MARKER_1: u8 = 0xCC;
pub const MARKER_2: u8 = 0xAA;

/// Markers, length byte and checksum
pub const FRAME_OVERHEAD: usize = 4;

/// Attribute handle the soundbar pushes its notifications on
pub const NOTIFY_HANDLE: u16 = 0x08;

/// The two GATT characteristics the driver uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Channel {
    /// Commands and status requests
    Write,
    /// Status frames and acknowledgements
    Notify,
}

impl Channel {
    pub fn uuid(self) -> &'static str {
        match self {
            Channel::Write => "0c50e7fa-594c-408b-ae0d-b53b884b7c08",
            Channel::Notify => "5cafe9de-e7b0-4e0b-8fb9-2da91a7ae3ed",
        }
    }
}

/// One push received on the notify channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub handle: u16,
    pub value: Vec<u8>,
}

impl Notification {
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            handle: NOTIFY_HANDLE,
            value,
        }
    }
}

/// A resolved command: the opcode byte followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub opcode: u8,
    pub args: Vec<u8>,
}

impl Command {
    pub fn new(opcode: u8, args: &[u8]) -> Self {
        Self {
            opcode,
            args: args.to_vec(),
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.opcode);
        out.extend_from_slice(&self.args);
    }
}

/// Two's complement of the byte sum of everything after the markers.
///
/// Checked against the captured key frame `CC AA 03 40 78 4A FB`.
pub fn checksum(body: &[u8]) -> u8 {
    body.iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
        .wrapping_neg()
}

/// Short frames the soundbar sends back after a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AckKind {
    /// 2-byte payload: opcode and a result code
    Receipt,
    /// 3-byte payload: a key or setting echoed back
    Echo,
    /// 5-byte payload: a short report
    Report,
}

impl AckKind {
    pub fn for_length(length: usize) -> Option<Self> {
        match length {
            2 => Some(AckKind::Receipt),
            3 => Some(AckKind::Echo),
            5 => Some(AckKind::Report),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgement {
    pub kind: AckKind,
    /// Full payload, opcode first
    pub payload: Vec<u8>,
}

impl Acknowledgement {
    pub fn opcode(&self) -> u8 {
        self.payload.first().copied().unwrap_or_default()
    }
}

impl fmt::Display for Acknowledgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = hex(self.payload.get(1..).unwrap_or_default());
        match self.kind {
            AckKind::Receipt => write!(f, "receipt for opcode 0x{:02x}: {args}", self.opcode()),
            AckKind::Echo => write!(f, "echo of opcode 0x{:02x}: {args}", self.opcode()),
            AckKind::Report => write!(f, "report 0x{:02x}: {args}", self.opcode()),
        }
    }
}

/// Why an inbound frame was discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("frame too short ({0} bytes)")]
    TooShort(usize),
    #[error("bad marker 1")]
    BadMarker1,
    #[error("bad marker 2")]
    BadMarker2,
    #[error("bad checksum")]
    BadChecksum,
    #[error("length byte says {declared}, payload has {actual}")]
    LengthMismatch { declared: u8, actual: usize },
    #[error("unexpected payload length {0}")]
    UnexpectedLength(u8),
}

/// Outcome of decoding one notification. Decoding never fails.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeResult {
    StatusUpdate(StatusFields),
    Acknowledgement(Acknowledgement),
    /// Zero-byte notification, sent once when notifications start
    Empty,
    Malformed(MalformedReason),
}

/// Lowercase hex without separators, for logs.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_matches_captured_key_frame() {
        assert_eq!(checksum(&[0x03, 0x40, 0x78, 0x4A]), 0xFB);
    }

    #[test]
    fn checksum_zeroes_the_body_sum() {
        let body = [0x0E, 0x05, 0x00, 0x01, 0xFF, 0x80, 0x7F];
        let sum = body
            .iter()
            .fold(checksum(&body), |acc, b| acc.wrapping_add(*b));
        assert_eq!(sum, 0);
    }

    #[test]
    fn ack_kind_follows_payload_length() {
        assert_eq!(AckKind::for_length(2), Some(AckKind::Receipt));
        assert_eq!(AckKind::for_length(3), Some(AckKind::Echo));
        assert_eq!(AckKind::for_length(5), Some(AckKind::Report));
        assert_eq!(AckKind::for_length(4), None);
        assert_eq!(AckKind::for_length(14), None);
    }

    #[test]
    fn acknowledgement_display_names_opcode() {
        let ack = Acknowledgement {
            kind: AckKind::Echo,
            payload: vec![0x40, 0x78, 0x4A],
        };
        assert_eq!(ack.to_string(), "echo of opcode 0x40: 784a");
    }

    #[test]
    fn channels_carry_gatt_uuids() {
        assert_eq!(Channel::Write.uuid(), "0c50e7fa-594c-408b-ae0d-b53b884b7c08");
        assert_eq!(Channel::Notify.uuid(), "5cafe9de-e7b0-4e0b-8fb9-2da91a7ae3ed");
    }
}
