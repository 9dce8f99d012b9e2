//! Pure decoding: notification bytes → `DecodeResult`.
//!
//! No I/O, no side effects, no errors. Anything that is not a well-formed
//! frame comes back as `Malformed` with the reason, and the caller decides
//! whether to log it.
//!
//! Checks run in the order the soundbar firmware is most likely to get
//! wrong: size, markers, checksum, then the length byte.

use super::status::{parse_status, STATUS_LEN};
use super::{
    checksum, AckKind, Acknowledgement, DecodeResult, MalformedReason, FRAME_OVERHEAD, MARKER_1,
    MARKER_2,
};

pub fn decode(raw: &[u8]) -> DecodeResult {
    if raw.is_empty() {
        return DecodeResult::Empty;
    }
    if raw.len() < FRAME_OVERHEAD {
        return DecodeResult::Malformed(MalformedReason::TooShort(raw.len()));
    }
    if raw[0] != MARKER_1 {
        return DecodeResult::Malformed(MalformedReason::BadMarker1);
    }
    if raw[1] != MARKER_2 {
        return DecodeResult::Malformed(MalformedReason::BadMarker2);
    }

    let (body, check) = raw[2..].split_at(raw.len() - 3);
    if checksum(body) != check[0] {
        return DecodeResult::Malformed(MalformedReason::BadChecksum);
    }

    let declared = body[0];
    let payload = &body[1..];
    if payload.len() != usize::from(declared) {
        return DecodeResult::Malformed(MalformedReason::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }

    if payload.len() == STATUS_LEN {
        return match parse_status(payload) {
            Some(fields) => DecodeResult::StatusUpdate(fields),
            None => DecodeResult::Malformed(MalformedReason::UnexpectedLength(declared)),
        };
    }
    match AckKind::for_length(payload.len()) {
        Some(kind) => DecodeResult::Acknowledgement(Acknowledgement {
            kind,
            payload: payload.to_vec(),
        }),
        None => DecodeResult::Malformed(MalformedReason::UnexpectedLength(declared)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LedLevel, Power};
    use crate::protocol::encode::{encode_with, frame};
    use crate::protocol::status::render_status;
    use crate::protocol::Catalog;
    use crate::state::{DeviceState, StatusFields};

    fn status_frame(fields: &StatusFields) -> Vec<u8> {
        frame(&render_status(fields)).unwrap()
    }

    #[test]
    fn empty_notification_is_empty() {
        assert_eq!(decode(&[]), DecodeResult::Empty);
    }

    #[test]
    fn status_frame_decodes_to_update() {
        let fields = StatusFields {
            power: Power::On,
            volume: 30,
            led: LedLevel::Off,
            ..Default::default()
        };
        let raw = status_frame(&fields);
        assert_eq!(&raw[..3], &[0xCC, 0xAA, 0x0E]);
        assert_eq!(decode(&raw), DecodeResult::StatusUpdate(fields));
    }

    #[test]
    fn wrong_second_marker() {
        let raw = [0xCC, 0xAB, 0x02, 0x01, 0xFD];
        match decode(&raw) {
            DecodeResult::Malformed(reason) => assert_eq!(reason.to_string(), "bad marker 2"),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn wrong_first_marker() {
        let raw = [0xCD, 0xAA, 0x02, 0x03, 0x05, 0xF6];
        assert_eq!(decode(&raw), DecodeResult::Malformed(MalformedReason::BadMarker1));
    }

    #[test]
    fn bad_checksum() {
        let raw = [0xCC, 0xAA, 0x02, 0x03, 0x05, 0xF7];
        assert_eq!(decode(&raw), DecodeResult::Malformed(MalformedReason::BadChecksum));
    }

    #[test]
    fn length_byte_disagrees_with_payload() {
        // Checksum is valid, but only two payload bytes follow a length of 3
        let raw = [0xCC, 0xAA, 0x03, 0x03, 0x05, 0xF5];
        assert_eq!(
            decode(&raw),
            DecodeResult::Malformed(MalformedReason::LengthMismatch {
                declared: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn short_non_empty_notification() {
        assert_eq!(
            decode(&[0xCC, 0xAA, 0x00]),
            DecodeResult::Malformed(MalformedReason::TooShort(3))
        );
    }

    #[test]
    fn unexpected_length_is_malformed() {
        let raw = frame(&[0x01, 0x02, 0x03, 0x04]).unwrap();
        assert_eq!(decode(&raw), DecodeResult::Malformed(MalformedReason::UnexpectedLength(4)));
    }

    #[test]
    fn short_frames_are_acknowledgements() {
        for (payload, kind) in [
            (vec![0x03, 0x00], AckKind::Receipt),
            (vec![0x40, 0x78, 0x7E], AckKind::Echo),
            (vec![0x11, 0x01, 0x02, 0x03, 0x04], AckKind::Report),
        ] {
            let raw = frame(&payload).unwrap();
            assert_eq!(
                decode(&raw),
                DecodeResult::Acknowledgement(Acknowledgement { kind, payload })
            );
        }
    }

    #[test]
    fn every_catalog_command_decodes_to_its_own_echo() {
        let mut all_on = DeviceState::new();
        all_on.apply_status(StatusFields {
            power: Power::On,
            muted: true,
            bass_extension: true,
            clear_voice: true,
            ..Default::default()
        });
        let mut all_off = DeviceState::new();
        all_off.apply_status(StatusFields {
            power: Power::Off,
            muted: false,
            bass_extension: false,
            clear_voice: false,
            ..Default::default()
        });

        let catalog = Catalog::standard();
        for state in [DeviceState::new(), all_on, all_off] {
            for name in catalog.names() {
                let mut expected = Vec::new();
                catalog.resolve(name, &state).unwrap().write_to(&mut expected);
                let kind = if name == "request" {
                    AckKind::Receipt
                } else {
                    AckKind::Echo
                };
                assert_eq!(expected.len(), if kind == AckKind::Receipt { 2 } else { 3 });

                let raw = encode_with(&catalog, &[name], &state).unwrap();
                assert_eq!(
                    decode(&raw),
                    DecodeResult::Acknowledgement(Acknowledgement {
                        kind,
                        payload: expected
                    }),
                    "{name} did not survive encode/decode"
                );
            }
        }
    }

    #[test]
    fn single_bit_flip_is_always_malformed() {
        let valid = vec![
            status_frame(&StatusFields::default()),
            frame(&[0x40, 0x78, 0x4A]).unwrap(),
            frame(&[0x03, 0x05]).unwrap(),
            frame(&[0x11, 0x01, 0x02, 0x03, 0x04]).unwrap(),
        ];
        for raw in valid {
            assert!(!matches!(decode(&raw), DecodeResult::Malformed(_)));
            for byte in 0..raw.len() {
                for bit in 0..8 {
                    let mut flipped = raw.clone();
                    flipped[byte] ^= 1 << bit;
                    assert!(
                        matches!(decode(&flipped), DecodeResult::Malformed(_)),
                        "flip of byte {byte} bit {bit} in {raw:02x?} was accepted"
                    );
                }
            }
        }
    }

    #[test]
    fn accepted_frames_satisfy_length_invariant() {
        let captured = [
            status_frame(&StatusFields::default()),
            frame(&[0x03, 0x00]).unwrap(),
            frame(&[0x48, 0x0A, 0x01]).unwrap(),
            frame(&[0x11, 0x01, 0x02, 0x03, 0x04]).unwrap(),
        ];
        for raw in captured {
            let declared = usize::from(raw[2]);
            match decode(&raw) {
                DecodeResult::StatusUpdate(_) => assert_eq!(declared, STATUS_LEN),
                DecodeResult::Acknowledgement(ack) => assert_eq!(ack.payload.len(), declared),
                other => panic!("captured frame rejected: {other:?}"),
            }
            assert_eq!(raw.len() - FRAME_OVERHEAD, declared);
        }
    }
}
