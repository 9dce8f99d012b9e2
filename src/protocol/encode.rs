//! Pure encoding: command names + state → framed bytes.
//!
//! No I/O, no side effects. Several names may be packed into one frame;
//! their opcodes and arguments are concatenated in order.

use crate::domain::{DriverError, DriverResult};
use crate::state::DeviceState;

use super::catalog::{self, Catalog};
use super::{checksum, FRAME_OVERHEAD, MARKER_1, MARKER_2};

/// Encode `names` with the standard catalog.
pub fn encode(names: &[&str], state: &DeviceState) -> DriverResult<Vec<u8>> {
    encode_with(catalog::standard(), names, state)
}

/// Encode `names` with a caller-supplied catalog.
pub fn encode_with(
    catalog: &Catalog,
    names: &[&str],
    state: &DeviceState,
) -> DriverResult<Vec<u8>> {
    let mut payload = Vec::new();
    for name in names {
        catalog.resolve(name, state)?.write_to(&mut payload);
    }
    frame(&payload)
}

/// Wrap a payload in markers, length byte and checksum.
pub fn frame(payload: &[u8]) -> DriverResult<Vec<u8>> {
    let length =
        u8::try_from(payload.len()).map_err(|_| DriverError::PayloadTooLong(payload.len()))?;

    let mut out = Vec::with_capacity(payload.len() + FRAME_OVERHEAD);
    out.push(MARKER_1);
    out.push(MARKER_2);
    out.push(length);
    out.extend_from_slice(payload);
    out.push(checksum(&out[2..]));
    Ok(out)
}
