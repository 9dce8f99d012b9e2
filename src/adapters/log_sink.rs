//! Event sink that forwards driver events to the `log` facade.
//!
//! Enable with e.g. `RUST_LOG=barlink_lib=debug`. Frame traffic is logged
//! at debug, commands at info, discarded frames at warn and give-ups at
//! error.

use crate::ports::{DriverEvent, EventSink};
use crate::protocol::hex;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: DriverEvent) {
        use DriverEvent::*;
        match event {
            FrameReceived { bytes, .. } => log::debug!("Received data: {}", hex(&bytes)),
            UnexpectedHandle { handle } => {
                log::debug!("Notification on unexpected handle 0x{handle:02x}")
            }
            EmptyFrame => log::debug!("Received empty data packet, expected once on startup"),
            StatusApplied(fields) => log::debug!("Status: {fields:?}"),
            Acknowledged(ack) => log::debug!("Received: {ack}"),
            MalformedFrame { reason, bytes } => {
                log::warn!("Discarded frame ({reason}): 0x{}", hex(&bytes))
            }
            PhaseChanged { from, to } => log::trace!("Session {from:?} → {to:?}"),
            StaleCleanupFailed { error } => {
                log::warn!("Stale connection cleanup failed: {error}")
            }
            RequestSent => log::debug!("Status request sent"),
            CommandSent { names } => log::info!("Sending BLE command: {}", names.join(", ")),
            NotificationsClosed => log::debug!("Notification stream closed after command"),
            CommandCompleted { names } => {
                log::info!("BLE command '{}' sent successfully", names.join(", "))
            }
            RetryScheduled {
                error,
                remaining,
                attempt,
            } => log::error!(
                "Error detected ({error}), retrying. Remaining: {remaining}, attempt: {attempt}"
            ),
            GaveUp { error, attempts } => {
                log::error!("Error sending BLE command after {attempts} attempt(s): {error}")
            }
            TeardownFailed { error } => log::warn!("Disconnect failed: {error}"),
        }
    }
}
