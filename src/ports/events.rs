//! Diagnostic event port
//!
//! The driver reports what happens on the link through an injected
//! `EventSink` instead of calling a logger directly. `LogSink` forwards to
//! the `log` facade; tests record events with `MemorySink`.

use crate::domain::DriverError;
use crate::protocol::{Acknowledgement, MalformedReason, SessionPhase};
use crate::state::StatusFields;

#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    /// Raw notification, before decoding
    FrameReceived { handle: u16, bytes: Vec<u8> },
    /// Notification arrived on a handle other than the status handle
    UnexpectedHandle { handle: u16 },
    /// The zero-byte notification sent when notifications start
    EmptyFrame,
    StatusApplied(StatusFields),
    Acknowledged(Acknowledgement),
    MalformedFrame {
        reason: MalformedReason,
        bytes: Vec<u8>,
    },
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },
    StaleCleanupFailed { error: DriverError },
    RequestSent,
    CommandSent { names: Vec<String> },
    /// The link stopped delivering notifications after the command went out
    NotificationsClosed,
    CommandCompleted { names: Vec<String> },
    RetryScheduled {
        error: DriverError,
        remaining: u32,
        attempt: u32,
    },
    GaveUp { error: DriverError, attempts: u32 },
    TeardownFailed { error: DriverError },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: DriverEvent);
}
