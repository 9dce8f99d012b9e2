//! Domain error types

use std::time::Duration;

use thiserror::Error;

/// Errors that can cross the driver boundary.
///
/// Malformed inbound frames are not errors: the codec reports them as
/// `DecodeResult::Malformed` and the session discards them. Teardown
/// failures never surface either; they are reported as events only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    #[error("Unknown command: '{0}'")]
    UnknownCommand(String),

    #[error("Frame payload too long: {0} bytes (max 255)")]
    PayloadTooLong(usize),

    #[error("Peripheral {0} could not be resolved")]
    LinkUnavailable(String),

    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    #[error("Unexpected disconnect: {0}")]
    UnexpectedDisconnect(String),

    #[error("No status frame within {0:?}")]
    InitTimeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<DriverError>,
    },
}

impl DriverError {
    /// Connection establishment failures and dropped links are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DriverError::ConnectFailed(_) | DriverError::UnexpectedDisconnect(_)
        )
    }

    /// Classify a raw error message coming out of a BLE backend.
    ///
    /// ESP32 proxies report `ESP_GATT_CONN_FAIL_ESTABLISH` when the link
    /// never came up; most stacks mention `Disconnected` when it drops.
    pub fn from_transport_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains("ESP_GATT_CONN_FAIL_ESTABLISH") {
            DriverError::ConnectFailed(message)
        } else if message.contains("Disconnected") {
            DriverError::UnexpectedDisconnect(message)
        } else {
            DriverError::Transport(message)
        }
    }
}

/// Result type alias for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_link_failures_are_retryable() {
        assert!(DriverError::ConnectFailed("x".into()).is_retryable());
        assert!(DriverError::UnexpectedDisconnect("x".into()).is_retryable());
        assert!(!DriverError::UnknownCommand("x".into()).is_retryable());
        assert!(!DriverError::LinkUnavailable("x".into()).is_retryable());
        assert!(!DriverError::InitTimeout(Duration::from_secs(1)).is_retryable());
        assert!(!DriverError::Transport("x".into()).is_retryable());
        assert!(!DriverError::PayloadTooLong(300).is_retryable());
    }

    #[test]
    fn transport_messages_are_classified_by_signature() {
        assert!(matches!(
            DriverError::from_transport_message("Error ESP_GATT_CONN_FAIL_ESTABLISH"),
            DriverError::ConnectFailed(_)
        ));
        assert!(matches!(
            DriverError::from_transport_message("Disconnected from AA:BB"),
            DriverError::UnexpectedDisconnect(_)
        ));
        assert!(matches!(
            DriverError::from_transport_message("characteristic not found"),
            DriverError::Transport(_)
        ));
    }

    #[test]
    fn exhausted_error_mentions_attempts_and_cause() {
        let err = DriverError::RetriesExhausted {
            attempts: 4,
            source: Box::new(DriverError::ConnectFailed("refused".into())),
        };
        let msg = err.to_string();
        assert!(msg.contains("4 attempts"), "{msg}");
        assert!(msg.contains("refused"), "{msg}");
    }
}
