//! BLE link port traits
//!
//! Split into three traits:
//! - `PeripheralResolver` — discovery: MAC address → peripheral handle
//! - `LinkProvider` — opens links, optionally cleaning up stale ones first
//! - `Link` — one open connection: subscribe, write, disconnect
//!
//! A host with a BLE stack implements these; the driver never touches the
//! radio directly.

use async_trait::async_trait;

use crate::domain::{DriverResult, PeripheralHandle};
use crate::protocol::{Channel, Notification};

/// Where a link delivers notifications. Backends usually push from their
/// own callback thread, so this is a plain thread-safe channel.
pub type NotificationSink = crossbeam_channel::Sender<Notification>;

#[async_trait]
pub trait PeripheralResolver: Send + Sync {
    /// Look up a connectable peripheral. `None` if it is not currently known.
    async fn resolve_address(&self, address: &str) -> Option<PeripheralHandle>;
}

#[async_trait]
pub trait LinkProvider: Send + Sync {
    /// Drop any connection to `peripheral` left behind by an earlier session.
    ///
    /// Runs before every connect. Failures are reported and ignored.
    async fn release_stale(&self, _peripheral: &PeripheralHandle) -> DriverResult<()> {
        Ok(())
    }

    /// Open a link. Transport refusals should map to `ConnectFailed`.
    async fn connect(&self, peripheral: &PeripheralHandle) -> DriverResult<Box<dyn Link>>;
}

#[async_trait]
pub trait Link: Send {
    /// Start forwarding notifications from `channel` into `sink`.
    ///
    /// Dropping the sender tells the session the link went away.
    async fn subscribe(&mut self, channel: Channel, sink: NotificationSink) -> DriverResult<()>;

    /// Write a complete frame to `channel`.
    async fn write(&mut self, channel: Channel, frame: &[u8]) -> DriverResult<()>;

    async fn disconnect(&mut self) -> DriverResult<()>;
}
