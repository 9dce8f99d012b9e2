//! Barlink
//!
//! Driver for soundbars that speak the `CC AA` framed protocol over BLE:
//! frame codec, device-state sync and a retrying session runner.
//!
//! ## Architecture (Hexagonal / Ports & Adapters)
//!
//! - `domain/` - Pure domain types, config and errors, no I/O dependencies
//! - `ports/` - Trait definitions for the BLE stack and the event sink
//! - `protocol/` - Frame codec, status schema, command catalog and session
//! - `adapters/` - Implementations of ports (log sink, memory sink, mock soundbar)
//! - `state` - Shared device state
//! - `retry` - Bounded retry around a session
//! - `driver` - `Soundbar`, the entry point a host calls

// Core domain (pure, no I/O)
pub mod domain;
pub mod ports;
pub mod protocol;
pub mod state;

// Adapters (external I/O)
pub mod adapters;

// Orchestration
pub mod driver;
pub mod retry;

pub use domain::{DriverConfig, DriverError, DriverResult};
pub use driver::{RunReport, Soundbar};
pub use state::{DeviceState, SharedDeviceState};
