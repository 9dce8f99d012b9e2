//! Port traits (interfaces)
//!
//! These traits define the boundaries between the driver core and the
//! host: the BLE stack, discovery, and wherever diagnostics should go.
//! Adapters implement these traits.

pub mod events;
pub mod link;

pub use events::*;
pub use link::*;
