//! Core domain types
//!
//! Pure types with no I/O dependencies: errors, configuration profiles and
//! the attribute values a soundbar reports.

pub mod config;
pub mod error;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;
