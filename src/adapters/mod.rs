//! Adapters implementing the port traits.

pub mod log_sink;
pub mod memory_sink;
pub mod mock_soundbar;

pub use log_sink::LogSink;
pub use memory_sink::MemorySink;
pub use mock_soundbar::MockSoundbar;
