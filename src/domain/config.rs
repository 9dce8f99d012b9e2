//! Driver configuration profiles
//!
//! A `DriverConfig` holds everything one soundbar needs: its address, the
//! retry budget and the session timing. Profiles are stored as JSON files.
//!
//! `init_timeout_ms` has no default on purpose: how long a soundbar may take
//! to report its status depends on the unit and the radio environment, so
//! every profile has to state it.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{DriverError, DriverResult};

fn default_max_retries() -> u32 {
    3
}

/// Fixed delays used by a session and the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Interval between checks for the first status frame
    pub poll_interval_ms: u64,
    /// Pause after the status frame arrived, before the command write
    pub settle_ms: u64,
    /// Hold after the command write, before teardown
    pub post_command_ms: u64,
    /// Wait between retry attempts, and once more before giving up
    pub retry_backoff_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_interval_ms: 60,
            settle_ms: 300,
            post_command_ms: 1000,
            retry_backoff_ms: 500,
        }
    }
}

impl Timing {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn post_command(&self) -> Duration {
        Duration::from_millis(self.post_command_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// A saved soundbar profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Profile name (e.g., "Living Room")
    pub name: String,
    /// BLE MAC address of the soundbar
    pub address: String,
    /// Retries after the first attempt on transient link failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Upper bound on the wait for the first status frame
    pub init_timeout_ms: u64,
    #[serde(default)]
    pub timing: Timing,
}

impl DriverConfig {
    pub fn new(address: impl Into<String>, init_timeout: Duration) -> Self {
        Self {
            name: "Soundbar".to_string(),
            address: address.into(),
            max_retries: default_max_retries(),
            init_timeout_ms: u64::try_from(init_timeout.as_millis()).unwrap_or(u64::MAX),
            timing: Timing::default(),
        }
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }

    pub fn validate(&self) -> DriverResult<()> {
        if self.address.trim().is_empty() {
            return Err(DriverError::Config("Device address cannot be empty".into()));
        }
        if self.init_timeout_ms == 0 {
            return Err(DriverError::Config("init_timeout_ms must be positive".into()));
        }
        if self.timing.poll_interval_ms == 0 {
            return Err(DriverError::Config("poll_interval_ms must be positive".into()));
        }
        sanitize_name(&self.name)?;
        Ok(())
    }

    /// Write the profile as `<dir>/<name>.json`.
    pub fn save(&self, dir: &Path) -> DriverResult<()> {
        let name = sanitize_name(&self.name)?;
        std::fs::create_dir_all(dir)
            .map_err(|e| DriverError::Config(format!("Failed to create {}: {e}", dir.display())))?;
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DriverError::Config(format!("Serialization error: {e}")))?;
        std::fs::write(dir.join(format!("{name}.json")), json)
            .map_err(|e| DriverError::Config(format!("Failed to write config: {e}")))
    }

    /// Read and validate `<dir>/<name>.json`.
    pub fn load(dir: &Path, name: &str) -> DriverResult<Self> {
        let name = sanitize_name(name)?;
        let path = dir.join(format!("{name}.json"));
        let json = std::fs::read_to_string(&path)
            .map_err(|e| DriverError::Config(format!("Failed to read config '{name}': {e}")))?;
        let config: DriverConfig = serde_json::from_str(&json)
            .map_err(|e| DriverError::Config(format!("Failed to parse config '{name}': {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

/// Reject names that would escape the profile directory.
fn sanitize_name(name: &str) -> DriverResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DriverError::Config("Configuration name cannot be empty".into()));
    }
    if trimmed.contains("..") || trimmed.contains('/') || trimmed.contains('\\') {
        return Err(DriverError::Config("Invalid configuration name".into()));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_')
    {
        return Err(DriverError::Config(
            "Configuration name contains invalid characters".into(),
        ));
    }
    Ok(trimmed.to_string())
}
