//! Soundbar driver: the entry point a host integration calls.
//!
//! A `Soundbar` owns the device state for one physical unit and runs one
//! retried session per call. Callers must not run two calls against the
//! same soundbar at once; wrap a call in `tokio::time::timeout` to bound it.

use std::sync::Arc;

use crate::adapters::LogSink;
use crate::domain::{DriverConfig, DriverError, DriverResult, LedLevel};
use crate::ports::{EventSink, LinkProvider, PeripheralResolver};
use crate::protocol::{Catalog, Session, SessionContext};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::state::{lock_state, DeviceState, SharedDeviceState};

/// Outcome of a successful `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Sessions started, including the one that succeeded
    pub attempts: u32,
}

pub struct Soundbar {
    config: DriverConfig,
    state: SharedDeviceState,
    resolver: Arc<dyn PeripheralResolver>,
    links: Arc<dyn LinkProvider>,
    catalog: Arc<Catalog>,
    events: Arc<dyn EventSink>,
}

impl Soundbar {
    pub fn new(
        config: DriverConfig,
        resolver: Arc<dyn PeripheralResolver>,
        links: Arc<dyn LinkProvider>,
    ) -> DriverResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: DeviceState::shared(),
            resolver,
            links,
            catalog: Arc::new(Catalog::standard()),
            events: Arc::new(LogSink),
        })
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    /// Use a state record owned elsewhere (e.g. shared by several host entities).
    pub fn with_state(mut self, state: SharedDeviceState) -> Self {
        self.state = state;
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn state_handle(&self) -> SharedDeviceState {
        Arc::clone(&self.state)
    }

    /// Snapshot of the last known state.
    pub fn state(&self) -> DeviceState {
        *lock_state(&self.state)
    }

    /// Sync state and send `commands` (none = query only), retrying link failures.
    pub async fn run(&self, commands: &[&str]) -> DriverResult<RunReport> {
        self.catalog.check(commands)?;

        let policy = RetryPolicy::new(self.config.max_retries, self.config.timing.retry_backoff());
        let ((), attempts) = run_with_retry(policy, self.events.as_ref(), move |attempt| {
            self.attempt(attempt, commands)
        })
        .await?;
        Ok(RunReport { attempts })
    }

    pub async fn send_command(&self, commands: &[&str]) -> DriverResult<()> {
        self.run(commands).await.map(|_| ())
    }

    pub async fn query_state(&self) -> DriverResult<DeviceState> {
        self.run(&[]).await?;
        Ok(self.state())
    }

    /// What a host LED select entity calls with the chosen level.
    pub async fn set_led(&self, level: LedLevel) -> DriverResult<()> {
        let name = level
            .command_name()
            .ok_or_else(|| DriverError::UnknownCommand(format!("{level:?}")))?;
        self.send_command(&[name]).await
    }

    async fn attempt(&self, attempt: u32, commands: &[&str]) -> DriverResult<()> {
        log::debug!(
            "Session attempt {attempt} for {} ({})",
            self.config.name,
            self.config.address
        );
        let ctx = SessionContext {
            resolver: self.resolver.as_ref(),
            links: self.links.as_ref(),
            catalog: &self.catalog,
            events: self.events.as_ref(),
            timing: self.config.timing,
            init_timeout: self.config.init_timeout(),
        };
        Session::new(ctx, Arc::clone(&self.state))
            .run(&self.config.address, commands)
            .await
    }
}
