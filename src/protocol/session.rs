//! Session: one connection to the soundbar, from connect to disconnect.
//!
//! A session subscribes to the notify channel, asks for a status report,
//! waits until that report has been decoded into the shared state, and
//! then optionally writes one command frame. Whatever happens in between,
//! the link is disconnected before `run` returns.
//!
//! Pure translation lives in `encode` / `decode`. The session only handles
//! ordering, timing and I/O.

use crossbeam_channel::{Receiver, TryRecvError};
use serde::Serialize;
use std::time::Duration;

use crate::domain::{DriverError, DriverResult, Timing};
use crate::ports::{DriverEvent, EventSink, Link, LinkProvider, PeripheralResolver};
use crate::state::{lock_state, SharedDeviceState};

use super::catalog::Catalog;
use super::{decode, encode_with, Channel, DecodeResult, Notification, NOTIFY_HANDLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Idle,
    Connecting,
    Subscribed,
    AwaitingInit,
    Ready,
    CommandSent,
    Closing,
    Closed,
    Failed,
}

/// Collaborators and settings a session borrows from its driver.
#[derive(Clone, Copy)]
pub struct SessionContext<'a> {
    pub resolver: &'a dyn PeripheralResolver,
    pub links: &'a dyn LinkProvider,
    pub catalog: &'a Catalog,
    pub events: &'a dyn EventSink,
    pub timing: Timing,
    pub init_timeout: Duration,
}

pub struct Session<'a> {
    ctx: SessionContext<'a>,
    state: SharedDeviceState,
    phase: SessionPhase,
    /// Set once a status frame has been applied during this session
    status_received: bool,
}

impl<'a> Session<'a> {
    pub fn new(ctx: SessionContext<'a>, state: SharedDeviceState) -> Self {
        Self {
            ctx,
            state,
            phase: SessionPhase::Idle,
            status_received: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Connect to `address`, sync state, send `commands` (if any), disconnect.
    ///
    /// An empty `commands` slice only refreshes the state.
    pub async fn run(&mut self, address: &str, commands: &[&str]) -> DriverResult<()> {
        let mut link: Option<Box<dyn Link>> = None;
        let outcome = self.exchange(address, commands, &mut link).await;

        self.transition(SessionPhase::Closing);
        if let Some(mut link) = link {
            if let Err(error) = link.disconnect().await {
                self.emit(DriverEvent::TeardownFailed { error });
            }
        }

        match outcome {
            Ok(()) => self.transition(SessionPhase::Closed),
            Err(_) => self.transition(SessionPhase::Failed),
        }
        outcome
    }

    async fn exchange(
        &mut self,
        address: &str,
        commands: &[&str],
        link: &mut Option<Box<dyn Link>>,
    ) -> DriverResult<()> {
        self.transition(SessionPhase::Connecting);
        let peripheral = self
            .ctx
            .resolver
            .resolve_address(address)
            .await
            .ok_or_else(|| DriverError::LinkUnavailable(address.to_string()))?;

        if let Err(error) = self.ctx.links.release_stale(&peripheral).await {
            self.emit(DriverEvent::StaleCleanupFailed { error });
        }
        let link = link.insert(self.ctx.links.connect(&peripheral).await?);

        // Subscribe before the first write so the status push cannot be missed
        let (sink, inbound) = crossbeam_channel::unbounded();
        link.subscribe(Channel::Notify, sink).await?;
        self.transition(SessionPhase::Subscribed);

        let request = self.encode(&["request"])?;
        link.write(Channel::Write, &request).await?;
        self.emit(DriverEvent::RequestSent);

        self.transition(SessionPhase::AwaitingInit);
        self.await_status(&inbound).await?;
        tokio::time::sleep(self.ctx.timing.settle()).await;
        self.transition(SessionPhase::Ready);

        if commands.is_empty() {
            return Ok(());
        }

        let frame = self.encode(commands)?;
        let names: Vec<String> = commands.iter().map(|c| c.to_string()).collect();
        link.write(Channel::Write, &frame).await?;
        self.transition(SessionPhase::CommandSent);
        self.emit(DriverEvent::CommandSent {
            names: names.clone(),
        });

        tokio::time::sleep(self.ctx.timing.post_command()).await;
        // The command is delivered; a link that closes now ends the session normally
        if !self.drain(&inbound) {
            self.emit(DriverEvent::NotificationsClosed);
        }
        self.emit(DriverEvent::CommandCompleted { names });
        Ok(())
    }

    /// Encode against the current state. The lock is released before returning.
    fn encode(&self, names: &[&str]) -> DriverResult<Vec<u8>> {
        let state = lock_state(&self.state);
        encode_with(self.ctx.catalog, names, &state)
    }

    /// Wait for a status frame, bounded by the init timeout.
    async fn await_status(&mut self, inbound: &Receiver<Notification>) -> DriverResult<()> {
        let timeout = self.ctx.init_timeout;
        tokio::time::timeout(timeout, self.poll_status(inbound))
            .await
            .map_err(|_| DriverError::InitTimeout(timeout))?
    }

    async fn poll_status(&mut self, inbound: &Receiver<Notification>) -> DriverResult<()> {
        let interval = self.ctx.timing.poll_interval();
        loop {
            let open = self.drain(inbound);
            if self.status_received {
                return Ok(());
            }
            if !open {
                return Err(DriverError::UnexpectedDisconnect(
                    "Disconnected: notification stream closed".into(),
                ));
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Decode everything queued so far. Returns `false` once the stream has closed.
    fn drain(&mut self, inbound: &Receiver<Notification>) -> bool {
        loop {
            match inbound.try_recv() {
                Ok(notification) => self.handle_notification(notification),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn handle_notification(&mut self, notification: Notification) {
        let Notification { handle, value } = notification;
        self.emit(DriverEvent::FrameReceived {
            handle,
            bytes: value.clone(),
        });
        if handle != NOTIFY_HANDLE {
            self.emit(DriverEvent::UnexpectedHandle { handle });
        }

        match decode(&value) {
            DecodeResult::StatusUpdate(fields) => {
                lock_state(&self.state).apply_status(fields);
                self.status_received = true;
                self.emit(DriverEvent::StatusApplied(fields));
            }
            DecodeResult::Acknowledgement(ack) => self.emit(DriverEvent::Acknowledged(ack)),
            DecodeResult::Empty => self.emit(DriverEvent::EmptyFrame),
            DecodeResult::Malformed(reason) => self.emit(DriverEvent::MalformedFrame {
                reason,
                bytes: value,
            }),
        }
    }

    fn transition(&mut self, to: SessionPhase) {
        let from = std::mem::replace(&mut self.phase, to);
        self.emit(DriverEvent::PhaseChanged { from, to });
    }

    fn emit(&self, event: DriverEvent) {
        self.ctx.events.emit(event);
    }
}
