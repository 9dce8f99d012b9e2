//! Last-known soundbar state
//!
//! The record is only ever written by a decoded 14-byte status frame.
//! Before the first one arrives every accessor returns `None`.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::domain::{InputSource, LedLevel, Power, SoundMode};

/// Whether a status frame has been applied yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum InitStatus {
    #[default]
    Uninitialized,
    Initialized,
}

/// Every attribute carried by a status frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusFields {
    pub power: Power,
    pub input: InputSource,
    pub muted: bool,
    pub volume: u8,
    pub subwoofer: u8,
    pub sound_mode: SoundMode,
    pub bass_extension: bool,
    pub clear_voice: bool,
    pub led: LedLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DeviceState {
    status: InitStatus,
    fields: StatusFields,
}

/// Handle shared between the owning entity and the session that updates it.
pub type SharedDeviceState = Arc<Mutex<DeviceState>>;

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedDeviceState {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn status(&self) -> InitStatus {
        self.status
    }

    pub fn is_initialized(&self) -> bool {
        self.status == InitStatus::Initialized
    }

    /// Replace every field with a freshly decoded status.
    pub fn apply_status(&mut self, fields: StatusFields) {
        self.fields = fields;
        self.status = InitStatus::Initialized;
    }

    pub fn fields(&self) -> Option<&StatusFields> {
        self.is_initialized().then_some(&self.fields)
    }

    pub fn power(&self) -> Option<Power> {
        self.fields().map(|f| f.power)
    }

    pub fn input(&self) -> Option<InputSource> {
        self.fields().map(|f| f.input)
    }

    pub fn muted(&self) -> Option<bool> {
        self.fields().map(|f| f.muted)
    }

    pub fn volume(&self) -> Option<u8> {
        self.fields().map(|f| f.volume)
    }

    pub fn subwoofer(&self) -> Option<u8> {
        self.fields().map(|f| f.subwoofer)
    }

    pub fn sound_mode(&self) -> Option<SoundMode> {
        self.fields().map(|f| f.sound_mode)
    }

    pub fn bass_extension(&self) -> Option<bool> {
        self.fields().map(|f| f.bass_extension)
    }

    pub fn clear_voice(&self) -> Option<bool> {
        self.fields().map(|f| f.clear_voice)
    }

    pub fn led(&self) -> Option<LedLevel> {
        self.fields().map(|f| f.led)
    }
}

/// Lock the shared record. A panic in another holder cannot leave a
/// half-written state behind (writes are a single assignment), so a
/// poisoned lock is still safe to read.
pub fn lock_state(state: &SharedDeviceState) -> MutexGuard<'_, DeviceState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> StatusFields {
        StatusFields {
            power: Power::On,
            input: InputSource::Tv,
            muted: false,
            volume: 17,
            subwoofer: 12,
            sound_mode: SoundMode::Movie,
            bass_extension: true,
            clear_voice: false,
            led: LedLevel::Dim,
        }
    }

    #[test]
    fn new_state_reads_unknown() {
        let state = DeviceState::new();
        assert_eq!(state.status(), InitStatus::Uninitialized);
        assert_eq!(state.power(), None);
        assert_eq!(state.volume(), None);
        assert_eq!(state.led(), None);
        assert!(state.fields().is_none());
    }

    #[test]
    fn apply_status_initializes_and_exposes_fields() {
        let mut state = DeviceState::new();
        state.apply_status(sample_fields());
        assert!(state.is_initialized());
        assert_eq!(state.power(), Some(Power::On));
        assert_eq!(state.input(), Some(InputSource::Tv));
        assert_eq!(state.volume(), Some(17));
        assert_eq!(state.bass_extension(), Some(true));
        assert_eq!(state.led(), Some(LedLevel::Dim));
    }

    #[test]
    fn apply_status_is_idempotent() {
        let mut once = DeviceState::new();
        once.apply_status(sample_fields());

        let mut twice = DeviceState::new();
        twice.apply_status(sample_fields());
        twice.apply_status(sample_fields());

        assert_eq!(once, twice);
    }

    #[test]
    fn later_status_overwrites_every_field() {
        let mut state = DeviceState::new();
        state.apply_status(sample_fields());
        state.apply_status(StatusFields::default());
        assert_eq!(state.fields(), Some(&StatusFields::default()));
    }

    #[test]
    fn shared_state_is_visible_through_clones() {
        let shared = DeviceState::shared();
        let other = Arc::clone(&shared);
        lock_state(&shared).apply_status(sample_fields());
        assert_eq!(lock_state(&other).volume(), Some(17));
    }
}
