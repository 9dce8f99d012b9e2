//! Event sink that keeps every event in memory.
//!
//! Used by the tests, and by hosts that want to show the last session's
//! diagnostics without scraping logs.

use std::sync::Mutex;

use crate::ports::{DriverEvent, EventSink};

#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DriverEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DriverEvent> {
        self.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&DriverEvent) -> bool) -> usize {
        self.lock().iter().filter(|e| predicate(e)).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DriverEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: DriverEvent) {
        self.lock().push(event);
    }
}
