//! The operator- or auto-engaged flag blocking all new order submissions.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
pub struct KillSwitch {
    engaged: AtomicBool,
    reason: Mutex<Option<String>>,
}

impl KillSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::Acquire)
    }

    pub fn reason(&self) -> Option<String> {
        self.reason.lock().clone()
    }

    /// Idempotent: engaging an already-engaged switch just overwrites the
    /// reason string.
    pub fn engage(&self, reason: impl Into<String>) {
        *self.reason.lock() = Some(reason.into());
        self.engaged.store(true, Ordering::Release);
    }

    /// Operator-only. Does not cancel resting orders.
    pub fn disengage(&self) {
        self.engaged.store(false, Ordering::Release);
        *self.reason.lock() = None;
    }
}
