//! Control surface shared between the scheduler and whoever drives it
//! (signal handlers, tests, the one-shot CLI).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
struct Flags {
    shutdown: AtomicBool,
    force_cycle: AtomicBool,
    force_detection: AtomicBool,
    force_backup: AtomicBool,
}

/// Cloneable handle onto the override and shutdown flags.
///
/// Requests are latched: they stay set until the scheduler takes them, so a
/// request made while a cycle is running is honoured on the next evaluation.
#[derive(Debug, Clone, Default)]
pub struct ControlHandle {
    flags: Arc<Flags>,
}

impl ControlHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_shutdown(&self) {
        self.flags.shutdown.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn shutdown_requested(&self) -> bool {
        self.flags.shutdown.load(Ordering::SeqCst)
    }

    pub fn request_cycle(&self) {
        self.flags.force_cycle.store(true, Ordering::SeqCst);
    }

    pub fn request_detection(&self) {
        self.flags.force_detection.store(true, Ordering::SeqCst);
    }

    pub fn request_backup(&self) {
        self.flags.force_backup.store(true, Ordering::SeqCst);
    }

    /// Consume a pending forced-cycle request.
    pub fn take_cycle_request(&self) -> bool {
        self.flags.force_cycle.swap(false, Ordering::SeqCst)
    }

    pub fn take_detection_request(&self) -> bool {
        self.flags.force_detection.swap(false, Ordering::SeqCst)
    }

    pub fn take_backup_request(&self) -> bool {
        self.flags.force_backup.swap(false, Ordering::SeqCst)
    }

    #[must_use]
    pub fn cycle_pending(&self) -> bool {
        self.flags.force_cycle.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn backup_pending(&self) -> bool {
        self.flags.force_backup.load(Ordering::SeqCst)
    }
}
