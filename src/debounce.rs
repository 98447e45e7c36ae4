//! Button edge debouncing and the interrupt/main-loop flag boundary.
//!
//! Each physical button toggles a "desired state" flag: button A toggles
//! capture-requested, button B toggles mount-requested. The button tasks
//! are the only writers of these flags (besides an explicit re-sync when
//! a console command takes the same action); the main loop only reads
//! them and reacts to changes against its own shadow copies.

use portable_atomic::{AtomicBool, Ordering};

/// Per-input refractory window. An edge is accepted only if it arrives
/// strictly more than `window_us` after the previously accepted one.
pub struct Debouncer {
    window_us: u64,
    last_accepted_us: Option<u64>,
}

impl Debouncer {
    pub const fn new(window_us: u64) -> Self {
        Self {
            window_us,
            last_accepted_us: None,
        }
    }

    /// Report a falling edge at `now_us`. Returns `true` if accepted.
    /// Rejected edges have no side effect.
    pub fn accept(&mut self, now_us: u64) -> bool {
        match self.last_accepted_us {
            Some(last) if now_us.saturating_sub(last) <= self.window_us => false,
            _ => {
                self.last_accepted_us = Some(now_us);
                true
            }
        }
    }
}

/// The two desired-state flags shared between the button tasks and the
/// main loop. Relaxed ordering is sufficient: each flag is an
/// independent boolean with a single writer per direction.
pub struct EdgeFlags {
    capture: AtomicBool,
    mount: AtomicBool,
}

impl EdgeFlags {
    pub const fn new() -> Self {
        Self {
            capture: AtomicBool::new(false),
            mount: AtomicBool::new(false),
        }
    }

    pub fn capture(&self) -> bool {
        self.capture.load(Ordering::Relaxed)
    }

    pub fn mount(&self) -> bool {
        self.mount.load(Ordering::Relaxed)
    }

    pub fn toggle_capture(&self) -> bool {
        !self.capture.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn toggle_mount(&self) -> bool {
        !self.mount.fetch_xor(true, Ordering::Relaxed)
    }

    /// Re-sync after a console command performed the equivalent action,
    /// so the next button toggle produces the expected semantic edge.
    pub fn set_capture(&self, desired: bool) {
        self.capture.store(desired, Ordering::Relaxed);
    }

    pub fn set_mount(&self, desired: bool) {
        self.mount.store(desired, Ordering::Relaxed);
    }
}

impl Default for EdgeFlags {
    fn default() -> Self {
        Self::new()
    }
}
