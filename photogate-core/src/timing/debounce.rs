//! Shared debounce gate
//!
//! One gate serves the sensor and both manual buttons: all three drive
//! the same logical "edge detected" stream, so an accepted edge from
//! any source opens a dead window for all of them. A rejected edge
//! leaves the gate untouched, which means sustained chatter cannot keep
//! extending the window.

use crate::clock;

/// Debounce gate over a shared last-accepted timestamp
#[derive(Debug, Clone)]
pub struct DebounceGate {
    window_us: u32,
    last_accepted_us: Option<u32>,
}

impl DebounceGate {
    /// Create a gate with the given window in milliseconds
    pub fn new(window_ms: u32) -> Self {
        Self {
            window_us: window_ms.saturating_mul(1_000),
            last_accepted_us: None,
        }
    }

    /// Check an edge against the window
    ///
    /// Accepting records the timestamp; rejecting changes nothing.
    pub fn check(&mut self, now_us: u32) -> bool {
        if let Some(last) = self.last_accepted_us {
            if clock::ticks_diff_us(now_us, last) < self.window_us {
                return false;
            }
        }
        self.last_accepted_us = Some(now_us);
        true
    }

    /// Forget the last accepted edge
    pub fn reset(&mut self) {
        self.last_accepted_us = None;
    }
}
