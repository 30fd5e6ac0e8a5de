// crates/profile-updater-core/src/runtime/clock.rs
// ============================================================================
// Module: System Clock
// Description: Production clock backed by the OS monotonic timer.
// Purpose: Supply real time and real sleeps to the rate-limited caller.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! [`SystemClock`] measures time from its own creation with [`Instant`] and
//! sleeps the calling thread.

use std::time::Duration;
use std::time::Instant;

use crate::interfaces::Clock;

/// Clock backed by [`Instant`] and [`std::thread::sleep`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    /// Reference point for [`Clock::now`].
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose origin is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
