//! Monotonic clock sources.
//!
//! All deadline and heartbeat arithmetic uses a [`Clock`]; wall-clock time
//! is never consulted. The clock is an injected collaborator so tests can
//! drive time manually.

use crate::types::Time;
use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A monotonic, non-decreasing time source.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> Time;
}

/// Production clock backed by [`Instant`].
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Creates a clock with its origin at construction time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Time {
        let nanos = u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX);
        Time::from_nanos(nanos)
    }
}

/// Manually driven clock for deterministic tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_nanos: AtomicU64,
}

impl ManualClock {
    /// Creates a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by the given number of milliseconds.
    pub fn advance_millis(&self, millis: u64) {
        self.now_nanos
            .fetch_add(millis.saturating_mul(1_000_000), Ordering::AcqRel);
    }

    /// Sets the clock to an absolute millisecond value.
    ///
    /// The clock never moves backwards; earlier values are ignored.
    pub fn set_millis(&self, millis: u64) {
        let target = millis.saturating_mul(1_000_000);
        self.now_nanos.fetch_max(target, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Time {
        Time::from_nanos(self.now_nanos.load(Ordering::Acquire))
    }
}
