//! Non-global monotonic clock used to time RPC calls.
//!
//! Code which reads the system clock directly is non-hermetic, which makes
//! latency measurements hard to test. Reporters take a [`Clock`] instead, so
//! that tests can substitute a [`ManualClock`] and advance time explicitly.
//!
//! Only the monotonic clock (aka POSIX `CLOCK_MONOTONIC`, aka
//! [`std::time::Instant`]) is provided: latency is measured by the machine
//! doing the call, so wall-clock (UTC) reads are never needed.
use once_cell::sync::Lazy;
use std::{
    fmt,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

pub mod testonly;
#[cfg(test)]
mod tests;

// Instant doesn't have a deterministic constructor.
// We snapshot Instant::now() once and treat it as the origin of all manual clocks.
static MANUAL_CLOCK_START: Lazy<Instant> = Lazy::new(Instant::now);

/// Realtime clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Current time according to the monotone clock.
    pub fn now(&self) -> Instant {
        // We use `now()` from tokio, so that `tokio::time::pause()`
        // works in tests.
        tokio::time::Instant::now().into_std()
    }
}

/// Fake clock which supports manually advancing the time.
/// Clones share the same underlying time.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<Instant>>);

impl fmt::Debug for ManualClock {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("ManualClock")
            .field(&self.elapsed())
            .finish()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Constructs a manual clock. Time doesn't move until `advance()` is called.
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(*MANUAL_CLOCK_START)))
    }

    /// Current time according to the monotone clock.
    pub fn now(&self) -> Instant {
        *self.0.lock().unwrap()
    }

    /// Total time this clock has been advanced by.
    pub fn elapsed(&self) -> Duration {
        self.now() - *MANUAL_CLOCK_START
    }

    /// Advances the clock by `d`.
    pub fn advance(&self, d: Duration) {
        *self.0.lock().unwrap() += d;
    }

    /// Advances the clock to `t`.
    /// Noop if `t` is already in the past.
    pub fn advance_until(&self, t: Instant) {
        let mut now = self.0.lock().unwrap();
        if t > *now {
            *now = t;
        }
    }
}

/// An abstract clock.
/// We use a concrete enum rather than a trait to
/// avoid abstract method call in runtime.
#[derive(Debug, Clone)]
pub enum Clock {
    /// Realtime clock.
    Real(RealClock),
    /// Manual clock.
    Manual(ManualClock),
}

impl Default for Clock {
    fn default() -> Self {
        Self::REAL
    }
}

impl From<RealClock> for Clock {
    fn from(c: RealClock) -> Self {
        Self::Real(c)
    }
}

impl From<ManualClock> for Clock {
    fn from(c: ManualClock) -> Self {
        Self::Manual(c)
    }
}

impl Clock {
    /// The realtime clock.
    pub const REAL: Self = Self::Real(RealClock);

    /// Current time according to the monotone clock.
    pub fn now(&self) -> Instant {
        match self {
            Self::Real(c) => c.now(),
            Self::Manual(c) => c.now(),
        }
    }

    /// Time elapsed since `t`. Saturates to zero if `t` is in the future.
    pub fn since(&self, t: Instant) -> Duration {
        self.now().saturating_duration_since(t)
    }
}
