//! Stopwatch bound to a histogram series.
use crate::{CallLabels, HistogramVec};
use rpcmon_clock::Clock;
use std::{
    fmt,
    time::{Duration, Instant},
};

/// Times an operation and records its latency into a histogram series.
/// A timer created for a disabled histogram is a no-op.
/// Borrows the labels and clock of the reporter which started it.
#[must_use = "the latency is only recorded by `observe()`"]
pub struct Timer<'a>(Option<Running<'a>>);

struct Running<'a> {
    histogram: &'a dyn HistogramVec<CallLabels>,
    labels: &'a CallLabels,
    clock: &'a Clock,
    started_at: Instant,
}

impl fmt::Debug for Timer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => f.write_str("Timer::NOOP"),
            Some(t) => f
                .debug_struct("Timer")
                .field("labels", &t.labels)
                .field("started_at", &t.started_at)
                .finish(),
        }
    }
}

impl Timer<'static> {
    /// Timer which records nothing and always reports zero latency.
    pub const NOOP: Self = Self(None);
}

impl<'a> Timer<'a> {
    /// Starts a timer for the `labels` series of `histogram`,
    /// or returns the no-op timer if the histogram is disabled.
    pub(crate) fn start(
        histogram: Option<&'a dyn HistogramVec<CallLabels>>,
        labels: &'a CallLabels,
        clock: &'a Clock,
    ) -> Self {
        let Some(histogram) = histogram else {
            return Timer::NOOP;
        };
        Self(Some(Running {
            histogram,
            labels,
            clock,
            started_at: clock.now(),
        }))
    }

    /// Whether the timer records anything.
    pub fn is_noop(&self) -> bool {
        self.0.is_none()
    }

    /// Stops the timer, records the elapsed time and returns it.
    pub fn observe(self) -> Duration {
        let Some(t) = self.0 else {
            return Duration::ZERO;
        };
        let elapsed = t.clock.since(t.started_at);
        t.histogram.observe(t.labels, elapsed);
        elapsed
    }
}
