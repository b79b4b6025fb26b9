//! Interface of the metrics registry, as consumed by the [`Reporter`](crate::Reporter).
//!
//! The registry owns the aggregates; reporters only increment counters and
//! observe histograms keyed by label sets. Implementations must be safe to use
//! concurrently from any number of calls without external locking.
//!
//! Whether the handled aggregates accept exemplars is decided once, when the
//! registry is constructed, and is visible in the [`HandledMetrics`] variant
//! rather than probed on every call.
use crate::{CallLabels, HandledLabels};
use std::{collections::BTreeMap, fmt, time::Duration};

/// Correlation labels attached to a single observation, e.g. `trace_id`.
pub type ExemplarLabels = BTreeMap<String, String>;

/// Extracts exemplar labels from a call context.
pub type ExemplarExtractor<'a, C> = dyn Fn(&C) -> Option<ExemplarLabels> + Send + Sync + 'a;

/// Side of the call the metrics are collected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The side initiating calls.
    Client,
    /// The side handling calls.
    Server,
}

impl Role {
    /// Name of the role, as used in metric names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Family of counters keyed by `L`.
pub trait CounterVec<L>: Send + Sync {
    /// Increments the counter of the `labels` series by one.
    fn inc(&self, labels: &L);
}

/// Family of counters keyed by `L` which accept exemplars.
pub trait ExemplarCounterVec<L>: CounterVec<L> {
    /// Increments the counter of the `labels` series by one,
    /// attaching `exemplar` to the increment.
    fn inc_with_exemplar(&self, labels: &L, exemplar: &ExemplarLabels);
}

/// Family of histograms keyed by `L`, observing durations in seconds.
pub trait HistogramVec<L>: Send + Sync {
    /// Records `value` into the `labels` series.
    fn observe(&self, labels: &L, value: Duration);
}

/// Family of histograms keyed by `L` which accept exemplars.
pub trait ExemplarHistogramVec<L>: HistogramVec<L> {
    /// Records `value` into the `labels` series, attaching `exemplar` to it.
    fn observe_with_exemplar(&self, labels: &L, value: Duration, exemplar: &ExemplarLabels);
}

/// Aggregates updated when a call completes.
#[derive(Clone, Copy)]
pub enum HandledMetrics<'a> {
    /// Neither aggregate accepts exemplars.
    Plain {
        /// Handled counter.
        counter: &'a dyn CounterVec<HandledLabels>,
        /// Handled latency histogram, `None` if disabled.
        latency: Option<&'a dyn HistogramVec<CallLabels>>,
    },
    /// Both aggregates accept exemplars.
    WithExemplars {
        /// Handled counter.
        counter: &'a dyn ExemplarCounterVec<HandledLabels>,
        /// Handled latency histogram, `None` if disabled.
        latency: Option<&'a dyn ExemplarHistogramVec<CallLabels>>,
    },
}

impl fmt::Debug for HandledMetrics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, latency) = match self {
            Self::Plain { latency, .. } => ("Plain", latency.is_some()),
            Self::WithExemplars { latency, .. } => ("WithExemplars", latency.is_some()),
        };
        f.debug_struct(name).field("latency", &latency).finish()
    }
}

impl HandledMetrics<'_> {
    /// Whether the handled latency histogram is enabled.
    pub fn latency_enabled(&self) -> bool {
        match self {
            Self::Plain { latency, .. } => latency.is_some(),
            Self::WithExemplars { latency, .. } => latency.is_some(),
        }
    }
}

/// Aggregates of a single role. Enabled flags are fixed at construction.
pub trait RoleMetrics: Send + Sync {
    /// Role the aggregates belong to.
    fn role(&self) -> Role;
    /// Counter of started calls.
    fn started(&self) -> &dyn CounterVec<CallLabels>;
    /// Aggregates updated on completion.
    fn handled(&self) -> HandledMetrics<'_>;
    /// Counter of received stream messages.
    fn msg_received(&self) -> &dyn CounterVec<CallLabels>;
    /// Counter of sent stream messages.
    fn msg_sent(&self) -> &dyn CounterVec<CallLabels>;
    /// Histogram of message receive (deserialization) latency, `None` if disabled.
    fn msg_recv_latency(&self) -> Option<&dyn HistogramVec<CallLabels>>;
    /// Histogram of message send (serialization) latency, `None` if disabled.
    fn msg_send_latency(&self) -> Option<&dyn HistogramVec<CallLabels>>;
}
