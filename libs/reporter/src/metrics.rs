//! Process-wide aggregates registered with `vise`.
//!
//! vise doesn't support exemplars, so [`GlobalMetrics`] always reports
//! plain increments and observations. Histogram buckets are fixed to
//! [`Buckets::LATENCIES`].
use crate::{
    CallLabels, ConfigError, CounterVec, HandledLabels, HandledMetrics, HistogramVec, Role,
    RoleConfig, RoleMetrics,
};
use std::time::Duration;
use vise::{Buckets, Counter, Family, Histogram, Metrics, Unit};

#[derive(Debug, Metrics)]
#[metrics(prefix = "grpc")]
pub(crate) struct GrpcMetrics {
    /// Total number of RPCs started on the server.
    pub(crate) server_started: Family<CallLabels, Counter>,
    /// Total number of RPCs completed on the server, regardless of success or failure.
    pub(crate) server_handled: Family<HandledLabels, Counter>,
    /// Total number of stream messages received by the server.
    pub(crate) server_msg_received: Family<CallLabels, Counter>,
    /// Total number of stream messages sent by the server.
    pub(crate) server_msg_sent: Family<CallLabels, Counter>,
    /// Latency of RPCs handled by the server.
    #[metrics(unit = Unit::Seconds, buckets = Buckets::LATENCIES)]
    pub(crate) server_handling: Family<CallLabels, Histogram<Duration>>,
    /// Latency of receiving a single stream message by the server.
    #[metrics(unit = Unit::Seconds, buckets = Buckets::LATENCIES)]
    pub(crate) server_msg_recv_handling: Family<CallLabels, Histogram<Duration>>,
    /// Latency of sending a single stream message by the server.
    #[metrics(unit = Unit::Seconds, buckets = Buckets::LATENCIES)]
    pub(crate) server_msg_send_handling: Family<CallLabels, Histogram<Duration>>,

    /// Total number of RPCs started by the client.
    pub(crate) client_started: Family<CallLabels, Counter>,
    /// Total number of RPCs completed by the client, regardless of success or failure.
    pub(crate) client_handled: Family<HandledLabels, Counter>,
    /// Total number of stream messages received by the client.
    pub(crate) client_msg_received: Family<CallLabels, Counter>,
    /// Total number of stream messages sent by the client.
    pub(crate) client_msg_sent: Family<CallLabels, Counter>,
    /// Latency of RPCs until the client received the response.
    #[metrics(unit = Unit::Seconds, buckets = Buckets::LATENCIES)]
    pub(crate) client_handling: Family<CallLabels, Histogram<Duration>>,
    /// Latency of receiving a single stream message by the client.
    #[metrics(unit = Unit::Seconds, buckets = Buckets::LATENCIES)]
    pub(crate) client_msg_recv_handling: Family<CallLabels, Histogram<Duration>>,
    /// Latency of sending a single stream message by the client.
    #[metrics(unit = Unit::Seconds, buckets = Buckets::LATENCIES)]
    pub(crate) client_msg_send_handling: Family<CallLabels, Histogram<Duration>>,
}

#[vise::register]
pub(crate) static GRPC_METRICS: vise::Global<GrpcMetrics> = vise::Global::new();

impl CounterVec<CallLabels> for Family<CallLabels, Counter> {
    fn inc(&self, labels: &CallLabels) {
        self[labels].inc();
    }
}

impl CounterVec<HandledLabels> for Family<HandledLabels, Counter> {
    fn inc(&self, labels: &HandledLabels) {
        self[labels].inc();
    }
}

impl HistogramVec<CallLabels> for Family<CallLabels, Histogram<Duration>> {
    fn observe(&self, labels: &CallLabels, value: Duration) {
        self[labels].observe(value);
    }
}

type CallCounters = Family<CallLabels, Counter>;
type CallHistograms = Family<CallLabels, Histogram<Duration>>;

/// Aggregates of one role in the global vise registry.
#[derive(Debug, Clone, Copy)]
pub struct GlobalMetrics {
    role: Role,
    started: &'static CallCounters,
    handled: &'static Family<HandledLabels, Counter>,
    handling: Option<&'static CallHistograms>,
    msg_received: &'static CallCounters,
    msg_sent: &'static CallCounters,
    msg_recv_handling: Option<&'static CallHistograms>,
    msg_send_handling: Option<&'static CallHistograms>,
}

impl GlobalMetrics {
    /// Selects the `role` aggregates, enabling the histograms requested by `cfg`.
    /// Fails if `cfg` asks for exemplars.
    pub fn new(role: Role, cfg: &RoleConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        if cfg.exemplars {
            return Err(ConfigError::ExemplarsUnsupported { role });
        }
        let m: &'static GrpcMetrics = &GRPC_METRICS;
        let (started, handled, handling, msg_received, msg_sent, recv, send) = match role {
            Role::Server => (
                &m.server_started,
                &m.server_handled,
                &m.server_handling,
                &m.server_msg_received,
                &m.server_msg_sent,
                &m.server_msg_recv_handling,
                &m.server_msg_send_handling,
            ),
            Role::Client => (
                &m.client_started,
                &m.client_handled,
                &m.client_handling,
                &m.client_msg_received,
                &m.client_msg_sent,
                &m.client_msg_recv_handling,
                &m.client_msg_send_handling,
            ),
        };
        tracing::debug!(
            %role,
            handling_time_histogram = cfg.handling_time_histogram,
            stream_recv_histogram = cfg.stream_recv_histogram,
            stream_send_histogram = cfg.stream_send_histogram,
            "registered vise call metrics"
        );
        Ok(Self {
            role,
            started,
            handled,
            handling: cfg.handling_time_histogram.then_some(handling),
            msg_received,
            msg_sent,
            msg_recv_handling: cfg.stream_recv_histogram.then_some(recv),
            msg_send_handling: cfg.stream_send_histogram.then_some(send),
        })
    }
}

impl RoleMetrics for GlobalMetrics {
    fn role(&self) -> Role {
        self.role
    }

    fn started(&self) -> &dyn CounterVec<CallLabels> {
        self.started
    }

    fn handled(&self) -> HandledMetrics<'_> {
        HandledMetrics::Plain {
            counter: self.handled,
            latency: self.handling.map(|h| h as &dyn HistogramVec<CallLabels>),
        }
    }

    fn msg_received(&self) -> &dyn CounterVec<CallLabels> {
        self.msg_received
    }

    fn msg_sent(&self) -> &dyn CounterVec<CallLabels> {
        self.msg_sent
    }

    fn msg_recv_latency(&self) -> Option<&dyn HistogramVec<CallLabels>> {
        self.msg_recv_handling.map(|h| h as &dyn HistogramVec<CallLabels>)
    }

    fn msg_send_latency(&self) -> Option<&dyn HistogramVec<CallLabels>> {
        self.msg_send_handling.map(|h| h as &dyn HistogramVec<CallLabels>)
    }
}
