//! Aggregates backed by `prometheus-client`, which can attach exemplars
//! to the handled counter and latency histogram.
//!
//! Families are keyed by the same label structs as the vise aggregates;
//! their `EncodeLabelSet` impls come from the `prometheus-client` version
//! vise is built on.
use crate::{
    CallLabels, ConfigError, CounterVec, ExemplarCounterVec, ExemplarHistogramVec,
    ExemplarLabels, HandledLabels, HandledMetrics, HistogramVec, Role, RoleConfig, RoleMetrics,
};
use prometheus_client::{
    metrics::{
        counter::Counter,
        exemplar::{CounterWithExemplar, HistogramWithExemplars},
        family::{Family, MetricConstructor},
        histogram::Histogram,
    },
    registry::{Registry, Unit},
};
use std::{sync::Arc, time::Duration};

type Exemplar = Vec<(String, String)>;

fn to_exemplar(labels: &ExemplarLabels) -> Exemplar {
    labels
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Constructs histograms with the configured bucket bounds.
#[derive(Debug, Clone)]
struct Buckets(Arc<[f64]>);

impl MetricConstructor<Histogram> for Buckets {
    fn new_metric(&self) -> Histogram {
        Histogram::new(self.0.iter().copied())
    }
}

impl MetricConstructor<HistogramWithExemplars<Exemplar>> for Buckets {
    fn new_metric(&self) -> HistogramWithExemplars<Exemplar> {
        HistogramWithExemplars::new(self.0.iter().copied())
    }
}

#[derive(Debug, Clone, Default)]
struct Counters(Family<CallLabels, Counter>);

impl CounterVec<CallLabels> for Counters {
    fn inc(&self, labels: &CallLabels) {
        self.0.get_or_create(labels).inc();
    }
}

#[derive(Debug, Clone, Default)]
struct HandledCounters(Family<HandledLabels, CounterWithExemplar<Exemplar>>);

impl CounterVec<HandledLabels> for HandledCounters {
    fn inc(&self, labels: &HandledLabels) {
        self.0.get_or_create(labels).inc_by(1, None);
    }
}

impl ExemplarCounterVec<HandledLabels> for HandledCounters {
    fn inc_with_exemplar(&self, labels: &HandledLabels, exemplar: &ExemplarLabels) {
        self.0
            .get_or_create(labels)
            .inc_by(1, Some(to_exemplar(exemplar)));
    }
}

#[derive(Debug, Clone)]
struct Histograms(Family<CallLabels, Histogram, Buckets>);

impl HistogramVec<CallLabels> for Histograms {
    fn observe(&self, labels: &CallLabels, value: Duration) {
        self.0
            .get_or_create(labels)
            .observe(value.as_secs_f64());
    }
}

#[derive(Debug, Clone)]
struct HandledHistograms(Family<CallLabels, HistogramWithExemplars<Exemplar>, Buckets>);

impl HistogramVec<CallLabels> for HandledHistograms {
    fn observe(&self, labels: &CallLabels, value: Duration) {
        self.0
            .get_or_create(labels)
            .observe(value.as_secs_f64(), None);
    }
}

impl ExemplarHistogramVec<CallLabels> for HandledHistograms {
    fn observe_with_exemplar(
        &self,
        labels: &CallLabels,
        value: Duration,
        exemplar: &ExemplarLabels,
    ) {
        self.0
            .get_or_create(labels)
            .observe(value.as_secs_f64(), Some(to_exemplar(exemplar)));
    }
}

/// Aggregates of one role registered in a `prometheus_client` registry.
#[derive(Debug, Clone)]
pub struct ExemplarMetrics {
    role: Role,
    exemplars: bool,
    started: Counters,
    handled: HandledCounters,
    handling: Option<HandledHistograms>,
    msg_received: Counters,
    msg_sent: Counters,
    msg_recv_handling: Option<Histograms>,
    msg_send_handling: Option<Histograms>,
}

impl ExemplarMetrics {
    /// Registers the `role` aggregates requested by `cfg` in `registry`.
    /// Disabled histograms are not registered at all.
    pub fn new(
        role: Role,
        cfg: &RoleConfig,
        registry: &mut Registry,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let buckets = Buckets(cfg.buckets.as_slice().into());
        let name = |suffix: &str| format!("grpc_{role}_{suffix}");

        let started = Counters::default();
        registry.register(
            name("started"),
            "Total number of RPCs started",
            started.0.clone(),
        );
        let handled = HandledCounters::default();
        registry.register(
            name("handled"),
            "Total number of RPCs completed, regardless of success or failure",
            handled.0.clone(),
        );
        let msg_received = Counters::default();
        registry.register(
            name("msg_received"),
            "Total number of stream messages received",
            msg_received.0.clone(),
        );
        let msg_sent = Counters::default();
        registry.register(
            name("msg_sent"),
            "Total number of stream messages sent",
            msg_sent.0.clone(),
        );

        let handling = cfg.handling_time_histogram.then(|| {
            let h = HandledHistograms(Family::new_with_constructor(buckets.clone()));
            registry.register_with_unit(
                name("handling"),
                "Latency of RPCs until completion",
                Unit::Seconds,
                h.0.clone(),
            );
            h
        });
        let mut histogram = |enabled: bool, suffix: &str, help: &str| {
            enabled.then(|| {
                let h = Histograms(Family::new_with_constructor(buckets.clone()));
                registry.register_with_unit(name(suffix), help, Unit::Seconds, h.0.clone());
                h
            })
        };
        let msg_recv_handling = histogram(
            cfg.stream_recv_histogram,
            "msg_recv_handling",
            "Latency of receiving a single stream message",
        );
        let msg_send_handling = histogram(
            cfg.stream_send_histogram,
            "msg_send_handling",
            "Latency of sending a single stream message",
        );

        tracing::debug!(
            %role,
            handling_time_histogram = cfg.handling_time_histogram,
            stream_recv_histogram = cfg.stream_recv_histogram,
            stream_send_histogram = cfg.stream_send_histogram,
            exemplars = cfg.exemplars,
            "registered prometheus call metrics"
        );
        Ok(Self {
            role,
            exemplars: cfg.exemplars,
            started,
            handled,
            handling,
            msg_received,
            msg_sent,
            msg_recv_handling,
            msg_send_handling,
        })
    }
}

impl RoleMetrics for ExemplarMetrics {
    fn role(&self) -> Role {
        self.role
    }

    fn started(&self) -> &dyn CounterVec<CallLabels> {
        &self.started
    }

    fn handled(&self) -> HandledMetrics<'_> {
        if self.exemplars {
            HandledMetrics::WithExemplars {
                counter: &self.handled,
                latency: self
                    .handling
                    .as_ref()
                    .map(|h| h as &dyn ExemplarHistogramVec<CallLabels>),
            }
        } else {
            HandledMetrics::Plain {
                counter: &self.handled,
                latency: self
                    .handling
                    .as_ref()
                    .map(|h| h as &dyn HistogramVec<CallLabels>),
            }
        }
    }

    fn msg_received(&self) -> &dyn CounterVec<CallLabels> {
        &self.msg_received
    }

    fn msg_sent(&self) -> &dyn CounterVec<CallLabels> {
        &self.msg_sent
    }

    fn msg_recv_latency(&self) -> Option<&dyn HistogramVec<CallLabels>> {
        self.msg_recv_handling
            .as_ref()
            .map(|h| h as &dyn HistogramVec<CallLabels>)
    }

    fn msg_send_latency(&self) -> Option<&dyn HistogramVec<CallLabels>> {
        self.msg_send_handling
            .as_ref()
            .map(|h| h as &dyn HistogramVec<CallLabels>)
    }
}
