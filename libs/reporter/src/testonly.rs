//! In-memory aggregates for tests.
use crate::{
    CallLabels, CounterVec, ExemplarCounterVec, ExemplarHistogramVec, ExemplarLabels,
    HandledLabels, HandledMetrics, HistogramVec, MethodIdentity, Role, RoleConfig, RoleMetrics,
    RpcType,
};
use std::{collections::HashMap, hash::Hash, sync::Mutex, time::Duration};

/// Labels of a call, as a reporter would compute them.
pub fn call_labels(rpc_type: RpcType, full_method: &str) -> CallLabels {
    CallLabels::new(rpc_type, MethodIdentity::parse(full_method))
}

/// Counter family recording counts and attached exemplars.
#[derive(Debug)]
pub struct TestCounters<L> {
    counts: Mutex<HashMap<L, u64>>,
    exemplars: Mutex<Vec<(L, ExemplarLabels)>>,
}

impl<L> Default for TestCounters<L> {
    fn default() -> Self {
        Self {
            counts: Mutex::default(),
            exemplars: Mutex::default(),
        }
    }
}

impl<L: Clone + Eq + Hash> TestCounters<L> {
    /// Current value of the `labels` series.
    pub fn get(&self, labels: &L) -> u64 {
        self.counts
            .lock()
            .unwrap()
            .get(labels)
            .copied()
            .unwrap_or(0)
    }

    /// Sum over all series matching `pred`.
    pub fn sum(&self, pred: impl Fn(&L) -> bool) -> u64 {
        self.counts
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| pred(l))
            .map(|(_, v)| *v)
            .sum()
    }

    /// Exemplars attached so far, in order.
    pub fn exemplars(&self) -> Vec<(L, ExemplarLabels)> {
        self.exemplars.lock().unwrap().clone()
    }
}

impl<L: Clone + Eq + Hash + Send> CounterVec<L> for TestCounters<L> {
    fn inc(&self, labels: &L) {
        *self
            .counts
            .lock()
            .unwrap()
            .entry(labels.clone())
            .or_default() += 1;
    }
}

impl<L: Clone + Eq + Hash + Send> ExemplarCounterVec<L> for TestCounters<L> {
    fn inc_with_exemplar(&self, labels: &L, exemplar: &ExemplarLabels) {
        self.inc(labels);
        self.exemplars
            .lock()
            .unwrap()
            .push((labels.clone(), exemplar.clone()));
    }
}

/// Histogram family recording every sample and attached exemplars.
#[derive(Debug)]
pub struct TestHistograms<L> {
    samples: Mutex<HashMap<L, Vec<Duration>>>,
    exemplars: Mutex<Vec<(L, Duration, ExemplarLabels)>>,
}

impl<L> Default for TestHistograms<L> {
    fn default() -> Self {
        Self {
            samples: Mutex::default(),
            exemplars: Mutex::default(),
        }
    }
}

impl<L: Clone + Eq + Hash> TestHistograms<L> {
    /// Samples of the `labels` series, in order of observation.
    pub fn samples(&self, labels: &L) -> Vec<Duration> {
        self.samples
            .lock()
            .unwrap()
            .get(labels)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of samples over all series.
    pub fn total(&self) -> usize {
        self.samples.lock().unwrap().values().map(Vec::len).sum()
    }

    /// Exemplars attached so far, in order.
    pub fn exemplars(&self) -> Vec<(L, Duration, ExemplarLabels)> {
        self.exemplars.lock().unwrap().clone()
    }
}

impl<L: Clone + Eq + Hash + Send> HistogramVec<L> for TestHistograms<L> {
    fn observe(&self, labels: &L, value: Duration) {
        self.samples
            .lock()
            .unwrap()
            .entry(labels.clone())
            .or_default()
            .push(value);
    }
}

impl<L: Clone + Eq + Hash + Send> ExemplarHistogramVec<L> for TestHistograms<L> {
    fn observe_with_exemplar(&self, labels: &L, value: Duration, exemplar: &ExemplarLabels) {
        self.observe(labels, value);
        self.exemplars
            .lock()
            .unwrap()
            .push((labels.clone(), value, exemplar.clone()));
    }
}

/// In-memory aggregates of a single role.
#[derive(Debug)]
pub struct TestMetrics {
    /// Role of the aggregates.
    pub role: Role,
    /// Whether the handled aggregates accept exemplars.
    pub exemplars: bool,
    /// Started calls.
    pub started: TestCounters<CallLabels>,
    /// Handled calls.
    pub handled: TestCounters<HandledLabels>,
    /// Handled latency, `None` if disabled.
    pub handling: Option<TestHistograms<CallLabels>>,
    /// Received stream messages.
    pub msg_received: TestCounters<CallLabels>,
    /// Sent stream messages.
    pub msg_sent: TestCounters<CallLabels>,
    /// Message receive latency, `None` if disabled.
    pub msg_recv_handling: Option<TestHistograms<CallLabels>>,
    /// Message send latency, `None` if disabled.
    pub msg_send_handling: Option<TestHistograms<CallLabels>>,
}

impl TestMetrics {
    /// Aggregates of `role` with histograms and exemplars as requested by `cfg`.
    pub fn new(role: Role, cfg: &RoleConfig) -> Self {
        let histogram = |enabled: bool| enabled.then(TestHistograms::default);
        Self {
            role,
            exemplars: cfg.exemplars,
            started: TestCounters::default(),
            handled: TestCounters::default(),
            handling: histogram(cfg.handling_time_histogram),
            msg_received: TestCounters::default(),
            msg_sent: TestCounters::default(),
            msg_recv_handling: histogram(cfg.stream_recv_histogram),
            msg_send_handling: histogram(cfg.stream_send_histogram),
        }
    }

    /// Number of handled calls of the `labels` series, summed over all codes.
    pub fn handled_total(&self, labels: &CallLabels) -> u64 {
        self.handled.sum(|l| {
            l.grpc_type == labels.grpc_type
                && l.grpc_service == labels.grpc_service
                && l.grpc_method == labels.grpc_method
        })
    }

    /// Samples of the handled latency histogram; empty if disabled.
    pub fn handling_samples(&self, labels: &CallLabels) -> Vec<Duration> {
        self.handling
            .as_ref()
            .map(|h| h.samples(labels))
            .unwrap_or_default()
    }
}

impl RoleMetrics for TestMetrics {
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
