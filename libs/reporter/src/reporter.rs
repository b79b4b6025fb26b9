//! Per-call reporter.
use crate::{
    CallLabels, Code, ExemplarExtractor, HandledMetrics, MethodIdentity, Role, RoleMetrics,
    RpcType, Timer,
};
use rpcmon_clock::Clock;
use std::{fmt, time::Instant};

/// Reports the lifecycle of a single call into the aggregates of one role.
///
/// Construction counts the call as started. The interceptor then reports
/// stream messages as they flow and finally calls [`Reporter::handled()`],
/// which consumes the reporter. Reporters of different calls may be driven
/// concurrently; a single reporter is driven sequentially by its call.
pub struct Reporter<'a, M: ?Sized, C> {
    metrics: &'a M,
    labels: CallLabels,
    /// Set iff the handled latency histogram is enabled.
    pub(crate) started_at: Option<Instant>,
    extractor: Option<&'a ExemplarExtractor<'a, C>>,
    clock: Clock,
}

impl<M: ?Sized, C> fmt::Debug for Reporter<'_, M, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("labels", &self.labels)
            .field("started_at", &self.started_at)
            .field("extractor", &self.extractor.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a, M: RoleMetrics + ?Sized, C> Reporter<'a, M, C> {
    /// Starts reporting a call of `full_method` (`/service/method`),
    /// measuring time with the real clock.
    pub fn new(
        metrics: &'a M,
        rpc_type: RpcType,
        full_method: &str,
        extractor: Option<&'a ExemplarExtractor<'a, C>>,
    ) -> Self {
        Self::with_clock(Clock::REAL, metrics, rpc_type, full_method, extractor)
    }

    /// Starts reporting a call, measuring time with `clock`.
    pub fn with_clock(
        clock: Clock,
        metrics: &'a M,
        rpc_type: RpcType,
        full_method: &str,
        extractor: Option<&'a ExemplarExtractor<'a, C>>,
    ) -> Self {
        let started_at = metrics
            .handled()
            .latency_enabled()
            .then(|| clock.now());
        let labels = CallLabels::new(rpc_type, MethodIdentity::parse(full_method));
        metrics.started().inc(&labels);
        Self {
            metrics,
            labels,
            started_at,
            extractor,
            clock,
        }
    }

    /// Labels of the call's series.
    pub fn labels(&self) -> &CallLabels {
        &self.labels
    }

    /// Role of the aggregates the call is reported into.
    pub fn role(&self) -> Role {
        self.metrics.role()
    }

    /// Reports a received stream message.
    pub fn received_message(&self) {
        self.metrics.msg_received().inc(&self.labels);
    }

    /// Reports a sent stream message.
    pub fn sent_message(&self) {
        self.metrics.msg_sent().inc(&self.labels);
    }

    /// Starts timing the receipt (deserialization) of a message.
    pub fn receive_message_timer(&self) -> Timer<'_> {
        Timer::start(self.metrics.msg_recv_latency(), &self.labels, &self.clock)
    }

    /// Starts timing the sending (serialization) of a message.
    pub fn send_message_timer(&self) -> Timer<'_> {
        Timer::start(self.metrics.msg_send_latency(), &self.labels, &self.clock)
    }

    /// Reports completion of the call with status `code`.
    ///
    /// If the aggregates accept exemplars, the extractor is invoked once with
    /// `ctx` and the labels it returns are attached to both the counter
    /// increment and the latency observation. An absent or empty label set
    /// falls back to plain reporting.
    pub fn handled(self, code: Code, ctx: &C) {
        tracing::trace!(role = %self.role(), labels = ?self.labels, %code, "call handled");
        let handled = self.labels.with_code(code);
        match self.metrics.handled() {
            HandledMetrics::Plain { counter, latency } => {
                counter.inc(&handled);
                if let (Some(latency), Some(t)) = (latency, self.started_at) {
                    latency.observe(&self.labels, self.clock.since(t));
                }
            }
            HandledMetrics::WithExemplars { counter, latency } => {
                let exemplar = self
                    .extractor
                    .and_then(|extract| extract(ctx))
                    .filter(|labels| !labels.is_empty());
                match &exemplar {
                    Some(exemplar) => counter.inc_with_exemplar(&handled, exemplar),
                    None => counter.inc(&handled),
                }
                if let (Some(latency), Some(t)) = (latency, self.started_at) {
                    let elapsed = self.clock.since(t);
                    match &exemplar {
                        Some(exemplar) => {
                            latency.observe_with_exemplar(&self.labels, elapsed, exemplar)
                        }
                        None => latency.observe(&self.labels, elapsed),
                    }
                }
            }
        }
    }
}
