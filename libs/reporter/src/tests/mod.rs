use crate::{
    testonly::{call_labels, TestMetrics},
    Code, ExemplarLabels, ManualClock, Reporter, Role, RoleConfig, RpcType,
};
use std::time::Duration;

mod adapters;

const METHOD: &str = "/my.Service/MyMethod";

/// Call context used by the tests: carries the trace id of the call, if sampled.
#[derive(Debug, Default)]
struct TestCtx {
    trace_id: Option<String>,
}

impl TestCtx {
    fn sampled(trace_id: &str) -> Self {
        Self {
            trace_id: Some(trace_id.to_owned()),
        }
    }
}

fn extract_trace_id(ctx: &TestCtx) -> Option<ExemplarLabels> {
    let trace_id = ctx.trace_id.as_ref()?;
    Some([("trace_id".to_owned(), trace_id.clone())].into())
}

fn exemplar(trace_id: &str) -> ExemplarLabels {
    [("trace_id".to_owned(), trace_id.to_owned())].into()
}

fn server_metrics(cfg: RoleConfig) -> TestMetrics {
    TestMetrics::new(Role::Server, &cfg)
}

/// Runs a complete call of `rpc_type` against `metrics`, with `recv` received
/// and `send` sent messages, taking `latency` of manual clock time.
fn run_call(
    metrics: &TestMetrics,
    clock: &ManualClock,
    rpc_type: RpcType,
    (recv, send): (usize, usize),
    latency: Duration,
    code: Code,
) {
    let reporter =
        Reporter::<_, TestCtx>::with_clock(clock.clone().into(), metrics, rpc_type, METHOD, None);
    for _ in 0..recv {
        reporter.received_message();
    }
    for _ in 0..send {
        reporter.sent_message();
    }
    clock.advance(latency);
    reporter.handled(code, &TestCtx::default());
}
