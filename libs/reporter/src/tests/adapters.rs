use super::*;
use crate::{
    metrics::GRPC_METRICS, ConfigError, ExemplarExtractor, ExemplarMetrics, GlobalMetrics,
    HandledMetrics, RoleMetrics as _,
};
use assert_matches::assert_matches;
use prometheus_client::registry::Registry;
use rpcmon_clock::testonly::abort_on_panic;

fn encode(registry: &Registry) -> String {
    let mut buf = String::new();
    prometheus_client::encoding::text::encode(&mut buf, registry).unwrap();
    buf
}

#[test]
fn exemplar_metrics_register_only_enabled_histograms() {
    abort_on_panic();
    let mut registry = Registry::default();
    let cfg = RoleConfig {
        handling_time_histogram: true,
        ..RoleConfig::default()
    };
    let metrics = ExemplarMetrics::new(Role::Server, &cfg, &mut registry).unwrap();
    assert_matches!(metrics.handled(), HandledMetrics::Plain { latency: Some(_), .. });
    assert!(metrics.msg_recv_latency().is_none());
    assert!(metrics.msg_send_latency().is_none());

    let reporter = Reporter::<_, TestCtx>::new(&metrics, RpcType::Unary, METHOD, None);
    reporter.received_message();
    reporter.handled(Code::Ok, &TestCtx::default());

    let text = encode(&registry);
    assert!(
        text.contains(
            r#"grpc_server_started_total{grpc_type="unary",grpc_service="my.Service",grpc_method="MyMethod"} 1"#
        ),
        "{text}"
    );
    assert!(
        text.contains(
            r#"grpc_server_handled_total{grpc_type="unary",grpc_service="my.Service",grpc_method="MyMethod",grpc_code="OK"} 1"#
        ),
        "{text}"
    );
    assert!(text.contains("grpc_server_msg_received_total{"), "{text}");
    assert!(text.contains("grpc_server_handling_seconds_count{"), "{text}");
    assert!(!text.contains("grpc_server_msg_recv_handling"), "{text}");
    assert!(!text.contains("grpc_server_msg_send_handling"), "{text}");
}

#[test]
fn exemplar_metrics_attach_exemplars() {
    abort_on_panic();
    let mut registry = Registry::default();
    let cfg = RoleConfig {
        handling_time_histogram: true,
        exemplars: true,
        ..RoleConfig::default()
    };
    let metrics = ExemplarMetrics::new(Role::Client, &cfg, &mut registry).unwrap();
    assert_matches!(
        metrics.handled(),
        HandledMetrics::WithExemplars { latency: Some(_), .. }
    );

    let clock = ManualClock::new();
    let extractor: &ExemplarExtractor<'_, TestCtx> = &extract_trace_id;
    let reporter = Reporter::with_clock(
        clock.clone().into(),
        &metrics,
        RpcType::ServerStream,
        METHOD,
        Some(extractor),
    );
    clock.advance(Duration::from_millis(20));
    reporter.handled(Code::Unavailable, &TestCtx::sampled("4bf92f3577b34da6"));

    let text = encode(&registry);
    assert!(
        text.contains(r#"grpc_code="Unavailable"} 1 # {trace_id="4bf92f3577b34da6"}"#),
        "{text}"
    );
    assert!(text.contains("grpc_client_handling_seconds_bucket{"), "{text}");
    assert_eq!(
        2,
        text.matches(r#"# {trace_id="4bf92f3577b34da6"}"#).count(),
        "{text}"
    );
}

#[test]
fn exemplar_metrics_use_configured_buckets() {
    let mut registry = Registry::default();
    let cfg = RoleConfig {
        stream_send_histogram: true,
        buckets: vec![0.5, 2.0],
        ..RoleConfig::default()
    };
    let metrics = ExemplarMetrics::new(Role::Server, &cfg, &mut registry).unwrap();
    let clock = ManualClock::new();
    let reporter = Reporter::<_, TestCtx>::with_clock(
        clock.clone().into(),
        &metrics,
        RpcType::BidiStream,
        METHOD,
        None,
    );
    let timer = reporter.send_message_timer();
    assert!(!timer.is_noop());
    clock.advance(Duration::from_secs(1));
    assert_eq!(Duration::from_secs(1), timer.observe());
    reporter.handled(Code::Ok, &TestCtx::default());

    let text = encode(&registry);
    assert!(text.contains(r#"le="0.5""#), "{text}");
    assert!(text.contains(r#"le="2.0""#), "{text}");
    assert!(!text.contains(r#"le="0.001""#), "{text}");
}

#[test]
fn exemplar_metrics_encode_labels_like_vise() {
    let mut registry = Registry::default();
    let cfg = RoleConfig {
        stream_recv_histogram: true,
        ..RoleConfig::default()
    };
    let metrics = ExemplarMetrics::new(Role::Server, &cfg, &mut registry).unwrap();
    for _ in 0..3 {
        let reporter =
            Reporter::<_, TestCtx>::new(&metrics, RpcType::BidiStream, "/a.B/C", None);
        reporter.receive_message_timer().observe();
        reporter.handled(Code::DeadlineExceeded, &TestCtx::default());
    }

    let text = encode(&registry);
    // Repeated calls land in a single series per label set.
    assert_eq!(
        1,
        text.matches(
            r#"grpc_server_handled_total{grpc_type="bidi_stream",grpc_service="a.B",grpc_method="C",grpc_code="DeadlineExceeded"} 3"#
        )
        .count(),
        "{text}"
    );
    assert!(
        text.contains(
            r#"grpc_server_msg_recv_handling_seconds_count{grpc_type="bidi_stream",grpc_service="a.B",grpc_method="C"} 3"#
        ),
        "{text}"
    );
}

#[test]
fn exemplar_metrics_reject_invalid_buckets() {
    let mut registry = Registry::default();
    let cfg = RoleConfig {
        buckets: vec![],
        ..RoleConfig::default()
    };
    assert_matches!(
        ExemplarMetrics::new(Role::Server, &cfg, &mut registry),
        Err(ConfigError::EmptyBuckets)
    );
}

#[test]
fn global_metrics_count_calls() {
    abort_on_panic();
    // Global metrics are shared between tests; use a method nobody else uses.
    const METHOD: &str = "/global.Test/CountCalls";
    let cfg = RoleConfig {
        handling_time_histogram: true,
        ..RoleConfig::default()
    };
    let metrics = GlobalMetrics::new(Role::Server, &cfg).unwrap();
    assert_eq!(Role::Server, metrics.role());
    assert!(metrics.handled().latency_enabled());
    assert!(metrics.msg_recv_latency().is_none());

    for code in [Code::Ok, Code::Ok, Code::Internal] {
        let reporter = Reporter::<_, TestCtx>::new(&metrics, RpcType::ClientStream, METHOD, None);
        reporter.received_message();
        reporter.received_message();
        reporter.handled(code, &TestCtx::default());
    }

    let labels = call_labels(RpcType::ClientStream, METHOD);
    assert_eq!(3, GRPC_METRICS.server_started[&labels].get());
    assert_eq!(6, GRPC_METRICS.server_msg_received[&labels].get());
    assert_eq!(2, GRPC_METRICS.server_handled[&labels.with_code(Code::Ok)].get());
    assert_eq!(
        1,
        GRPC_METRICS.server_handled[&labels.with_code(Code::Internal)].get()
    );
    // Client aggregates are separate.
    assert_eq!(0, GRPC_METRICS.client_started[&labels].get());
}

#[test]
fn global_metrics_roles_are_disjoint() {
    const METHOD: &str = "/global.Test/Roles";
    let client = GlobalMetrics::new(Role::Client, &RoleConfig::default()).unwrap();
    assert!(!client.handled().latency_enabled());
    let reporter = Reporter::<_, TestCtx>::new(&client, RpcType::Unary, METHOD, None);
    reporter.sent_message();
    reporter.handled(Code::Ok, &TestCtx::default());

    let labels = call_labels(RpcType::Unary, METHOD);
    assert_eq!(1, GRPC_METRICS.client_started[&labels].get());
    assert_eq!(1, GRPC_METRICS.client_msg_sent[&labels].get());
    assert_eq!(0, GRPC_METRICS.server_started[&labels].get());
}
