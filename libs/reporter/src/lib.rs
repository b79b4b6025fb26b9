//! Per-call metrics reporting for RPC clients and servers.
//!
//! A [`Reporter`] is created by an interceptor when a call starts, is told
//! about stream messages as they flow and is consumed by
//! [`Reporter::handled()`] when the call completes. It updates the
//! aggregates of one [`Role`], exposed through the [`RoleMetrics`] interface:
//!
//! - `started` and `handled` counters, labeled by call shape, service, method
//!   (and status code for `handled`);
//! - `msg_received` / `msg_sent` counters for stream messages;
//! - optional latency histograms for the whole call and for a single message.
//!
//! Clock reads are skipped for disabled histograms. Aggregates which accept
//! exemplars get the labels returned by an [`ExemplarExtractor`] attached to
//! the handled observations.
//!
//! ```ignore
//! let metrics = GlobalMetrics::new(Role::Server, &cfg.server)?;
//! let reporter = Reporter::new(&metrics, RpcType::Unary, "/my.Service/MyMethod", None);
//! let res = handle(req).await;
//! reporter.handled(code_of(&res), &ctx);
//! ```
mod code;
pub mod config;
mod exemplar;
mod labels;
mod method;
mod metrics;
mod registry;
mod reporter;
mod rpc_type;
pub mod testonly;
#[cfg(test)]
mod tests;
mod timer;

pub use crate::{
    code::Code,
    config::{ConfigError, MetricsConfig, RoleConfig},
    exemplar::ExemplarMetrics,
    labels::{CallLabels, HandledLabels},
    method::{MethodIdentity, UNKNOWN},
    metrics::GlobalMetrics,
    registry::{
        CounterVec, ExemplarCounterVec, ExemplarExtractor, ExemplarHistogramVec, ExemplarLabels,
        HandledMetrics, HistogramVec, Role, RoleMetrics,
    },
    reporter::Reporter,
    rpc_type::RpcType,
    timer::Timer,
};
pub use rpcmon_clock::{Clock, ManualClock};
