//! Observability: compile counters and the sink they flow through.
//!
//! Compiler stages never touch `metrics` directly; they emit
//! `MetricsEvent`s through `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::CompileReport;
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset, with_metrics_sink};
