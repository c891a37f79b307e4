//! Metrics sink boundary.
//!
//! All compile instrumentation flows through `MetricsEvent` and
//! `MetricsSink`. This module is the only bridge between compiler stages and
//! the global counters.

use crate::obs::metrics::{self, CompileReport};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    CompileStart,
    CompileFinish {
        terms: u64,
        guarded: bool,
        scoped: bool,
    },
    CompileFailed {
        kind: &'static str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

///
/// GlobalMetricsSink
/// Default sink, feeding the calling thread's counters when no scoped
/// override is installed.
///

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::CompileStart => {
                m.compiles_started = m.compiles_started.saturating_add(1);
            }
            MetricsEvent::CompileFinish {
                terms,
                guarded,
                scoped,
            } => {
                m.compiles_succeeded = m.compiles_succeeded.saturating_add(1);
                m.terms_emitted = m.terms_emitted.saturating_add(terms);
                if guarded {
                    m.guards_added = m.guards_added.saturating_add(1);
                }
                if scoped {
                    m.scoped_compiles = m.scoped_compiles.saturating_add(1);
                }
            }
            MetricsEvent::CompileFailed { kind } => {
                m.compiles_failed = m.compiles_failed.saturating_add(1);
                let entry = m.failures.entry(kind.to_string()).or_default();
                *entry = entry.saturating_add(1);
            }
        });
    }
}

pub(crate) fn record(event: MetricsEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GlobalMetricsSink.record(event),
    }
}

/// Snapshot the compile counters of the calling thread.
#[must_use]
pub fn metrics_report() -> CompileReport {
    metrics::snapshot()
}

/// Reset the compile counters of the calling thread.
pub fn metrics_reset() {
    metrics::reset();
}

/// Run a closure with `sink` receiving every event recorded on this thread.
/// The previous sink is restored on exit, including unwinds.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| *cell.borrow_mut() = prev);
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///
