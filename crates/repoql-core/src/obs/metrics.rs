use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// CompileReport
/// Per-thread counters for query compilation.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CompileReport {
    pub compiles_started: u64,
    pub compiles_succeeded: u64,
    pub compiles_failed: u64,

    // Output shape
    pub terms_emitted: u64,
    pub guards_added: u64,
    pub scoped_compiles: u64,

    /// Failure counts keyed by error label.
    pub failures: BTreeMap<String, u64>,
}

// Compilations on different threads never share counters.
thread_local! {
    static STATE: RefCell<CompileReport> = RefCell::new(CompileReport::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&CompileReport) -> R) -> R {
    STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut CompileReport) -> R) -> R {
    STATE.with(|m| f(&mut m.borrow_mut()))
}

pub(crate) fn snapshot() -> CompileReport {
    with_state(Clone::clone)
}

pub(crate) fn reset() {
    with_state_mut(|m| *m = CompileReport::default());
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn reset_clears_counters() {
        with_state_mut(|m| {
            m.compiles_started = 3;
            m.failures.insert("unknown_field".to_string(), 1);
        });

        reset();

        assert_eq!(snapshot(), CompileReport::default());
    }

    #[test]
    fn threads_keep_separate_counters() {
        reset();
        with_state_mut(|m| m.compiles_started = 5);

        let other = thread::spawn(|| {
            with_state_mut(|m| m.compiles_started += 1);
            snapshot().compiles_started
        })
        .join()
        .unwrap();

        assert_eq!(other, 1);
        assert_eq!(snapshot().compiles_started, 5);
    }
}
