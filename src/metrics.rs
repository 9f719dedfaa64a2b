use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

/// Global runtime metrics for the collector.
///
/// Purpose:
/// - Count cycles and their outcome
/// - Record which fallback tier each collection ended in
/// - Record why live collection failed
///
/// Design:
/// - Lock-free (Atomics)
/// - Observability only, holds no client state
#[derive(Default)]
pub struct RuntimeMetrics {
    // Cycles
    pub cycles_completed: AtomicUsize,
    pub cycles_failed: AtomicUsize,

    // Collection outcome per channel
    pub live_collections: AtomicUsize,
    pub cache_fallbacks: AtomicUsize,
    pub zeroed_fallbacks: AtomicUsize,
    pub collector_timeouts: AtomicUsize,

    // Failure reasons
    pub sessions_not_found: AtomicUsize,
    pub execution_timeouts: AtomicUsize,
    pub transport_errors: AtomicUsize,
    pub script_exceptions: AtomicUsize,
    pub empty_extractions: AtomicUsize,
    pub records_dropped: AtomicUsize,
    pub cache_corrupt: AtomicUsize,
    pub cache_write_errors: AtomicUsize,
}

impl RuntimeMetrics {
    /// One-line report in `key=value` form.
    pub fn report(&self) -> String {
        let get = |c: &AtomicUsize| c.load(Ordering::Relaxed);
        format!(
            "[METRICS] cycles={} failed={} live={} cached={} zeroed={} collector_timeouts={} \
             no_session={} exec_timeout={} transport={} script_exc={} empty={} dropped={} \
             cache_corrupt={} cache_write_err={}",
            get(&self.cycles_completed),
            get(&self.cycles_failed),
            get(&self.live_collections),
            get(&self.cache_fallbacks),
            get(&self.zeroed_fallbacks),
            get(&self.collector_timeouts),
            get(&self.sessions_not_found),
            get(&self.execution_timeouts),
            get(&self.transport_errors),
            get(&self.script_exceptions),
            get(&self.empty_extractions),
            get(&self.records_dropped),
            get(&self.cache_corrupt),
            get(&self.cache_write_errors),
        )
    }
}

/// Global metrics registry (singleton)
pub static METRICS: Lazy<Arc<RuntimeMetrics>> =
    Lazy::new(|| Arc::new(RuntimeMetrics::default()));

pub fn incr(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::Relaxed);
}

pub fn add(counter: &AtomicUsize, n: usize) {
    counter.fetch_add(n, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_incr() {
        let metrics = RuntimeMetrics::default();
        add(&metrics.records_dropped, 3);
        incr(&metrics.records_dropped);
        assert_eq!(metrics.records_dropped.load(Ordering::Relaxed), 4);
        assert!(metrics.report().contains(" dropped=4 "));
    }
}
