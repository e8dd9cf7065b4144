//! Process-wide atomic counters for DesignForge observability.
//!
//! Counters are bumped silently at the call site. Call [`Metrics::flush`]
//! to emit the current values as one `tracing::info!` event, e.g. when the
//! daemon shuts down.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lock-free generation and orchestration counters.
pub struct Metrics {
    generations_succeeded: AtomicU64,
    generations_failed: AtomicU64,
    variant_runs: AtomicU64,
    selections: AtomicU64,
    comparisons: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            generations_succeeded: AtomicU64::new(0),
            generations_failed: AtomicU64::new(0),
            variant_runs: AtomicU64::new(0),
            selections: AtomicU64::new(0),
            comparisons: AtomicU64::new(0),
        }
    }

    pub fn inc_generations_succeeded(&self) {
        self.generations_succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "generations_succeeded", "counter incremented");
    }

    pub fn inc_generations_failed(&self) {
        self.generations_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "generations_failed", "counter incremented");
    }

    pub fn inc_variant_runs(&self) {
        self.variant_runs.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "variant_runs", "counter incremented");
    }

    pub fn inc_selections(&self) {
        self.selections.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "selections", "counter incremented");
    }

    pub fn inc_comparisons(&self) {
        self.comparisons.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "comparisons", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            generations_succeeded = self.generations_succeeded(),
            generations_failed = self.generations_failed(),
            variant_runs = self.variant_runs(),
            selections = self.selections(),
            comparisons = self.comparisons(),
        );
    }

    pub fn generations_succeeded(&self) -> u64 {
        self.generations_succeeded.load(Ordering::Relaxed)
    }

    pub fn generations_failed(&self) -> u64 {
        self.generations_failed.load(Ordering::Relaxed)
    }

    pub fn variant_runs(&self) -> u64 {
        self.variant_runs.load(Ordering::Relaxed)
    }

    pub fn selections(&self) -> u64 {
        self.selections.load(Ordering::Relaxed)
    }

    pub fn comparisons(&self) -> u64 {
        self.comparisons.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.generations_succeeded.store(0, Ordering::Relaxed);
        self.generations_failed.store(0, Ordering::Relaxed);
        self.variant_runs.store(0, Ordering::Relaxed);
        self.selections.store(0, Ordering::Relaxed);
        self.comparisons.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        m.inc_generations_succeeded();
        m.inc_generations_succeeded();
        m.inc_generations_failed();
        m.inc_variant_runs();
        m.inc_selections();
        m.inc_comparisons();
        m.inc_comparisons();

        assert_eq!(m.generations_succeeded(), 2);
        assert_eq!(m.generations_failed(), 1);
        assert_eq!(m.variant_runs(), 1);
        assert_eq!(m.selections(), 1);
        assert_eq!(m.comparisons(), 2);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_generations_failed();
        m.inc_variant_runs();
        m.reset();
        assert_eq!(m.generations_failed(), 0);
        assert_eq!(m.variant_runs(), 0);
    }
}
