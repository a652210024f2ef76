//! In-process metrics for indexing and completion
//!
//! Every way a completion query can come back empty (not ready, disposed,
//! unresolved receiver, legitimately no matches) has its own counter, so logs
//! and the probe CLI can tell them apart even though an editor shows nothing
//! in all four cases.
//!
//! ## Design
//!
//! - Lock-free atomic counters for per-keystroke events
//! - DashMap for low-contention timing storage
//! - Each operation keeps only its most recent [`TIMING_WINDOW`] samples

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;

/// Timing samples kept per operation; older samples are dropped
pub const TIMING_WINDOW: usize = 1024;

/// Global metrics registry (singleton)
static METRICS: once_cell::sync::Lazy<Arc<Metrics>> =
    once_cell::sync::Lazy::new(|| Arc::new(Metrics::new()));

/// Get the global metrics instance
pub fn metrics() -> &'static Arc<Metrics> {
    &METRICS
}

/// How a completion query ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryResult {
    Matches,
    NoMatches,
    Unresolved,
    NotReady,
    Disposed,
}

#[derive(Debug)]
pub struct Metrics {
    // Query outcomes
    queries_with_matches: AtomicU64,
    queries_no_matches: AtomicU64,
    queries_unresolved: AtomicU64,
    queries_not_ready: AtomicU64,
    queries_disposed: AtomicU64,

    // Descriptor cache
    descriptor_cache_hits: AtomicU64,
    descriptor_cache_misses: AtomicU64,

    // Loading
    loads_completed: AtomicUsize,
    archives_scanned: AtomicUsize,
    archives_skipped: AtomicUsize,
    classes_indexed: AtomicUsize,

    accepted_suggestions: AtomicU64,

    // Timings (operation name -> recent durations in microseconds)
    operation_timings: DashMap<String, TimingWindow>,
}

#[derive(Debug, Default)]
struct TimingWindow {
    samples: VecDeque<u64>,
    recorded: usize,
}

impl TimingWindow {
    fn push(&mut self, micros: u64) {
        if self.samples.len() == TIMING_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(micros);
        self.recorded += 1;
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            queries_with_matches: AtomicU64::new(0),
            queries_no_matches: AtomicU64::new(0),
            queries_unresolved: AtomicU64::new(0),
            queries_not_ready: AtomicU64::new(0),
            queries_disposed: AtomicU64::new(0),
            descriptor_cache_hits: AtomicU64::new(0),
            descriptor_cache_misses: AtomicU64::new(0),
            loads_completed: AtomicUsize::new(0),
            archives_scanned: AtomicUsize::new(0),
            archives_skipped: AtomicUsize::new(0),
            classes_indexed: AtomicUsize::new(0),
            accepted_suggestions: AtomicU64::new(0),
            operation_timings: DashMap::new(),
        }
    }

    pub fn record_query(&self, result: QueryResult) {
        let counter = match result {
            QueryResult::Matches => &self.queries_with_matches,
            QueryResult::NoMatches => &self.queries_no_matches,
            QueryResult::Unresolved => &self.queries_unresolved,
            QueryResult::NotReady => &self.queries_not_ready,
            QueryResult::Disposed => &self.queries_disposed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_descriptor_cache_hit(&self) {
        self.descriptor_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_descriptor_cache_miss(&self) {
        self.descriptor_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn descriptor_cache_hit_rate(&self) -> f64 {
        let hits = self.descriptor_cache_hits.load(Ordering::Relaxed);
        let misses = self.descriptor_cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Records a finished load pass
    pub fn record_load(&self, scanned: usize, skipped: usize, classes: usize) {
        self.loads_completed.fetch_add(1, Ordering::Relaxed);
        self.archives_scanned.fetch_add(scanned, Ordering::Relaxed);
        self.archives_skipped.fetch_add(skipped, Ordering::Relaxed);
        self.classes_indexed.fetch_add(classes, Ordering::Relaxed);
    }

    pub fn record_accept(&self) {
        self.accepted_suggestions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timing(&self, operation: &str, duration: Duration) {
        let micros = duration.as_micros() as u64;

        self.operation_timings
            .entry(operation.to_string())
            .or_default()
            .push(micros);
    }

    /// Statistics over the most recent samples of `operation`
    pub fn operation_stats(&self, operation: &str) -> Option<OperationStats> {
        self.operation_timings.get(operation).and_then(|timings| {
            let window = timings.value();
            let mut sorted: Vec<u64> = window.samples.iter().copied().collect();
            if sorted.is_empty() {
                return None;
            }
            sorted.sort_unstable();

            let count = sorted.len();
            let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];
            Some(OperationStats {
                recorded: window.recorded,
                count,
                min_micros: sorted[0],
                max_micros: sorted[count - 1],
                mean_micros: sorted.iter().sum::<u64>() / count as u64,
                p50_micros: sorted[count / 2],
                p95_micros: percentile(0.95),
            })
        })
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            queries_with_matches: self.queries_with_matches.load(Ordering::Relaxed),
            queries_no_matches: self.queries_no_matches.load(Ordering::Relaxed),
            queries_unresolved: self.queries_unresolved.load(Ordering::Relaxed),
            queries_not_ready: self.queries_not_ready.load(Ordering::Relaxed),
            queries_disposed: self.queries_disposed.load(Ordering::Relaxed),
            descriptor_cache_hits: self.descriptor_cache_hits.load(Ordering::Relaxed),
            descriptor_cache_misses: self.descriptor_cache_misses.load(Ordering::Relaxed),
            descriptor_cache_hit_rate: self.descriptor_cache_hit_rate(),
            loads_completed: self.loads_completed.load(Ordering::Relaxed),
            archives_scanned: self.archives_scanned.load(Ordering::Relaxed),
            archives_skipped: self.archives_skipped.load(Ordering::Relaxed),
            classes_indexed: self.classes_indexed.load(Ordering::Relaxed),
            accepted_suggestions: self.accepted_suggestions.load(Ordering::Relaxed),
        }
    }

    /// Resets all metrics (useful for testing)
    pub fn reset(&self) {
        for counter in [
            &self.queries_with_matches,
            &self.queries_no_matches,
            &self.queries_unresolved,
            &self.queries_not_ready,
            &self.queries_disposed,
            &self.descriptor_cache_hits,
            &self.descriptor_cache_misses,
            &self.accepted_suggestions,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        for counter in [
            &self.loads_completed,
            &self.archives_scanned,
            &self.archives_skipped,
            &self.classes_indexed,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.operation_timings.clear();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationStats {
    /// Samples ever recorded
    pub recorded: usize,
    /// Samples in the window the statistics are computed over
    pub count: usize,
    pub min_micros: u64,
    pub max_micros: u64,
    pub mean_micros: u64,
    pub p50_micros: u64, // Median
    pub p95_micros: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub queries_with_matches: u64,
    pub queries_no_matches: u64,
    pub queries_unresolved: u64,
    pub queries_not_ready: u64,
    pub queries_disposed: u64,
    pub descriptor_cache_hits: u64,
    pub descriptor_cache_misses: u64,
    pub descriptor_cache_hit_rate: f64,
    pub loads_completed: usize,
    pub archives_scanned: usize,
    pub archives_skipped: usize,
    pub classes_indexed: usize,
    pub accepted_suggestions: u64,
}

/// RAII guard that records the duration of a scope when dropped
///
/// ```
/// use java_completion::metrics::{metrics, TimingGuard};
///
/// {
///     let _guard = TimingGuard::new("doc_example");
/// }
/// assert!(metrics().operation_stats("doc_example").is_some());
/// ```
pub struct TimingGuard {
    operation: &'static str,
    start: Instant,
}

impl TimingGuard {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        metrics().record_timing(self.operation, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_outcomes_are_counted_separately() {
        let m = Metrics::new();
        m.record_query(QueryResult::Matches);
        m.record_query(QueryResult::NotReady);
        m.record_query(QueryResult::NotReady);
        m.record_query(QueryResult::Unresolved);

        let summary = m.summary();
        assert_eq!(summary.queries_with_matches, 1);
        assert_eq!(summary.queries_not_ready, 2);
        assert_eq!(summary.queries_unresolved, 1);
        assert_eq!(summary.queries_no_matches, 0);
        assert_eq!(summary.queries_disposed, 0);
    }

    #[test]
    fn test_descriptor_cache_hit_rate() {
        let m = Metrics::new();
        assert_eq!(m.descriptor_cache_hit_rate(), 0.0);
        m.record_descriptor_cache_hit();
        m.record_descriptor_cache_hit();
        m.record_descriptor_cache_miss();
        assert_eq!(m.descriptor_cache_hit_rate(), 2.0 / 3.0);
    }

    #[test]
    fn test_operation_timing() {
        let m = Metrics::new();
        m.record_timing("load", Duration::from_micros(100));
        m.record_timing("load", Duration::from_micros(200));
        m.record_timing("load", Duration::from_micros(150));

        let stats = m.operation_stats("load").unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.recorded, 3);
        assert_eq!(stats.min_micros, 100);
        assert_eq!(stats.max_micros, 200);
        assert_eq!(stats.mean_micros, 150);
        assert_eq!(stats.p50_micros, 150);
    }

    #[test]
    fn test_timing_samples_are_bounded() {
        let m = Metrics::new();
        for micros in 0..(TIMING_WINDOW as u64 + 500) {
            m.record_timing("suggest", Duration::from_micros(micros));
        }

        let stats = m.operation_stats("suggest").unwrap();
        assert_eq!(stats.recorded, TIMING_WINDOW + 500);
        assert_eq!(stats.count, TIMING_WINDOW);
        // Oldest samples were dropped first
        assert_eq!(stats.min_micros, 500);
        assert_eq!(stats.max_micros, TIMING_WINDOW as u64 + 499);
    }

    #[test]
    fn test_reset() {
        let m = Metrics::new();
        m.record_load(3, 1, 40);
        m.record_accept();
        m.record_timing("load", Duration::from_micros(100));

        m.reset();

        let summary = m.summary();
        assert_eq!(summary.loads_completed, 0);
        assert_eq!(summary.classes_indexed, 0);
        assert_eq!(summary.accepted_suggestions, 0);
        assert!(m.operation_stats("load").is_none());
    }
}
