use std::time::Instant;
use serde::{Deserialize, Serialize};


/// Performance of a single search run
/// Only `execution_time_ms` varies between identical runs
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMetrics {
    /// Wall-clock time of the expansion loop, monotonic clock
    pub execution_time_ms: f64,
    /// Nodes popped from the frontier and not skipped as stale
    pub nodes_expanded: usize,
    /// Largest open list size, sampled after every insertion
    pub max_frontier_size: usize,
    /// Estimated peak bytes held by the open list and the best-cost map
    /// Informational only, heap data behind node ids is not counted
    pub peak_memory_bytes: usize,
}

impl SearchMetrics {

    pub fn peak_memory_kb(&self) -> f64 {
        self.peak_memory_bytes as f64 / 1024.0
    }
}


/// Accumulates `SearchMetrics` while the expansion loop runs
#[derive(Debug)]
pub(crate) struct MetricsCollector {
    started: Instant,
    nodes_expanded: usize,
    max_frontier_size: usize,
    peak_memory_bytes: usize,
}

impl MetricsCollector {

    pub(crate) fn start() -> Self {
        Self {
            started: Instant::now(),
            nodes_expanded: 0,
            max_frontier_size: 0,
            peak_memory_bytes: 0,
        }
    }

    pub(crate) fn record_expansion(&mut self) {
        self.nodes_expanded += 1;
    }

    pub(crate) fn record_frontier(&mut self, frontier_len: usize, bytes: usize) {
        self.max_frontier_size = self.max_frontier_size.max(frontier_len);
        self.peak_memory_bytes = self.peak_memory_bytes.max(bytes);
    }

    pub(crate) fn nodes_expanded(&self) -> usize {
        self.nodes_expanded
    }

    pub(crate) fn finish(self) -> SearchMetrics {
        SearchMetrics {
            execution_time_ms: self.started.elapsed().as_secs_f64() * 1000.0,
            nodes_expanded: self.nodes_expanded,
            max_frontier_size: self.max_frontier_size,
            peak_memory_bytes: self.peak_memory_bytes,
        }
    }
}
