//! Metrics and observability utilities
//!
//! Provides metrics-rs counters, gauges and histograms for attribution
//! runs with standardized naming conventions. Nothing is exported unless
//! the embedding application installs a recorder.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram,
    gauge, histogram, Unit,
};
use std::time::Instant;

/// Metrics prefix for all CredRank metrics
pub const METRICS_PREFIX: &str = "credrank";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_pagerank_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of PageRank runs"
    );

    describe_histogram!(
        format!("{}_pagerank_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "PageRank run latency in seconds"
    );

    describe_histogram!(
        format!("{}_pagerank_iterations", METRICS_PREFIX),
        Unit::Count,
        "Power iterations performed per run"
    );

    describe_gauge!(
        format!("{}_graph_nodes", METRICS_PREFIX),
        Unit::Count,
        "Nodes in the most recently ranked graph"
    );

    describe_gauge!(
        format!("{}_graph_edges", METRICS_PREFIX),
        Unit::Count,
        "Edges in the most recently ranked graph"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record one PageRank run
pub struct RunMetrics {
    start: Instant,
    node_count: usize,
    edge_count: usize,
}

impl RunMetrics {
    /// Start tracking a run over a graph of the given size
    pub fn start(node_count: usize, edge_count: usize) -> Self {
        Self {
            start: Instant::now(),
            node_count,
            edge_count,
        }
    }

    /// Record run completion
    pub fn finish(self, iterations: usize, status: &str) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_pagerank_runs_total", METRICS_PREFIX),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(format!("{}_pagerank_duration_seconds", METRICS_PREFIX))
            .record(duration);

        histogram!(format!("{}_pagerank_iterations", METRICS_PREFIX))
            .record(iterations as f64);

        gauge!(format!("{}_graph_nodes", METRICS_PREFIX)).set(self.node_count as f64);
        gauge!(format!("{}_graph_edges", METRICS_PREFIX)).set(self.edge_count as f64);
    }
}
