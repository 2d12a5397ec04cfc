//! Observability infrastructure for the scorer agent
//!
//! Provides:
//! - Prometheus metrics (cycle latency, scored containers, per-container scores)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_gauge, GaugeVec, Histogram, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for cycle latency (in seconds). A cycle includes
/// two HTTP round trips to cAdvisor, so the buckets reach well past a
/// second.
const CYCLE_LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AgentMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct AgentMetricsInner {
    cycle_latency_seconds: Histogram,
    cycles_completed: IntGauge,
    cycles_skipped: IntGauge,
    containers_scored: IntGauge,
    containers_skipped: IntGauge,
    score_clamps: IntGauge,
    counter_memory_entries: IntGauge,
    container_score: GaugeVec,
}

impl AgentMetricsInner {
    fn new() -> Self {
        Self {
            cycle_latency_seconds: register_histogram!(
                "scorer_agent_cycle_latency_seconds",
                "Time spent fetching, scoring, and exporting one cycle",
                CYCLE_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_latency_seconds"),

            cycles_completed: register_int_gauge!(
                "scorer_agent_cycles_completed_total",
                "Total number of cycles that published a score table"
            )
            .expect("Failed to register cycles_completed_total"),

            cycles_skipped: register_int_gauge!(
                "scorer_agent_cycles_skipped_total",
                "Total number of cycles abandoned because the metrics source failed"
            )
            .expect("Failed to register cycles_skipped_total"),

            containers_scored: register_int_gauge!(
                "scorer_agent_containers_scored",
                "Number of containers scored in the most recent cycle"
            )
            .expect("Failed to register containers_scored"),

            containers_skipped: register_int_gauge!(
                "scorer_agent_containers_skipped_total",
                "Total number of containers skipped for a cycle due to unusable samples"
            )
            .expect("Failed to register containers_skipped_total"),

            score_clamps: register_int_gauge!(
                "scorer_agent_score_clamps_total",
                "Total number of negative composite scores clamped to zero"
            )
            .expect("Failed to register score_clamps_total"),

            counter_memory_entries: register_int_gauge!(
                "scorer_agent_counter_memory_entries",
                "Number of containers with remembered counter values"
            )
            .expect("Failed to register counter_memory_entries"),

            container_score: register_gauge_vec!(
                "scorer_agent_container_score",
                "Load score of a container as published in the current table",
                &["container_id"]
            )
            .expect("Failed to register container_score"),
        }
    }
}

/// Agent metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct AgentMetrics {
    // This is just a marker - we use the global instance
    _private: (),
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AgentMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record a full-cycle latency observation
    pub fn observe_cycle_latency(&self, duration_secs: f64) {
        self.inner().cycle_latency_seconds.observe(duration_secs);
    }

    /// Increment completed-cycle counter
    pub fn inc_cycles_completed(&self) {
        self.inner().cycles_completed.inc();
    }

    /// Increment skipped-cycle counter
    pub fn inc_cycles_skipped(&self) {
        self.inner().cycles_skipped.inc();
    }

    /// Update the scored-containers gauge for the latest cycle
    pub fn set_containers_scored(&self, count: i64) {
        self.inner().containers_scored.set(count);
    }

    /// Increment the skipped-container counter
    pub fn inc_containers_skipped(&self) {
        self.inner().containers_skipped.inc();
    }

    /// Increment the negative-score clamp counter
    pub fn inc_score_clamps(&self) {
        self.inner().score_clamps.inc();
    }

    /// Current value of the negative-score clamp counter
    pub fn score_clamps_total(&self) -> i64 {
        self.inner().score_clamps.get()
    }

    /// Update the counter-memory entries gauge
    pub fn set_counter_memory_entries(&self, count: i64) {
        self.inner().counter_memory_entries.set(count);
    }

    /// Replace the per-container score gauges with a fresh table
    pub fn replace_container_scores<'a>(&self, scores: impl IntoIterator<Item = (&'a str, i32)>) {
        let gauge = &self.inner().container_score;
        gauge.reset();
        for (container_id, score) in scores {
            gauge.with_label_values(&[container_id]).set(score as f64);
        }
    }
}

/// Structured logger for agent events
///
/// Provides consistent JSON-formatted logging for cycles and lifecycle
/// events, keyed by the node the agent runs on.
#[derive(Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    /// Log a completed scoring cycle
    pub fn log_cycle(&self, containers_scored: usize, containers_skipped: usize, elapsed_ms: u128) {
        info!(
            event = "cycle_completed",
            node = %self.node_name,
            containers_scored = containers_scored,
            containers_skipped = containers_skipped,
            elapsed_ms = elapsed_ms,
            "Scoring cycle complete"
        );
    }

    /// Log a cycle abandoned because the metrics source failed
    pub fn log_cycle_skipped(&self, error: &str) {
        warn!(
            event = "cycle_skipped",
            node = %self.node_name,
            error = %error,
            "Metrics source unavailable, skipping cycle"
        );
    }

    /// Log agent startup
    pub fn log_startup(&self, version: &str) {
        info!(
            event = "agent_started",
            node = %self.node_name,
            agent_version = %version,
            "Scorer agent started"
        );
    }

    /// Log agent shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            node = %self.node_name,
            reason = %reason,
            "Scorer agent shutting down"
        );
    }
}
