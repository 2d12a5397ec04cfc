//! Core data models for the load scorer

use serde::{Deserialize, Serialize};

/// One timed observation of a container's resource metrics.
///
/// `cpu_load_avg` and `mem_usage_bytes` are instantaneous readings; the
/// remaining fields are cumulative counters that only move backwards when
/// the counter wraps or the container restarts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp_ms: i64,
    pub cpu_load_avg: f64,
    pub mem_usage_bytes: i64,
    pub rx_dropped: i64,
    pub io_time_ms: i64,
    pub read_time_ms: i64,
    pub write_time_ms: i64,
    pub weighted_io_time_ms: i64,
}

/// All samples observed for one container during one polling cycle.
///
/// Samples are ordered by non-decreasing timestamp and the series is
/// non-empty; both are guarantees of the metrics source. A snapshot is
/// built fresh each cycle, scored once, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    pub container_id: String,
    pub memory_limit_bytes: Option<i64>,
    pub samples: Vec<Sample>,
}

/// Final score for one container: the weighted composite scaled by 1000
/// and truncated to three implied decimal digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultStat {
    pub container_id: String,
    pub score: i32,
}

/// One cycle's scores, one row per scored container. Rebuilt every cycle
/// and handed to the exporter whole.
pub type ResultTable = Vec<ResultStat>;
