//! Weighted composite scoring of one container snapshot
//!
//! The engine averages the gauge metrics, normalizes memory against the
//! effective capacity, forms cross-cycle deltas for the cumulative
//! counters, and combines everything into one fixed-point score for the
//! load balancer.

use crate::models::ContainerSnapshot;
use crate::observability::AgentMetrics;
use crate::scoring::{CounterMemory, CounterSet, WeightConfig};
use tracing::warn;

/// Factor applied to the composite before truncating to an integer.
/// The exported representation carries three implied decimal digits.
const SCORE_SCALE: f64 = 1000.0;

/// Reduces a container's sample series to a single load score.
///
/// Weights are fixed at construction. The engine is cheap to share by
/// reference; all cross-cycle state lives in the [`CounterMemory`]
/// passed to [`score`](Self::score).
pub struct ScoreEngine {
    weights: WeightConfig,
    metrics: AgentMetrics,
}

impl ScoreEngine {
    pub fn new(weights: WeightConfig) -> Self {
        Self {
            weights,
            metrics: AgentMetrics::new(),
        }
    }

    pub fn weights(&self) -> &WeightConfig {
        &self.weights
    }

    /// Score one snapshot and remember its latest counter values.
    ///
    /// Returns `None` for an empty sample series (a contract violation
    /// by the metrics source); the container is then skipped for the
    /// cycle rather than scored as zero. Counter memory for the
    /// container is always updated to the last sample's values, even
    /// when a counter moved backwards.
    pub fn score(
        &self,
        snapshot: &ContainerSnapshot,
        machine_memory_bytes: Option<i64>,
        counters: &CounterMemory,
    ) -> Option<i32> {
        let samples = &snapshot.samples;
        let first = samples.first()?;
        let last = samples.last()?;
        let count = samples.len() as f64;

        let avg_cpu_load = samples.iter().map(|s| s.cpu_load_avg).sum::<f64>() / count;
        let avg_mem_usage = samples.iter().map(|s| s.mem_usage_bytes as f64).sum::<f64>() / count;

        let capacity = effective_capacity(machine_memory_bytes, snapshot.memory_limit_bytes);
        let norm_mem_usage = avg_mem_usage / (capacity as f64 / 100.0);

        let latest = CounterSet {
            rx_dropped: last.rx_dropped,
            io_time_ms: last.io_time_ms,
            read_time_ms: last.read_time_ms,
            write_time_ms: last.write_time_ms,
            weighted_io_time_ms: last.weighted_io_time_ms,
        };
        let previous = counters.update(&snapshot.container_id, latest);

        let delta_rx_dropped = counter_delta(last.rx_dropped, first.rx_dropped, previous.rx_dropped);
        let delta_io_time = counter_delta(last.io_time_ms, first.io_time_ms, previous.io_time_ms);
        let delta_read_time =
            counter_delta(last.read_time_ms, first.read_time_ms, previous.read_time_ms);
        let delta_write_time =
            counter_delta(last.write_time_ms, first.write_time_ms, previous.write_time_ms);
        let delta_weighted_io_time = counter_delta(
            last.weighted_io_time_ms,
            first.weighted_io_time_ms,
            previous.weighted_io_time_ms,
        );

        let w = &self.weights;
        let composite = w.cpu_load_avg * avg_cpu_load
            + w.mem_usage * norm_mem_usage
            + w.rx_dropped * delta_rx_dropped as f64
            + w.io_time * delta_io_time as f64
            + w.read_time * delta_read_time as f64
            + w.write_time * delta_write_time as f64
            + w.weighted_io_time * delta_weighted_io_time as f64;

        let scaled = composite * SCORE_SCALE;
        if scaled < 0.0 {
            warn!(
                container_id = %snapshot.container_id,
                composite,
                "negative composite score clamped to zero, likely a counter reset"
            );
            self.metrics.inc_score_clamps();
            return Some(0);
        }

        // `as` truncates toward zero and saturates at i32::MAX.
        Some(scaled as i32)
    }
}

/// Delta of a cumulative counter since the previous cycle.
///
/// A remembered value of zero means the counter was never recorded, so
/// the delta falls back to the span within this cycle's samples. No
/// correction for wraparound or container restart; the caller clamps a
/// negative composite at the export boundary.
fn counter_delta(latest: i64, oldest: i64, remembered: i64) -> i64 {
    if remembered == 0 {
        latest - oldest
    } else {
        latest - remembered
    }
}

/// Divisor for memory normalization: the smaller of the machine
/// capacity and the container limit when both are known and positive,
/// whichever is known otherwise, and 1 when neither is. The degenerate
/// divisor of one byte produces a very large normalized value; this
/// follows the documented behavior rather than correcting it.
fn effective_capacity(machine: Option<i64>, limit: Option<i64>) -> i64 {
    let machine = machine.filter(|v| *v > 0);
    let limit = limit.filter(|v| *v > 0);
    match (machine, limit) {
        (Some(m), Some(l)) => m.min(l),
        (Some(m), None) => m,
        (None, Some(l)) => l,
        (None, None) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sample;

    fn sample(timestamp_ms: i64) -> Sample {
        Sample {
            timestamp_ms,
            cpu_load_avg: 0.0,
            mem_usage_bytes: 0,
            rx_dropped: 0,
            io_time_ms: 0,
            read_time_ms: 0,
            write_time_ms: 0,
            weighted_io_time_ms: 0,
        }
    }

    fn snapshot(container_id: &str, samples: Vec<Sample>) -> ContainerSnapshot {
        ContainerSnapshot {
            container_id: container_id.to_string(),
            memory_limit_bytes: None,
            samples,
        }
    }

    /// Weights that isolate a single dimension.
    fn only(set: impl Fn(&mut WeightConfig)) -> WeightConfig {
        let mut w = WeightConfig {
            cpu_load_avg: 0.0,
            mem_usage: 0.0,
            rx_dropped: 0.0,
            io_time: 0.0,
            read_time: 0.0,
            write_time: 0.0,
            weighted_io_time: 0.0,
        };
        set(&mut w);
        w
    }

    #[test]
    fn test_first_cycle_delta_uses_intra_cycle_span() {
        let engine = ScoreEngine::new(only(|w| w.rx_dropped = 1.0));
        let counters = CounterMemory::new();

        let mut s1 = sample(1_000);
        s1.rx_dropped = 10;
        let mut s2 = sample(2_000);
        s2.rx_dropped = 25;

        let score = engine
            .score(&snapshot("c1", vec![s1, s2]), None, &counters)
            .unwrap();

        // delta 15, weight 1.0, scaled by 1000
        assert_eq!(score, 15_000);
        assert_eq!(counters.get("c1").rx_dropped, 25);
    }

    #[test]
    fn test_subsequent_cycle_delta_spans_the_gap() {
        let engine = ScoreEngine::new(only(|w| w.rx_dropped = 1.0));
        let counters = CounterMemory::new();
        counters.update(
            "c1",
            CounterSet {
                rx_dropped: 25,
                ..Default::default()
            },
        );

        let mut s1 = sample(1_000);
        s1.rx_dropped = 30;
        let mut s2 = sample(2_000);
        s2.rx_dropped = 50;

        let score = engine
            .score(&snapshot("c1", vec![s1, s2]), None, &counters)
            .unwrap();

        // 50 - 25, ignoring this cycle's own oldest value
        assert_eq!(score, 25_000);
        assert_eq!(counters.get("c1").rx_dropped, 50);
    }

    #[test]
    fn test_memory_normalizes_against_smaller_capacity() {
        let engine = ScoreEngine::new(only(|w| w.mem_usage = 1.0));
        let counters = CounterMemory::new();

        let mut s = sample(1_000);
        s.mem_usage_bytes = 250;
        let mut snap = snapshot("c1", vec![s]);
        snap.memory_limit_bytes = Some(500);

        let score = engine.score(&snap, Some(1_000), &counters).unwrap();

        // 250 / (500 / 100.0) = 50.0
        assert_eq!(score, 50_000);
    }

    #[test]
    fn test_memory_uses_whichever_capacity_is_known() {
        let engine = ScoreEngine::new(only(|w| w.mem_usage = 1.0));
        let counters = CounterMemory::new();

        let mut s = sample(1_000);
        s.mem_usage_bytes = 250;

        let from_machine = engine
            .score(&snapshot("m", vec![s]), Some(1_000), &counters)
            .unwrap();
        assert_eq!(from_machine, 25_000);

        let mut snap = snapshot("l", vec![s]);
        snap.memory_limit_bytes = Some(500);
        let from_limit = engine.score(&snap, None, &counters).unwrap();
        assert_eq!(from_limit, 50_000);
    }

    #[test]
    fn test_degenerate_capacity_divides_by_one() {
        let engine = ScoreEngine::new(only(|w| w.mem_usage = 1.0));
        let counters = CounterMemory::new();

        let mut s = sample(1_000);
        s.mem_usage_bytes = 3;

        let score = engine
            .score(&snapshot("c1", vec![s]), None, &counters)
            .unwrap();

        // 3 / (1 / 100.0) = 300.0
        assert_eq!(score, 300_000);
    }

    #[test]
    fn test_negative_composite_clamps_to_zero_with_signal() {
        let engine = ScoreEngine::new(only(|w| w.io_time = 1.0));
        let counters = CounterMemory::new();
        counters.update(
            "c1",
            CounterSet {
                io_time_ms: 1_000,
                ..Default::default()
            },
        );
        let clamps_before = engine.metrics.score_clamps_total();

        // Counter moved backwards, as after a container restart.
        let mut s = sample(1_000);
        s.io_time_ms = 995;

        let score = engine
            .score(&snapshot("c1", vec![s]), None, &counters)
            .unwrap();

        assert_eq!(score, 0);
        assert_eq!(engine.metrics.score_clamps_total(), clamps_before + 1);
        // Memory still advances to the latest value.
        assert_eq!(counters.get("c1").io_time_ms, 995);
    }

    #[test]
    fn test_score_truncates_at_three_implied_decimals() {
        let engine = ScoreEngine::new(only(|w| w.cpu_load_avg = 1.0));
        let counters = CounterMemory::new();

        let mut s = sample(1_000);
        s.cpu_load_avg = 1.2345;

        let score = engine
            .score(&snapshot("c1", vec![s]), None, &counters)
            .unwrap();

        assert_eq!(score, 1_234);
    }

    #[test]
    fn test_oversized_composite_saturates() {
        let engine = ScoreEngine::new(only(|w| w.cpu_load_avg = 1.0));
        let counters = CounterMemory::new();

        let mut s = sample(1_000);
        s.cpu_load_avg = f64::MAX;

        let score = engine
            .score(&snapshot("c1", vec![s]), None, &counters)
            .unwrap();

        assert_eq!(score, i32::MAX);
    }

    #[test]
    fn test_gauges_are_averaged_over_the_series() {
        let engine = ScoreEngine::new(only(|w| w.cpu_load_avg = 1.0));
        let counters = CounterMemory::new();

        let mut s1 = sample(1_000);
        s1.cpu_load_avg = 1.0;
        let mut s2 = sample(2_000);
        s2.cpu_load_avg = 3.0;

        let score = engine
            .score(&snapshot("c1", vec![s1, s2]), None, &counters)
            .unwrap();

        assert_eq!(score, 2_000);
    }

    #[test]
    fn test_no_cross_container_leakage() {
        let engine = ScoreEngine::new(only(|w| w.rx_dropped = 1.0));
        let counters = CounterMemory::new();
        counters.update(
            "seen",
            CounterSet {
                rx_dropped: 40,
                ..Default::default()
            },
        );

        let mut fresh = sample(1_000);
        fresh.rx_dropped = 10;
        let mut fresh_last = sample(2_000);
        fresh_last.rx_dropped = 25;

        let mut seen = sample(1_000);
        seen.rx_dropped = 45;
        let mut seen_last = sample(2_000);
        seen_last.rx_dropped = 50;

        let fresh_score = engine
            .score(&snapshot("fresh", vec![fresh, fresh_last]), None, &counters)
            .unwrap();
        let seen_score = engine
            .score(&snapshot("seen", vec![seen, seen_last]), None, &counters)
            .unwrap();

        // fresh falls back to its own span, seen uses its remembered value
        assert_eq!(fresh_score, 15_000);
        assert_eq!(seen_score, 10_000);
        assert_eq!(counters.get("fresh").rx_dropped, 25);
        assert_eq!(counters.get("seen").rx_dropped, 50);
    }

    #[test]
    fn test_empty_sample_series_declines() {
        let engine = ScoreEngine::new(WeightConfig::default());
        let counters = CounterMemory::new();

        assert!(engine.score(&snapshot("c1", vec![]), None, &counters).is_none());
        assert!(counters.is_empty());
    }
}
