//! Scoring cycle scheduler
//!
//! Drives the fetch-score-export cadence. The whole cycle body runs
//! inline between ticks, so cycle N+1 can never start before cycle N
//! has fully finished exporting; that strict non-overlap is what makes
//! the shared counter memory safe with one read-then-write per
//! container per cycle. Shutdown is honored while idle and while
//! fetching (the fetch is abandoned), never while scoring or exporting.

use crate::export::ScoreExporter;
use crate::health::{components, HealthRegistry};
use crate::models::{ResultStat, ResultTable};
use crate::observability::{AgentMetrics, StructuredLogger};
use crate::scoring::{CounterMemory, ScoreEngine};
use crate::source::{CycleInput, MetricsSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Configuration for the scoring cycle loop
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between cycle starts (default: 20 seconds)
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(20_000),
        }
    }
}

/// Runs the unending sequence of scoring cycles.
pub struct CycleScheduler {
    source: Arc<dyn MetricsSource>,
    exporter: Arc<dyn ScoreExporter>,
    engine: ScoreEngine,
    counters: Arc<CounterMemory>,
    config: SchedulerConfig,
    health: HealthRegistry,
    metrics: AgentMetrics,
    logger: StructuredLogger,
}

impl CycleScheduler {
    pub fn new(
        source: Arc<dyn MetricsSource>,
        exporter: Arc<dyn ScoreExporter>,
        engine: ScoreEngine,
        counters: Arc<CounterMemory>,
        config: SchedulerConfig,
        health: HealthRegistry,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            source,
            exporter,
            engine,
            counters,
            config,
            health,
            metrics: AgentMetrics::new(),
            logger,
        }
    }

    /// Run cycles on the configured interval until shutdown.
    ///
    /// Missed ticks are skipped rather than bursted, so a cycle that
    /// overruns the interval delays the next one instead of stacking.
    pub async fn run(self, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(
            interval_ms = self.config.poll_interval.as_millis() as u64,
            "Starting scoring cycle loop"
        );

        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let start = Instant::now();
                    // A shutdown request may interrupt the fetch, but once
                    // scoring starts the cycle always runs to completion.
                    let fetched = tokio::select! {
                        result = self.source.fetch() => result,
                        _ = shutdown.recv() => {
                            info!("Shutting down scoring cycle loop, abandoning fetch");
                            break;
                        }
                    };

                    match fetched {
                        Ok(input) => self.score_and_publish(input, start).await,
                        Err(e) => self.skip_cycle(&e).await,
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down scoring cycle loop");
                    break;
                }
            }
        }
    }

    /// One complete fetch-score-export pass, outside the timer.
    pub async fn run_cycle(&self) {
        let start = Instant::now();
        match self.source.fetch().await {
            Ok(input) => self.score_and_publish(input, start).await,
            Err(e) => self.skip_cycle(&e).await,
        }
    }

    async fn score_and_publish(&self, input: CycleInput, start: Instant) {
        self.health.set_healthy(components::SOURCE).await;

        let mut table: ResultTable = Vec::with_capacity(input.snapshots.len());
        let mut skipped = 0usize;

        for snapshot in &input.snapshots {
            match self
                .engine
                .score(snapshot, input.machine_memory_bytes, &self.counters)
            {
                Some(score) => table.push(ResultStat {
                    container_id: snapshot.container_id.clone(),
                    score,
                }),
                None => {
                    skipped += 1;
                    self.metrics.inc_containers_skipped();
                    warn!(
                        container_id = %snapshot.container_id,
                        "Unusable sample series, container skipped for this cycle"
                    );
                }
            }
        }
        self.health.set_healthy(components::SCORER).await;

        let rows = table.len();
        match self.exporter.publish(table).await {
            Ok(()) => self.health.set_healthy(components::EXPORTER).await,
            Err(e) => {
                warn!(error = %e, "Failed to publish score table");
                self.health
                    .set_degraded(components::EXPORTER, e.to_string())
                    .await;
            }
        }

        let elapsed = start.elapsed();
        self.metrics.inc_cycles_completed();
        self.metrics.set_containers_scored(rows as i64);
        self.metrics
            .set_counter_memory_entries(self.counters.len() as i64);
        self.metrics.observe_cycle_latency(elapsed.as_secs_f64());
        self.logger.log_cycle(rows, skipped, elapsed.as_millis());
    }

    /// A failed fetch abandons the cycle: nothing is published and no
    /// counter memory is touched.
    async fn skip_cycle(&self, error: &anyhow::Error) {
        self.metrics.inc_cycles_skipped();
        self.health
            .set_degraded(components::SOURCE, error.to_string())
            .await;
        self.logger.log_cycle_skipped(&error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContainerSnapshot, Sample};
    use crate::scoring::WeightConfig;
    use crate::source::async_trait;
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock source serving a fixed input, optionally failing
    struct MockSource {
        input: CycleInput,
        fail: bool,
        fetch_count: AtomicUsize,
    }

    impl MockSource {
        fn new(input: CycleInput) -> Self {
            Self {
                input,
                fail: false,
                fetch_count: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                input: CycleInput {
                    machine_memory_bytes: None,
                    snapshots: vec![],
                },
                fail: true,
                fetch_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MetricsSource for MockSource {
        async fn fetch(&self) -> Result<CycleInput> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(self.input.clone())
        }
    }

    /// Mock exporter recording every published table
    #[derive(Default)]
    struct MockExporter {
        published: Mutex<Vec<ResultTable>>,
    }

    #[async_trait]
    impl ScoreExporter for MockExporter {
        async fn publish(&self, table: ResultTable) -> Result<()> {
            self.published.lock().unwrap().push(table);
            Ok(())
        }
    }

    fn sample_with_rx(timestamp_ms: i64, rx_dropped: i64) -> Sample {
        Sample {
            timestamp_ms,
            cpu_load_avg: 0.0,
            mem_usage_bytes: 0,
            rx_dropped,
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

    fn rx_only_weights() -> WeightConfig {
        WeightConfig {
            cpu_load_avg: 0.0,
            mem_usage: 0.0,
            rx_dropped: 1.0,
            io_time: 0.0,
            read_time: 0.0,
            write_time: 0.0,
            weighted_io_time: 0.0,
        }
    }

    fn scheduler(
        source: Arc<MockSource>,
        exporter: Arc<MockExporter>,
        counters: Arc<CounterMemory>,
    ) -> CycleScheduler {
        CycleScheduler::new(
            source,
            exporter,
            ScoreEngine::new(rx_only_weights()),
            counters,
            SchedulerConfig::default(),
            HealthRegistry::new(),
            StructuredLogger::new("test-node"),
        )
    }

    #[tokio::test]
    async fn test_successful_cycle_publishes_one_row_per_container() {
        let input = CycleInput {
            machine_memory_bytes: Some(1_000_000),
            snapshots: vec![
                snapshot("c1", vec![sample_with_rx(1_000, 10), sample_with_rx(2_000, 25)]),
                snapshot("c2", vec![sample_with_rx(1_000, 0), sample_with_rx(2_000, 4)]),
            ],
        };
        let source = Arc::new(MockSource::new(input));
        let exporter = Arc::new(MockExporter::default());
        let counters = Arc::new(CounterMemory::new());

        scheduler(source, exporter.clone(), counters.clone())
            .run_cycle()
            .await;

        let published = exporter.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        let table = &published[0];
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].container_id, "c1");
        assert_eq!(table[0].score, 15_000);
        assert_eq!(table[1].container_id, "c2");
        assert_eq!(table[1].score, 4_000);
        assert_eq!(counters.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_skips_the_cycle_entirely() {
        let source = Arc::new(MockSource::failing());
        let exporter = Arc::new(MockExporter::default());
        let counters = Arc::new(CounterMemory::new());

        let sched = scheduler(source.clone(), exporter.clone(), counters.clone());
        sched.run_cycle().await;

        assert_eq!(source.fetch_count.load(Ordering::SeqCst), 1);
        assert!(exporter.published.lock().unwrap().is_empty());
        assert!(counters.is_empty());
    }

    #[tokio::test]
    async fn test_empty_sample_series_skips_only_that_container() {
        let input = CycleInput {
            machine_memory_bytes: None,
            snapshots: vec![
                snapshot("empty", vec![]),
                snapshot("ok", vec![sample_with_rx(1_000, 2), sample_with_rx(2_000, 9)]),
            ],
        };
        let exporter = Arc::new(MockExporter::default());
        let counters = Arc::new(CounterMemory::new());

        scheduler(Arc::new(MockSource::new(input)), exporter.clone(), counters.clone())
            .run_cycle()
            .await;

        let published = exporter.published.lock().unwrap();
        assert_eq!(published[0].len(), 1);
        assert_eq!(published[0][0].container_id, "ok");
        assert_eq!(counters.len(), 1);
    }

    #[tokio::test]
    async fn test_counter_memory_carries_across_cycles() {
        let first = CycleInput {
            machine_memory_bytes: None,
            snapshots: vec![snapshot(
                "c1",
                vec![sample_with_rx(1_000, 10), sample_with_rx(2_000, 25)],
            )],
        };
        let second = CycleInput {
            machine_memory_bytes: None,
            snapshots: vec![snapshot(
                "c1",
                vec![sample_with_rx(21_000, 30), sample_with_rx(22_000, 50)],
            )],
        };
        let exporter = Arc::new(MockExporter::default());
        let counters = Arc::new(CounterMemory::new());

        scheduler(Arc::new(MockSource::new(first)), exporter.clone(), counters.clone())
            .run_cycle()
            .await;
        scheduler(Arc::new(MockSource::new(second)), exporter.clone(), counters.clone())
            .run_cycle()
            .await;

        let published = exporter.published.lock().unwrap();
        // first cycle: intra-cycle span; second: delta from remembered 25
        assert_eq!(published[0][0].score, 15_000);
        assert_eq!(published[1][0].score, 25_000);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let source = Arc::new(MockSource::failing());
        let exporter = Arc::new(MockExporter::default());
        let counters = Arc::new(CounterMemory::new());
        let sched = scheduler(source, exporter, counters);

        let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
        let handle = tokio::spawn(sched.run(shutdown_rx));

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
