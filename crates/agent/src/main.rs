//! Scorer Agent - container load scoring agent
//!
//! Polls per-container metrics from a cAdvisor endpoint on a fixed
//! interval, reduces each container's samples to a weighted load score,
//! and publishes the per-cycle score table over the HTTP API.

use agent_lib::{
    export::ScoreTable,
    health::{components, HealthRegistry},
    observability::{AgentMetrics, StructuredLogger},
    scheduler::{CycleScheduler, SchedulerConfig},
    scoring::{CounterMemory, ScoreEngine, WeightConfig},
    source::CAdvisorSource,
};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting scorer-agent");

    // Load configuration
    let config = config::AgentConfig::load()?;
    info!(
        node_name = %config.node_name,
        source = %format!("{}:{}", config.source_host, config.source_port),
        poll_interval_ms = config.poll_interval_ms,
        "Agent configured"
    );

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register(components::SOURCE).await;
    health_registry.register(components::SCORER).await;
    health_registry.register(components::EXPORTER).await;

    // Initialize metrics
    let metrics = AgentMetrics::new();

    // Initialize structured logger
    let logger = StructuredLogger::new(&config.node_name);
    logger.log_startup(AGENT_VERSION);

    // Relative weights, loaded once; bad entries fall back per key
    let weights = WeightConfig::load(config.weights_file.as_deref().map(Path::new));
    info!(?weights, "Relative weights loaded");

    // Cross-cycle counter memory and the published table
    let counters = Arc::new(CounterMemory::new());
    let score_table = Arc::new(ScoreTable::new());

    let source = Arc::new(CAdvisorSource::new(&config.source_host, config.source_port)?);

    let scheduler = CycleScheduler::new(
        source,
        score_table.clone(),
        ScoreEngine::new(weights),
        counters,
        SchedulerConfig {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        },
        health_registry.clone(),
        logger.clone(),
    );

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_tx.subscribe()));

    // Create shared application state
    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics.clone(),
        score_table.clone(),
    ));

    // Mark agent as ready after initialization
    health_registry.set_ready(true).await;

    // Start health/metrics/scores server
    let _api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    // Stop the cycle loop; an in-progress scoring pass finishes first
    let _ = shutdown_tx.send(());
    scheduler_handle.await?;

    Ok(())
}
