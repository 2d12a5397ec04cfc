//! HTTP API: probes, Prometheus exposition, and the score table

use agent_lib::{
    export::ScoreTable,
    health::HealthRegistry,
    observability::AgentMetrics,
};
use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: AgentMetrics,
    pub scores: Arc<ScoreTable>,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: AgentMetrics,
        scores: Arc<ScoreTable>,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            scores,
        }
    }
}

/// Liveness probe. A degraded agent still answers 200; only an
/// unhealthy component turns it into a 503.
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let code = if health.status.is_operational() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(health))
}

/// Readiness probe
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(readiness))
}

/// Prometheus exposition of the process-wide registry
async fn metrics() -> impl IntoResponse {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Currently published score table
async fn scores(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.scores.snapshot().await)
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/scores", get(scores))
        .with_state(state)
}

/// Bind and serve the API until the process exits.
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
