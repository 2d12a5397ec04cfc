//! Agent library for container load scoring
//!
//! This crate provides the core functionality for:
//! - Polling per-container metrics from a cAdvisor endpoint
//! - Reducing each container's sample series to a weighted load score
//! - Remembering cumulative counter values across polling cycles
//! - Publishing the per-cycle score table
//! - Health checks and observability

pub mod export;
pub mod health;
pub mod models;
pub mod observability;
pub mod scheduler;
pub mod scoring;
pub mod source;

pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AgentMetrics, StructuredLogger};
pub use scoring::{CounterMemory, ScoreEngine, WeightConfig};
