//! Metrics source seam
//!
//! The scheduler only knows this trait; the concrete cAdvisor client
//! lives behind it so tests can substitute canned cycle inputs.

mod cadvisor;
mod convert;

pub use cadvisor::{CAdvisorSource, SourceError};

use crate::models::ContainerSnapshot;
use anyhow::Result;

pub use async_trait::async_trait;

/// Everything one polling cycle consumes from the metrics source.
#[derive(Debug, Clone)]
pub struct CycleInput {
    /// Machine-wide memory capacity, when the source reports one.
    pub machine_memory_bytes: Option<i64>,
    /// One snapshot per container observed this cycle.
    pub snapshots: Vec<ContainerSnapshot>,
}

/// Trait for metrics source implementations
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Fetch the machine capacity and all container snapshots for one
    /// cycle. An error abandons the whole cycle.
    async fn fetch(&self) -> Result<CycleInput>;
}
