//! Score export seam
//!
//! One cycle's result table is handed to an exporter whole; consumers
//! see a full replacement, never an incremental patch.

mod table;

pub use table::{PublishedScores, ScoreTable};

use crate::models::ResultTable;
use anyhow::Result;

pub use async_trait::async_trait;

/// Trait for score export implementations
#[async_trait]
pub trait ScoreExporter: Send + Sync {
    /// Replace the published table with this cycle's results.
    async fn publish(&self, table: ResultTable) -> Result<()>;
}
