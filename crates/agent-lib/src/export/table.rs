//! In-process published score table
//!
//! Holds the most recent cycle's result table for external consumers:
//! the agent API serves it as JSON and every row is mirrored into a
//! per-container Prometheus gauge. Each publish replaces the table
//! wholesale and bumps a generation counter so consumers can tell a
//! fresh table from a stale one.

use super::ScoreExporter;
use crate::models::ResultTable;
use crate::observability::AgentMetrics;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// The currently published table, as served to consumers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishedScores {
    /// Incremented on every publish; zero means nothing published yet.
    pub generation: u64,
    /// Unix epoch milliseconds of the last publish.
    pub published_at_ms: i64,
    pub scores: ResultTable,
}

/// Shared, full-replace score table.
pub struct ScoreTable {
    inner: RwLock<PublishedScores>,
    metrics: AgentMetrics,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreTable {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(PublishedScores::default()),
            metrics: AgentMetrics::new(),
        }
    }

    /// A copy of the currently published table.
    pub async fn snapshot(&self) -> PublishedScores {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl ScoreExporter for ScoreTable {
    async fn publish(&self, table: ResultTable) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.generation += 1;
        inner.published_at_ms = chrono::Utc::now().timestamp_millis();
        inner.scores = table;

        self.metrics.replace_container_scores(
            inner
                .scores
                .iter()
                .map(|stat| (stat.container_id.as_str(), stat.score)),
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResultStat;

    fn stat(container_id: &str, score: i32) -> ResultStat {
        ResultStat {
            container_id: container_id.to_string(),
            score,
        }
    }

    #[tokio::test]
    async fn test_starts_empty_at_generation_zero() {
        let table = ScoreTable::new();
        let published = table.snapshot().await;

        assert_eq!(published.generation, 0);
        assert!(published.scores.is_empty());
    }

    #[tokio::test]
    async fn test_publish_replaces_wholesale() {
        let table = ScoreTable::new();

        table
            .publish(vec![stat("abc123", 1_200), stat("def456", 800)])
            .await
            .unwrap();
        table.publish(vec![stat("ghi789", 50)]).await.unwrap();

        let published = table.snapshot().await;
        assert_eq!(published.generation, 2);
        assert_eq!(published.scores.len(), 1);
        assert_eq!(published.scores[0].container_id, "ghi789");
    }

    #[tokio::test]
    async fn test_publish_preserves_row_order() {
        let table = ScoreTable::new();

        table
            .publish(vec![stat("b", 2), stat("a", 1), stat("c", 3)])
            .await
            .unwrap();

        let ids: Vec<_> = table
            .snapshot()
            .await
            .scores
            .iter()
            .map(|s| s.container_id.clone())
            .collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_empty_publish_clears_the_table() {
        let table = ScoreTable::new();

        table.publish(vec![stat("abc123", 1_200)]).await.unwrap();
        table.publish(vec![]).await.unwrap();

        let published = table.snapshot().await;
        assert_eq!(published.generation, 2);
        assert!(published.scores.is_empty());
        assert!(published.published_at_ms > 0);
    }
}
