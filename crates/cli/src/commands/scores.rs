//! Score table command

use anyhow::Result;
use chrono::{TimeZone, Utc};
use tabled::Tabled;

use crate::client::{ApiClient, PublishedScores};
use crate::output::{format_score, print_warning, truncate_id, OutputFormat};
use crate::SortOrder;

/// Row for the score table
#[derive(Tabled)]
struct ScoreTableRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Container")]
    container_id: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Raw")]
    raw: i32,
}

/// Show the currently published score table, ranked by load
pub async fn show_scores(client: &ApiClient, sort: SortOrder, format: OutputFormat) -> Result<()> {
    let mut published: PublishedScores = client.get("scores").await?;

    match sort {
        SortOrder::Score => published.scores.sort_by(|a, b| b.score.cmp(&a.score)),
        SortOrder::Id => published
            .scores
            .sort_by(|a, b| a.container_id.cmp(&b.container_id)),
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&published)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            if published.scores.is_empty() {
                print_warning("No scores published yet");
                return Ok(());
            }

            let rows: Vec<ScoreTableRow> = published
                .scores
                .iter()
                .enumerate()
                .map(|(i, row)| ScoreTableRow {
                    rank: i + 1,
                    container_id: truncate_id(&row.container_id),
                    score: format_score(row.score),
                    raw: row.score,
                })
                .collect();

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);

            let published_at = Utc
                .timestamp_millis_opt(published.published_at_ms)
                .single()
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "\nGeneration {} published at {}",
                published.generation, published_at
            );
        }
    }

    Ok(())
}
