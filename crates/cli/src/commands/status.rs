//! Agent status command

use anyhow::Result;
use chrono::{TimeZone, Utc};
use tabled::Tabled;

use crate::client::{ApiClient, HealthResponse};
use crate::output::{color_status, OutputFormat};

/// Row for the component health table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Last Check")]
    last_check: String,
}

/// Show the agent's component health
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<()> {
    // The agent answers 503 with the same body when unhealthy, which is
    // still worth rendering.
    let health: HealthResponse = client.get_lenient("healthz").await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&health)?;
            println!("{}", json);
        }
        OutputFormat::Table => {
            let mut rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    component: name.clone(),
                    status: color_status(&component.status),
                    message: component.message.clone().unwrap_or_default(),
                    last_check: Utc
                        .timestamp_opt(component.last_check_timestamp, 0)
                        .single()
                        .map(|dt| dt.to_rfc3339())
                        .unwrap_or_else(|| "unknown".to_string()),
                })
                .collect();
            rows.sort_by(|a, b| a.component.cmp(&b.component));

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nOverall: {}", color_status(&health.status));
        }
    }

    Ok(())
}
