//! Container Load Scorer CLI
//!
//! A command-line tool for viewing the ranked score table and the
//! health of a scorer agent.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use commands::{scores, status};

/// Container Load Scorer CLI
#[derive(Parser)]
#[command(name = "cls")]
#[command(author, version, about = "CLI for the Container Load Scorer agent", long_about = None)]
pub struct Cli {
    /// Agent API URL (can also be set via CLS_API_URL env var)
    #[arg(long, env = "CLS_API_URL", default_value = "http://localhost:9090")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the currently published score table
    Scores {
        /// Sort order for the table
        #[arg(long, default_value = "score")]
        sort: SortOrder,
    },

    /// Show agent component health
    Status,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortOrder {
    /// Highest score first
    Score,
    /// Container id, ascending
    Id,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = client::ApiClient::new(&cli.api_url)?;

    match cli.command {
        Commands::Scores { sort } => {
            scores::show_scores(&client, sort, cli.format).await?;
        }
        Commands::Status => {
            status::show_status(&client, cli.format).await?;
        }
    }

    Ok(())
}
