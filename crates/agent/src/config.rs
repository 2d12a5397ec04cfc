//! Agent configuration

use anyhow::Result;
use serde::Deserialize;

/// Agent configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Node name used to key structured log events
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// API server port for health/metrics/scores
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// cAdvisor host
    #[serde(default = "default_source_host")]
    pub source_host: String,

    /// cAdvisor port
    #[serde(default = "default_source_port")]
    pub source_port: u16,

    /// Polling interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Optional path to a relative-weights file
    #[serde(default)]
    pub weights_file: Option<String>,
}

fn default_node_name() -> String {
    std::env::var("NODE_NAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    9090
}

fn default_source_host() -> String {
    "127.0.0.1".to_string()
}

fn default_source_port() -> u16 {
    8080
}

fn default_poll_interval_ms() -> u64 {
    20_000
}

impl AgentConfig {
    /// Load configuration from `AGENT_`-prefixed environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("AGENT"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| AgentConfig {
            node_name: default_node_name(),
            api_port: default_api_port(),
            source_host: default_source_host(),
            source_port: default_source_port(),
            poll_interval_ms: default_poll_interval_ms(),
            weights_file: None,
        }))
    }
}
