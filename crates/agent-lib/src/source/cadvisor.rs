//! HTTP client for the cAdvisor v1.3 REST API
//!
//! Issues the two GETs a cycle needs (`/api/v1.3/machine` and
//! `/api/v1.3/docker`) and converts the bodies into a [`CycleInput`].

use super::convert;
use super::{CycleInput, MetricsSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const MACHINE_ENDPOINT: &str = "api/v1.3/machine";
const DOCKER_ENDPOINT: &str = "api/v1.3/docker";

/// Failure taxonomy for one cycle's fetch. Any variant abandons the
/// cycle; the scheduler retries on the next tick.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cAdvisor request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("cAdvisor returned {status} for {endpoint}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("unparseable cAdvisor document from {endpoint}: {source}")]
    Malformed {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Metrics source backed by a cAdvisor instance.
pub struct CAdvisorSource {
    client: reqwest::Client,
    base_url: String,
}

impl CAdvisorSource {
    /// Create a source for the cAdvisor at `host:port`.
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("http://{}:{}", host, port),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_body(&self, endpoint: &'static str) -> Result<String, SourceError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(url = %url, "Querying cAdvisor");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status { endpoint, status });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl MetricsSource for CAdvisorSource {
    async fn fetch(&self) -> Result<CycleInput> {
        let machine_body = self.get_body(MACHINE_ENDPOINT).await?;
        let machine_memory_bytes =
            convert::parse_machine_body(&machine_body).map_err(|source| SourceError::Malformed {
                endpoint: MACHINE_ENDPOINT,
                source,
            })?;

        let docker_body = self.get_body(DOCKER_ENDPOINT).await?;
        let snapshots =
            convert::parse_docker_body(&docker_body).map_err(|source| SourceError::Malformed {
                endpoint: DOCKER_ENDPOINT,
                source,
            })?;

        Ok(CycleInput {
            machine_memory_bytes,
            snapshots,
        })
    }
}
