//! Relative weight configuration for the score composite
//!
//! Weights are read once at startup from an optional file plus
//! `WEIGHTS_`-prefixed environment variables and are immutable afterwards.
//! Loading never fails: every key is resolved independently, and a missing,
//! malformed, or negative entry falls back to that key's documented default.

use std::path::Path;

use tracing::warn;

/// Relative weight of each metric dimension in the composite score.
/// All weights are non-negative; keys in file and environment use the
/// field names below (for example `WEIGHTS_CPU_LOAD_AVG`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightConfig {
    pub cpu_load_avg: f64,
    pub mem_usage: f64,
    pub rx_dropped: f64,
    pub io_time: f64,
    pub read_time: f64,
    pub write_time: f64,
    pub weighted_io_time: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            cpu_load_avg: 0.8,
            mem_usage: 0.5,
            rx_dropped: 0.8,
            io_time: 0.4,
            read_time: 0.2,
            write_time: 0.3,
            weighted_io_time: 0.2,
        }
    }
}

impl WeightConfig {
    /// Load weights from an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Self {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder = builder.add_source(config::Environment::with_prefix("WEIGHTS"));

        match builder.build() {
            Ok(cfg) => Self::from_config(&cfg),
            Err(e) => {
                warn!(error = %e, "unreadable weight configuration, using defaults");
                Self::default()
            }
        }
    }

    fn from_config(cfg: &config::Config) -> Self {
        let defaults = Self::default();
        Self {
            cpu_load_avg: resolve(cfg, "cpu_load_avg", defaults.cpu_load_avg),
            mem_usage: resolve(cfg, "mem_usage", defaults.mem_usage),
            rx_dropped: resolve(cfg, "rx_dropped", defaults.rx_dropped),
            io_time: resolve(cfg, "io_time", defaults.io_time),
            read_time: resolve(cfg, "read_time", defaults.read_time),
            write_time: resolve(cfg, "write_time", defaults.write_time),
            weighted_io_time: resolve(cfg, "weighted_io_time", defaults.weighted_io_time),
        }
    }
}

fn resolve(cfg: &config::Config, key: &str, default: f64) -> f64 {
    match cfg.get_float(key) {
        Ok(value) if value >= 0.0 => value,
        Ok(value) => {
            warn!(key, value, default, "negative weight rejected, using default");
            default
        }
        Err(config::ConfigError::NotFound(_)) => default,
        Err(e) => {
            warn!(key, error = %e, default, "malformed weight entry, using default");
            default
        }
    }
}
