//! Conversion of cAdvisor v1.3 response bodies into snapshots
//!
//! The `/api/v1.3/docker` document is an object keyed by
//! `/docker/<container-id>`; each entry carries the container spec and a
//! time-ordered `stats` array. Missing per-sample fields degrade to zero
//! rather than dropping the sample, and a malformed container entry is
//! skipped without affecting the others. Filesystem counters are
//! reported per filesystem and summed per sample.

use crate::models::{ContainerSnapshot, Sample};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct MachineInfo {
    memory_capacity: Option<i64>,
}

/// Extract the machine-wide memory capacity from a `/api/v1.3/machine`
/// body. A document without the field yields `None`; an unparseable
/// document is an error that abandons the cycle.
pub fn parse_machine_body(body: &str) -> Result<Option<i64>, serde_json::Error> {
    let info: MachineInfo = serde_json::from_str(body)?;
    Ok(info.memory_capacity)
}

#[derive(Debug, Deserialize)]
struct DockerContainer {
    #[serde(default)]
    id: String,
    #[serde(default)]
    spec: ContainerSpec,
    #[serde(default)]
    stats: Vec<StatEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct ContainerSpec {
    memory: Option<MemorySpec>,
}

#[derive(Debug, Deserialize)]
struct MemorySpec {
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StatEntry {
    timestamp: Option<String>,
    #[serde(default)]
    cpu: CpuStat,
    #[serde(default)]
    memory: MemoryStat,
    #[serde(default)]
    network: NetworkStat,
    #[serde(default)]
    filesystem: Vec<FilesystemStat>,
}

#[derive(Debug, Default, Deserialize)]
struct CpuStat {
    #[serde(default)]
    load_average: f64,
}

#[derive(Debug, Default, Deserialize)]
struct MemoryStat {
    #[serde(default)]
    usage: i64,
}

#[derive(Debug, Default, Deserialize)]
struct NetworkStat {
    #[serde(default)]
    rx_dropped: i64,
}

#[derive(Debug, Default, Deserialize)]
struct FilesystemStat {
    #[serde(default)]
    io_time: i64,
    #[serde(default)]
    read_time: i64,
    #[serde(default)]
    write_time: i64,
    #[serde(default)]
    weighted_io_time: i64,
}

/// Convert a `/api/v1.3/docker` body into one snapshot per container.
///
/// An unparseable top-level document is an error; a single malformed
/// container entry only costs that container its cycle. Containers with
/// no parseable samples are not emitted. Snapshots come out ordered by
/// the document key, so the published table order is stable.
pub fn parse_docker_body(body: &str) -> Result<Vec<ContainerSnapshot>, serde_json::Error> {
    let entries: BTreeMap<String, serde_json::Value> = serde_json::from_str(body)?;

    let mut snapshots = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let container: DockerContainer = match serde_json::from_value(value) {
            Ok(container) => container,
            Err(e) => {
                warn!(entry = %key, error = %e, "Skipping malformed container entry");
                continue;
            }
        };

        let container_id = if container.id.is_empty() {
            key.trim_start_matches("/docker/").to_string()
        } else {
            container.id
        };

        let samples: Vec<Sample> = container.stats.iter().map(convert_stat).collect();
        if samples.is_empty() {
            continue;
        }

        snapshots.push(ContainerSnapshot {
            container_id,
            memory_limit_bytes: container.spec.memory.and_then(|m| m.limit),
            samples,
        });
    }

    Ok(snapshots)
}

fn convert_stat(stat: &StatEntry) -> Sample {
    Sample {
        timestamp_ms: parse_timestamp_ms(stat.timestamp.as_deref()),
        cpu_load_avg: stat.cpu.load_average,
        mem_usage_bytes: stat.memory.usage,
        rx_dropped: stat.network.rx_dropped,
        io_time_ms: sum_filesystems(&stat.filesystem, |f| f.io_time),
        read_time_ms: sum_filesystems(&stat.filesystem, |f| f.read_time),
        write_time_ms: sum_filesystems(&stat.filesystem, |f| f.write_time),
        weighted_io_time_ms: sum_filesystems(&stat.filesystem, |f| f.weighted_io_time),
    }
}

/// An unparseable timestamp degrades to epoch zero, keeping the sample.
fn parse_timestamp_ms(raw: Option<&str>) -> i64 {
    raw.and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

fn sum_filesystems(filesystems: &[FilesystemStat], value: impl Fn(&FilesystemStat) -> i64) -> i64 {
    filesystems.iter().map(value).sum()
}
