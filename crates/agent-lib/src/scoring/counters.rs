//! Cross-cycle memory for cumulative counters
//!
//! Each scored container leaves behind the last absolute value of its
//! cumulative counters so the next cycle can form deltas against them.
//! Entries are created on first sight and never evicted.

use dashmap::DashMap;

/// Last absolute value of every cumulative counter for one container.
///
/// A value of zero means "never recorded": the delta rule treats it as
/// first sight even when the counter genuinely read zero last cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSet {
    pub rx_dropped: i64,
    pub io_time_ms: i64,
    pub read_time_ms: i64,
    pub write_time_ms: i64,
    pub weighted_io_time_ms: i64,
}

/// Per-container counter store shared across cycles.
///
/// The map is safe to share between threads; within one cycle each
/// container is read and written exactly once, and cycles never overlap,
/// so per-key locking in the map is all the synchronization needed.
#[derive(Debug, Default)]
pub struct CounterMemory {
    entries: DashMap<String, CounterSet>,
}

impl CounterMemory {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Replace the remembered counters for `container_id` with `latest`
    /// and return what was remembered before, zeroed on first sight.
    /// The read and the write happen under one entry lock.
    pub fn update(&self, container_id: &str, latest: CounterSet) -> CounterSet {
        let mut entry = self.entries.entry(container_id.to_string()).or_default();
        let previous = *entry;
        *entry = latest;
        previous
    }

    /// Remembered counters for `container_id`, zeroed if never scored.
    pub fn get(&self, container_id: &str) -> CounterSet {
        self.entries
            .get(container_id)
            .map(|entry| *entry.value())
            .unwrap_or_default()
    }

    /// Number of containers ever scored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
