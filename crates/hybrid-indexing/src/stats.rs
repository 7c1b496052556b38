//! Process-wide counters for the NRT pipeline.
//!
//! One [`StatsSink`] is created at startup and shared (`Arc`) by the
//! commit observer and the consumer workers. Counters only ever grow.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// The fixed set of pipeline counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Documents accepted by the queue
    Admitted,
    /// Documents rejected by the queue (full or closed) or discarded at shutdown
    Dropped,
    /// Documents the live index engine failed to apply
    ApplyFailed,
}

impl Counter {
    pub const ALL: [Counter; 3] = [Counter::Admitted, Counter::Dropped, Counter::ApplyFailed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Counter::Admitted => "admitted",
            Counter::Dropped => "dropped",
            Counter::ApplyFailed => "apply-failed",
        }
    }

    /// Parse from a counter name, returning None for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "admitted" => Some(Counter::Admitted),
            "dropped" => Some(Counter::Dropped),
            "apply-failed" => Some(Counter::ApplyFailed),
            _ => None,
        }
    }

    fn slot(&self) -> usize {
        match self {
            Counter::Admitted => 0,
            Counter::Dropped => 1,
            Counter::ApplyFailed => 2,
        }
    }
}

impl std::fmt::Display for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic, lock-free counters.
#[derive(Debug, Default)]
pub struct StatsSink {
    counters: [AtomicU64; 3],
}

impl StatsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to a counter.
    pub fn mark(&self, counter: Counter, delta: u64) {
        if delta == 0 {
            return;
        }
        self.counters[counter.slot()].fetch_add(delta, Ordering::Relaxed);
    }

    pub fn count(&self, counter: Counter) -> u64 {
        self.counters[counter.slot()].load(Ordering::Relaxed)
    }

    /// Current value by counter name, for scrapers.
    pub fn get(&self, name: &str) -> Option<u64> {
        Counter::parse(name).map(|c| self.count(c))
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            admitted: self.count(Counter::Admitted),
            dropped: self.count(Counter::Dropped),
            apply_failed: self.count(Counter::ApplyFailed),
        }
    }
}

/// Point-in-time copy of all counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub admitted: u64,
    pub dropped: u64,
    #[serde(rename = "apply-failed")]
    pub apply_failed: u64,
}
