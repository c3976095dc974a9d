//! Per-cycle performance records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw memory figures reported by a [`MemoryProbe`](super::MemoryProbe), in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySample {
    pub heap_used: u64,
    pub heap_total: u64,
    pub external: u64,
    pub resident_set_size: u64,
}

/// Memory usage in whole megabytes (MiB, rounded to nearest).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub heap_used_mb: u64,
    pub heap_total_mb: u64,
    pub external_mb: u64,
    pub resident_set_size_mb: u64,
}

impl From<MemorySample> for MemoryUsage {
    fn from(sample: MemorySample) -> Self {
        Self {
            heap_used_mb: bytes_to_mb(sample.heap_used),
            heap_total_mb: bytes_to_mb(sample.heap_total),
            external_mb: bytes_to_mb(sample.external),
            resident_set_size_mb: bytes_to_mb(sample.resident_set_size),
        }
    }
}

/// Converts a byte count to whole megabytes, rounding half up.
pub fn bytes_to_mb(bytes: u64) -> u64 {
    const MB: u64 = 1024 * 1024;
    bytes.saturating_add(MB / 2) / MB
}

/// Immutable performance record for one completed cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSnapshot {
    pub tick_number: u64,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Cycles completed within the last second, this one included.
    pub ticks_per_second: f64,
    pub memory: MemoryUsage,
    pub event_loop_lag_ms: u64,
}

/// Aggregate view over the most recent snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub average_tick_duration_ms: f64,
    pub average_tps: f64,
    pub average_event_loop_lag_ms: f64,
    /// Latest memory sample, if any cycle has completed.
    pub memory: Option<MemoryUsage>,
    /// Snapshots in the window that tripped at least one threshold.
    pub anomalous_ticks: usize,
    /// Snapshots the summary was computed over.
    pub sampled_ticks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_round_to_nearest_megabyte() {
        assert_eq!(bytes_to_mb(0), 0);
        assert_eq!(bytes_to_mb(512 * 1024 - 1), 0);
        assert_eq!(bytes_to_mb(512 * 1024), 1);
        assert_eq!(bytes_to_mb(3 * 1024 * 1024), 3);
        assert_eq!(bytes_to_mb(u64::MAX), u64::MAX / (1024 * 1024));
    }

    #[test]
    fn snapshot_serializes_with_camel_case_keys() {
        let snapshot = TickSnapshot {
            tick_number: 7,
            started_at: DateTime::<Utc>::UNIX_EPOCH,
            duration_ms: 12,
            ticks_per_second: 1.0,
            memory: MemoryUsage {
                heap_used_mb: 40,
                heap_total_mb: 64,
                external_mb: 0,
                resident_set_size_mb: 80,
            },
            event_loop_lag_ms: 1,
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["tickNumber"], 7);
        assert_eq!(json["durationMs"], 12);
        assert_eq!(json["ticksPerSecond"], 1.0);
        assert_eq!(json["memory"]["heapUsedMb"], 40);
        assert_eq!(json["memory"]["residentSetSizeMb"], 80);
        assert_eq!(json["eventLoopLagMs"], 1);
    }
}
