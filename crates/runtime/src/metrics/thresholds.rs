//! Anomaly rules evaluated against each snapshot.
//!
//! Rules are advisory: they only produce events. Nothing here throttles or
//! skips cycles.

use serde::Serialize;

use super::TickSnapshot;

/// Limits past which a snapshot is reported as anomalous.
///
/// Comparisons are strict: a cycle of exactly `slow_tick_ms` is not slow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyThresholds {
    pub slow_tick_ms: u64,
    pub high_memory_mb: u64,
    pub event_loop_lag_ms: u64,
    pub min_ticks_per_second: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            slow_tick_ms: 500,
            high_memory_mb: 500,
            event_loop_lag_ms: 100,
            min_ticks_per_second: 0.5,
        }
    }
}

impl AnomalyThresholds {
    /// Every rule the snapshot violates, in a fixed order.
    pub fn violations(&self, snapshot: &TickSnapshot) -> Vec<Anomaly> {
        let tick = snapshot.tick_number;
        let mut found = Vec::new();

        if snapshot.duration_ms > self.slow_tick_ms {
            found.push(Anomaly::SlowTick {
                tick,
                duration_ms: snapshot.duration_ms,
                threshold_ms: self.slow_tick_ms,
            });
        }
        if snapshot.memory.heap_used_mb > self.high_memory_mb {
            found.push(Anomaly::HighMemory {
                tick,
                heap_used_mb: snapshot.memory.heap_used_mb,
                threshold_mb: self.high_memory_mb,
            });
        }
        if snapshot.event_loop_lag_ms > self.event_loop_lag_ms {
            found.push(Anomaly::EventLoopLag {
                tick,
                lag_ms: snapshot.event_loop_lag_ms,
                threshold_ms: self.event_loop_lag_ms,
            });
        }
        if snapshot.ticks_per_second < self.min_ticks_per_second {
            found.push(Anomaly::LowTps {
                tick,
                ticks_per_second: snapshot.ticks_per_second,
                threshold: self.min_ticks_per_second,
            });
        }

        found
    }

    pub fn is_anomalous(&self, snapshot: &TickSnapshot) -> bool {
        !self.violations(snapshot).is_empty()
    }
}

/// A threshold-exceeding condition detected from a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Anomaly {
    #[serde(rename_all = "camelCase")]
    SlowTick {
        tick: u64,
        duration_ms: u64,
        threshold_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    HighMemory {
        tick: u64,
        heap_used_mb: u64,
        threshold_mb: u64,
    },
    #[serde(rename_all = "camelCase")]
    EventLoopLag {
        tick: u64,
        lag_ms: u64,
        threshold_ms: u64,
    },
    #[serde(rename = "lowTPS", rename_all = "camelCase")]
    LowTps {
        tick: u64,
        ticks_per_second: f64,
        threshold: f64,
    },
}

impl Anomaly {
    pub fn name(&self) -> &'static str {
        match self {
            Anomaly::SlowTick { .. } => "slowTick",
            Anomaly::HighMemory { .. } => "highMemory",
            Anomaly::EventLoopLag { .. } => "eventLoopLag",
            Anomaly::LowTps { .. } => "lowTPS",
        }
    }

    pub fn tick(&self) -> u64 {
        match *self {
            Anomaly::SlowTick { tick, .. }
            | Anomaly::HighMemory { tick, .. }
            | Anomaly::EventLoopLag { tick, .. }
            | Anomaly::LowTps { tick, .. } => tick,
        }
    }
}
