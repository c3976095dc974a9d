//! Cycle performance metrics and anomaly detection.
//!
//! Tracks cycle duration, cadence, memory, and scheduler lag for monitoring
//! and alerting. Anomalies are published on [`Topic::Anomaly`](crate::Topic)
//! and never alter scheduling.

mod history;
mod probe;
mod recorder;
mod snapshot;
mod thresholds;

pub use history::{HISTORY_CAPACITY, SnapshotHistory};
pub use probe::{FixedMemoryProbe, LAG_PROBE_PERIOD, LagProbe, MemoryProbe, ProcessMemoryProbe};
pub use recorder::{
    DEFAULT_DURATION_SAMPLES, DEFAULT_TPS_SAMPLES, MetricsRecorder, SUMMARY_WINDOW,
};
pub use snapshot::{MemorySample, MemoryUsage, MetricsSummary, TickSnapshot, bytes_to_mb};
pub use thresholds::{Anomaly, AnomalyThresholds};
