//! Rolling performance statistics for completed cycles.
//!
//! [`MetricsRecorder`] turns each cycle's duration into a [`TickSnapshot`],
//! keeps the bounded history, and publishes anomaly events. It is purely
//! observational: nothing it computes feeds back into scheduling.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::warn;

use super::{
    AnomalyThresholds, FixedMemoryProbe, LagProbe, MemoryProbe, MemoryUsage, MetricsSummary,
    SnapshotHistory, TickSnapshot,
};
use crate::events::{Event, EventBus};

/// Snapshots averaged by [`MetricsRecorder::average_tick_duration`] by default.
pub const DEFAULT_DURATION_SAMPLES: usize = 60;

/// Snapshots averaged by [`MetricsRecorder::average_tps`] by default.
pub const DEFAULT_TPS_SAMPLES: usize = 10;

/// Snapshots covered by [`MetricsRecorder::summary`].
pub const SUMMARY_WINDOW: usize = 60;

/// Width of the completion window behind `ticks_per_second`. A completion
/// exactly this old still counts.
const TPS_WINDOW: Duration = Duration::from_secs(1);

struct RecorderState {
    history: SnapshotHistory,
    /// Completion instants no older than [`TPS_WINDOW`].
    completions: VecDeque<Instant>,
}

pub struct MetricsRecorder {
    state: Mutex<RecorderState>,
    thresholds: AnomalyThresholds,
    memory: Box<dyn MemoryProbe>,
    lag: LagProbe,
    event_bus: EventBus,
}

impl MetricsRecorder {
    pub fn new(
        event_bus: EventBus,
        memory: Box<dyn MemoryProbe>,
        thresholds: AnomalyThresholds,
    ) -> Self {
        Self {
            state: Mutex::new(RecorderState {
                history: SnapshotHistory::new(),
                completions: VecDeque::new(),
            }),
            thresholds,
            memory,
            lag: LagProbe::new(),
            event_bus,
        }
    }

    /// Recorder with zeroed memory samples and default thresholds.
    pub fn detached(event_bus: EventBus) -> Self {
        Self::new(
            event_bus,
            Box::new(FixedMemoryProbe::default()),
            AnomalyThresholds::default(),
        )
    }

    pub fn thresholds(&self) -> &AnomalyThresholds {
        &self.thresholds
    }

    pub fn lag_probe(&self) -> &LagProbe {
        &self.lag
    }

    /// Records one completed cycle (successful or not).
    ///
    /// Samples host telemetry, appends the snapshot to history, and publishes
    /// one [`Event::Anomaly`] per violated threshold.
    pub fn record_tick(
        &self,
        tick_number: u64,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> TickSnapshot {
        let memory = MemoryUsage::from(self.memory.sample());
        let lag = self.lag.lag();

        let snapshot = {
            let mut state = self.lock();
            let now = Instant::now();
            state.completions.push_back(now);
            while state
                .completions
                .front()
                .is_some_and(|&at| now.saturating_duration_since(at) > TPS_WINDOW)
            {
                state.completions.pop_front();
            }

            let snapshot = TickSnapshot {
                tick_number,
                started_at,
                duration_ms: duration.as_millis() as u64,
                ticks_per_second: state.completions.len() as f64,
                memory,
                event_loop_lag_ms: lag.as_millis() as u64,
            };
            state.history.push(snapshot.clone());
            snapshot
        };

        for anomaly in self.thresholds.violations(&snapshot) {
            warn!(
                target: "sim_runtime::metrics",
                tick = tick_number,
                anomaly = anomaly.name(),
                detail = ?anomaly,
                "Tick anomaly detected"
            );
            self.event_bus.publish(Event::Anomaly(anomaly));
        }

        snapshot
    }

    pub fn latest(&self) -> Option<TickSnapshot> {
        self.lock().history.latest().cloned()
    }

    /// Up to `n` most recent snapshots, oldest first.
    pub fn recent(&self, n: usize) -> Vec<TickSnapshot> {
        self.lock().history.recent(n)
    }

    pub fn len(&self) -> usize {
        self.lock().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().history.is_empty()
    }

    /// Mean cycle duration in ms over the last `samples` snapshots.
    pub fn average_tick_duration(&self, samples: usize) -> f64 {
        self.average(samples, |s| s.duration_ms as f64)
    }

    /// Mean ticks-per-second over the last `samples` snapshots.
    pub fn average_tps(&self, samples: usize) -> f64 {
        self.average(samples, |s| s.ticks_per_second)
    }

    /// Mean event-loop lag in ms over the last `samples` snapshots.
    pub fn average_event_loop_lag(&self, samples: usize) -> f64 {
        self.average(samples, |s| s.event_loop_lag_ms as f64)
    }

    pub fn summary(&self) -> MetricsSummary {
        let state = self.lock();
        let window: Vec<&TickSnapshot> = state.history.iter_recent(SUMMARY_WINDOW).collect();
        if window.is_empty() {
            return MetricsSummary::default();
        }

        let count = window.len() as f64;
        let mean = |f: fn(&TickSnapshot) -> f64| window.iter().map(|s| f(s)).sum::<f64>() / count;

        MetricsSummary {
            average_tick_duration_ms: mean(|s| s.duration_ms as f64),
            average_tps: mean(|s| s.ticks_per_second),
            average_event_loop_lag_ms: mean(|s| s.event_loop_lag_ms as f64),
            memory: state.history.latest().map(|s| s.memory),
            anomalous_ticks: window
                .iter()
                .filter(|s| self.thresholds.is_anomalous(s))
                .count(),
            sampled_ticks: window.len(),
        }
    }

    fn average(&self, samples: usize, value: impl Fn(&TickSnapshot) -> f64) -> f64 {
        let state = self.lock();
        let (sum, count) = state
            .history
            .iter_recent(samples)
            .fold((0.0, 0usize), |(sum, count), s| (sum + value(s), count + 1));
        if count == 0 { 0.0 } else { sum / count as f64 }
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Topic;
    use crate::metrics::{Anomaly, MemorySample};

    const MB: u64 = 1024 * 1024;

    fn recorder_with_heap(bus: &EventBus, heap_used_mb: u64) -> MetricsRecorder {
        let sample = MemorySample {
            heap_used: heap_used_mb * MB,
            heap_total: 2 * heap_used_mb * MB,
            external: 0,
            resident_set_size: heap_used_mb * MB,
        };
        MetricsRecorder::new(
            bus.clone(),
            Box::new(FixedMemoryProbe(sample)),
            AnomalyThresholds::default(),
        )
    }

    fn drain_names(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<&'static str> {
        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            names.push(event.name());
        }
        names
    }

    #[test]
    fn snapshot_carries_tick_duration_and_memory() {
        let bus = EventBus::new();
        let recorder = recorder_with_heap(&bus, 64);
        let started_at = Utc::now();

        let snapshot = recorder.record_tick(5, started_at, Duration::from_millis(42));

        assert_eq!(snapshot.tick_number, 5);
        assert_eq!(snapshot.started_at, started_at);
        assert_eq!(snapshot.duration_ms, 42);
        assert_eq!(snapshot.memory.heap_used_mb, 64);
        assert_eq!(snapshot.memory.heap_total_mb, 128);
        assert_eq!(snapshot.event_loop_lag_ms, 0);
        assert_eq!(snapshot.ticks_per_second, 1.0);
        assert_eq!(recorder.latest(), Some(snapshot));
    }

    #[test]
    fn slow_tick_fires_above_but_not_at_limit() {
        let bus = EventBus::new();
        let mut anomalies = bus.subscribe(Topic::Anomaly);
        let recorder = recorder_with_heap(&bus, 10);

        recorder.record_tick(1, Utc::now(), Duration::from_millis(500));
        assert!(drain_names(&mut anomalies).is_empty());

        recorder.record_tick(2, Utc::now(), Duration::from_millis(501));
        match anomalies.try_recv() {
            Ok(Event::Anomaly(Anomaly::SlowTick {
                tick, duration_ms, ..
            })) => {
                assert_eq!(tick, 2);
                assert_eq!(duration_ms, 501);
            }
            other => panic!("expected slowTick, got {other:?}"),
        }
    }

    #[test]
    fn high_memory_is_reported() {
        let bus = EventBus::new();
        let mut anomalies = bus.subscribe(Topic::Anomaly);
        let recorder = recorder_with_heap(&bus, 501);

        recorder.record_tick(1, Utc::now(), Duration::from_millis(1));

        assert_eq!(drain_names(&mut anomalies), vec!["highMemory"]);
    }

    #[test]
    fn tps_counts_completions_in_last_second() {
        let bus = EventBus::new();
        let recorder = recorder_with_heap(&bus, 10);

        for tick in 1..=4 {
            recorder.record_tick(tick, Utc::now(), Duration::from_millis(1));
        }

        assert_eq!(recorder.latest().map(|s| s.ticks_per_second), Some(4.0));
    }

    #[tokio::test(start_paused = true)]
    async fn tps_window_prunes_old_completions() {
        let bus = EventBus::new();
        let recorder = recorder_with_heap(&bus, 10);

        recorder.record_tick(1, Utc::now(), Duration::ZERO);
        tokio::time::advance(Duration::from_millis(400)).await;
        recorder.record_tick(2, Utc::now(), Duration::ZERO);
        tokio::time::advance(Duration::from_millis(700)).await;
        let snapshot = recorder.record_tick(3, Utc::now(), Duration::ZERO);

        // Tick 1 is 1100ms old and dropped; tick 2 is 700ms old and kept.
        assert_eq!(snapshot.ticks_per_second, 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_exactly_one_second_old_still_counts() {
        let bus = EventBus::new();
        let recorder = recorder_with_heap(&bus, 10);

        recorder.record_tick(1, Utc::now(), Duration::ZERO);
        tokio::time::advance(Duration::from_millis(1000)).await;
        let snapshot = recorder.record_tick(2, Utc::now(), Duration::ZERO);
        assert_eq!(snapshot.ticks_per_second, 2.0);

        tokio::time::advance(Duration::from_millis(1)).await;
        let snapshot = recorder.record_tick(3, Utc::now(), Duration::ZERO);
        // Tick 1 is now 1001ms old.
        assert_eq!(snapshot.ticks_per_second, 2.0);
    }

    #[test]
    fn averages_use_most_recent_samples() {
        let bus = EventBus::new();
        let recorder = recorder_with_heap(&bus, 10);
        assert_eq!(recorder.average_tick_duration(DEFAULT_DURATION_SAMPLES), 0.0);
        assert_eq!(recorder.average_tps(DEFAULT_TPS_SAMPLES), 0.0);

        for (tick, ms) in [(1, 10), (2, 20), (3, 30), (4, 40)] {
            recorder.record_tick(tick, Utc::now(), Duration::from_millis(ms));
        }

        assert_eq!(recorder.average_tick_duration(2), 35.0);
        assert_eq!(recorder.average_tick_duration(60), 25.0);
        assert_eq!(recorder.average_tick_duration(0), 0.0);
        // All four completed within the same second: 1, 2, 3, 4 tps.
        assert_eq!(recorder.average_tps(10), 2.5);
    }

    #[test]
    fn summary_counts_anomalous_ticks_in_window() {
        let bus = EventBus::new();
        let recorder = recorder_with_heap(&bus, 10);
        assert_eq!(recorder.summary(), MetricsSummary::default());

        recorder.record_tick(1, Utc::now(), Duration::from_millis(100));
        recorder.record_tick(2, Utc::now(), Duration::from_millis(700));
        recorder.record_tick(3, Utc::now(), Duration::from_millis(100));

        let summary = recorder.summary();
        assert_eq!(summary.sampled_ticks, 3);
        assert_eq!(summary.anomalous_ticks, 1);
        assert_eq!(summary.average_tick_duration_ms, 300.0);
        assert_eq!(summary.average_event_loop_lag_ms, 0.0);
        assert_eq!(summary.memory.map(|m| m.heap_used_mb), Some(10));
    }

    #[test]
    fn history_is_bounded() {
        let bus = EventBus::with_capacity(1);
        let recorder = recorder_with_heap(&bus, 10);

        for tick in 1..=1001 {
            recorder.record_tick(tick, Utc::now(), Duration::ZERO);
        }

        assert_eq!(recorder.len(), 1000);
        assert_eq!(recorder.recent(1000).first().map(|s| s.tick_number), Some(2));
        assert_eq!(recorder.recent(3).len(), 3);
    }
}
