//! Host telemetry probes: process memory and scheduler responsiveness.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::MemorySample;

/// Source of process memory figures.
pub trait MemoryProbe: Send + Sync {
    fn sample(&self) -> MemorySample;
}

/// Reads the current process's memory through `sysinfo`.
///
/// A native process has no managed heap to report separately, so resident
/// memory stands in for `heap_used`, virtual memory for `heap_total`, and
/// `external` is always zero.
pub struct ProcessMemoryProbe {
    pid: Option<Pid>,
    system: Mutex<System>,
}

impl ProcessMemoryProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(error) => {
                tracing::warn!(
                    target: "sim_runtime::metrics",
                    error,
                    "Cannot resolve current pid, memory samples will be zero"
                );
                None
            }
        };

        Self {
            pid,
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for ProcessMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for ProcessMemoryProbe {
    fn sample(&self) -> MemorySample {
        let Some(pid) = self.pid else {
            return MemorySample::default();
        };

        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        match system.process(pid) {
            Some(process) => MemorySample {
                heap_used: process.memory(),
                heap_total: process.virtual_memory(),
                external: 0,
                resident_set_size: process.memory(),
            },
            None => MemorySample::default(),
        }
    }
}

/// Probe that always reports the same figures.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedMemoryProbe(pub MemorySample);

impl MemoryProbe for FixedMemoryProbe {
    fn sample(&self) -> MemorySample {
        self.0
    }
}

/// Period of the checkpoint task; the smallest resolution Tokio's timer offers.
pub const LAG_PROBE_PERIOD: Duration = Duration::from_millis(1);

/// Measures how long the runtime takes to get back to a self-rescheduling task.
///
/// While armed, a background task wakes every [`LAG_PROBE_PERIOD`] and stamps
/// a checkpoint. [`lag`](Self::lag) is the time since the last stamp: near
/// zero on a responsive runtime, large when tasks hog the executor.
pub struct LagProbe {
    checkpoint: Arc<Mutex<Option<Instant>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LagProbe {
    pub fn new() -> Self {
        Self {
            checkpoint: Arc::new(Mutex::new(None)),
            task: Mutex::new(None),
        }
    }

    /// Starts the checkpoint task. No-op when already armed.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn arm(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            return;
        }

        stamp(&self.checkpoint);
        let checkpoint = Arc::clone(&self.checkpoint);
        *task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(LAG_PROBE_PERIOD).await;
                stamp(&checkpoint);
            }
        }));
    }

    /// Stops the checkpoint task; later readings report zero lag.
    pub fn disarm(&self) {
        if let Some(task) = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        *self
            .checkpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_armed(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Time since the last checkpoint, or zero when disarmed.
    pub fn lag(&self) -> Duration {
        self.checkpoint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map(|last| Instant::now().saturating_duration_since(last))
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for LagProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LagProbe {
    fn drop(&mut self) {
        self.disarm();
    }
}

fn stamp(checkpoint: &Mutex<Option<Instant>>) {
    *checkpoint.lock().unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disarmed_probe_reports_zero_lag() {
        let probe = LagProbe::new();
        assert!(!probe.is_armed());
        assert_eq!(probe.lag(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn armed_probe_tracks_checkpoints() {
        let probe = LagProbe::new();
        probe.arm();
        assert!(probe.is_armed());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(probe.lag() < Duration::from_millis(10));

        probe.disarm();
        assert!(!probe.is_armed());
        assert_eq!(probe.lag(), Duration::ZERO);
    }

    #[tokio::test]
    async fn blocked_executor_shows_up_as_lag() {
        let probe = LagProbe::new();
        probe.arm();
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Blocking the only worker keeps the checkpoint task from running,
        // like a cycle hogging the executor.
        std::thread::sleep(Duration::from_millis(150));
        assert!(probe.lag() >= Duration::from_millis(100));

        probe.disarm();
    }

    #[test]
    fn fixed_probe_returns_its_sample() {
        let sample = MemorySample {
            heap_used: 1,
            heap_total: 2,
            external: 3,
            resident_set_size: 4,
        };
        assert_eq!(FixedMemoryProbe(sample).sample(), sample);
    }

    #[test]
    fn process_probe_reports_resident_memory() {
        let sample = ProcessMemoryProbe::new().sample();
        assert_eq!(sample.external, 0);
        assert_eq!(sample.heap_used, sample.resident_set_size);
    }
}
