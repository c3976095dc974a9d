//! The tick scheduler: run-state machine, timer ownership, and query surface.
//!
//! [`TickScheduler`] is a cheap, cloneable handle. Whoever bootstraps the
//! world builds one through [`SchedulerBuilder`], calls [`start`], and awaits
//! [`stop`] at shutdown.
//!
//! [`start`]: TickScheduler::start
//! [`stop`]: TickScheduler::stop

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::api::{
    ConstructionSource, MovementSource, ProductionSource, Result, RuntimeError, Stage,
};
use crate::config::{ConfigError, PipelineConfig};
use crate::events::{Event, EventBus, LifecycleEvent, Topic};
use crate::metrics::{
    AnomalyThresholds, MemoryProbe, MetricsRecorder, MetricsSummary, ProcessMemoryProbe,
    TickSnapshot,
};
use crate::workers::{Pipeline, spawn_timer};

/// Scheduler run state. Changes only through `start` and `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum RunState {
    Idle,
    Running,
    Stopping,
}

/// Outcome of a timer fire trying to begin a cycle.
pub(crate) enum CycleClaim {
    Claimed,
    /// A cycle is still in flight; this fire is dropped.
    Busy,
    NotRunning,
}

/// State shared between the handle, the timer task, and cycle tasks.
pub(crate) struct Shared {
    pub(crate) config: PipelineConfig,
    pub(crate) pipeline: Pipeline,
    pub(crate) recorder: MetricsRecorder,
    pub(crate) event_bus: EventBus,
    pub(crate) tick_count: AtomicU64,
    pub(crate) skipped: AtomicU64,
    pub(crate) run_state: watch::Sender<RunState>,
    /// Single-flight flag: `true` while a cycle is executing.
    pub(crate) busy: watch::Sender<bool>,
    /// Armed timer. Its lock also serializes cycle claims against `stop`.
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    /// Claims the busy flag for a new cycle.
    ///
    /// Taken under the timer lock so a cycle can never begin after `stop`
    /// has moved the scheduler out of `Running`.
    pub(crate) fn try_begin_cycle(&self) -> CycleClaim {
        let _timer = self.lock_timer();

        if *self.run_state.borrow() != RunState::Running {
            return CycleClaim::NotRunning;
        }
        if self.busy.send_replace(true) {
            let skipped = self.skipped.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(
                target: "sim_runtime::scheduler",
                tick = self.tick_count.load(Ordering::SeqCst),
                skipped,
                "Previous cycle still running, skipping timer fire"
            );
            return CycleClaim::Busy;
        }
        CycleClaim::Claimed
    }

    /// Releases the busy flag. If a `stop` is draining, this cycle was the
    /// last one and the scheduler settles to `Idle`.
    pub(crate) fn end_cycle(&self) {
        let _timer = self.lock_timer();
        self.busy.send_replace(false);
        if *self.run_state.borrow() == RunState::Stopping {
            self.finish_stop();
        }
    }

    /// `Stopping` → `Idle`. Caller holds the timer lock and no cycle is in
    /// flight.
    fn finish_stop(&self) {
        self.recorder.lag_probe().disarm();
        self.run_state.send_replace(RunState::Idle);

        let tick_count = self.tick_count.load(Ordering::SeqCst);
        info!(
            target: "sim_runtime::scheduler",
            tick = tick_count,
            skipped = self.skipped.load(Ordering::Relaxed),
            "Tick scheduler stopped"
        );
        self.event_bus
            .publish(Event::Lifecycle(LifecycleEvent::Stopped { tick_count }));
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Periodic, single-flight driver of the world simulation.
///
/// Every `tick_interval` the scheduler runs production, construction, and
/// movement in that order against the injected sources, records a
/// [`TickSnapshot`], and publishes the outcome on the [`EventBus`].
///
/// # Events
///
/// | topic | events |
/// |---|---|
/// | [`Topic::Lifecycle`] | `started`, `stopped` |
/// | [`Topic::Tick`] | `tick`, `tickError` |
/// | [`Topic::Stats`] | `stats` |
/// | [`Topic::Anomaly`] | `slowTick`, `highMemory`, `eventLoopLag`, `lowTPS` |
#[derive(Clone)]
pub struct TickScheduler {
    shared: Arc<Shared>,
}

impl TickScheduler {
    /// Create a new scheduler builder
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    /// Arms the timer and moves `Idle` → `Running`.
    ///
    /// Idempotent: while `Running` or `Stopping` this does nothing, so the
    /// tick counter and the armed timer are left untouched. Outside a Tokio
    /// runtime nothing can be spawned; the call is logged and ignored.
    pub fn start(&self) {
        if tokio::runtime::Handle::try_current().is_err() {
            error!(
                target: "sim_runtime::scheduler",
                "start() called outside a Tokio runtime, scheduler left idle"
            );
            return;
        }

        let mut timer = self.shared.lock_timer();

        let transitioned = self.shared.run_state.send_if_modified(|state| {
            if *state == RunState::Idle {
                *state = RunState::Running;
                true
            } else {
                false
            }
        });
        if !transitioned {
            debug!(
                target: "sim_runtime::scheduler",
                state = %self.run_state(),
                "start() ignored, scheduler not idle"
            );
            return;
        }

        self.shared.recorder.lag_probe().arm();
        *timer = Some(spawn_timer(
            Arc::downgrade(&self.shared),
            self.shared.config.tick_interval(),
        ));

        info!(
            target: "sim_runtime::scheduler",
            tick_interval_ms = self.shared.config.tick_interval_ms(),
            tick = self.tick_count(),
            "Tick scheduler started"
        );
        self.shared
            .event_bus
            .publish(Event::Lifecycle(LifecycleEvent::Started {
                tick_interval_ms: self.shared.config.tick_interval_ms(),
            }));
    }

    /// Disarms the timer and waits for an in-flight cycle to finish.
    ///
    /// Resolves once the scheduler has left `Stopping`. A cycle already
    /// running completes and publishes its events first; no new cycle begins
    /// after this is called. Calling it while `Idle` resolves immediately.
    ///
    /// Cancel-safe: the transition to `Idle` is completed by the draining
    /// cycle itself, so dropping this future only stops the waiting.
    pub async fn stop(&self) {
        {
            let mut timer = self.shared.lock_timer();
            let current = *self.shared.run_state.borrow();
            match current {
                RunState::Idle => return,
                RunState::Stopping => {}
                RunState::Running => {
                    info!(target: "sim_runtime::scheduler", "Stopping tick scheduler");
                    self.shared.run_state.send_replace(RunState::Stopping);
                    if let Some(handle) = timer.take() {
                        handle.abort();
                    }
                    if !*self.shared.busy.borrow() {
                        self.shared.finish_stop();
                        return;
                    }
                }
            }
        }

        let mut state = self.shared.run_state.subscribe();
        // The sender lives in `shared`, so this cannot fail.
        let _ = state.wait_for(|s| *s != RunState::Stopping).await;
    }

    /// True iff the scheduler is `Running`.
    pub fn is_active(&self) -> bool {
        self.run_state() == RunState::Running
    }

    pub fn run_state(&self) -> RunState {
        *self.shared.run_state.borrow()
    }

    /// Completed cycles, failed ones included.
    pub fn tick_count(&self) -> u64 {
        self.shared.tick_count.load(Ordering::SeqCst)
    }

    /// Timer fires dropped because a cycle was still running.
    pub fn skipped_ticks(&self) -> u64 {
        self.shared.skipped.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> PipelineConfig {
        self.shared.config
    }

    /// Most recent snapshot, if any cycle has completed.
    pub fn stats(&self) -> Option<TickSnapshot> {
        self.shared.recorder.latest()
    }

    /// Up to `n` most recent snapshots, oldest first.
    pub fn recent_stats(&self, n: usize) -> Vec<TickSnapshot> {
        self.shared.recorder.recent(n)
    }

    pub fn summary(&self) -> MetricsSummary {
        self.shared.recorder.summary()
    }

    /// Read-only access to averages and history.
    pub fn recorder(&self) -> &MetricsRecorder {
        &self.shared.recorder
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use sim_runtime::{Event, Topic};
    ///
    /// let mut ticks = scheduler.subscribe(Topic::Tick);
    /// while let Ok(event) = ticks.recv().await {
    ///     if let Event::TickError(failure) = event {
    ///         tracing::warn!("tick {} failed: {}", failure.tick, failure.error);
    ///     }
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.shared.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.shared.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.shared.event_bus
    }
}

/// Builder for [`TickScheduler`].
pub struct SchedulerBuilder {
    config: std::result::Result<PipelineConfig, ConfigError>,
    production: Option<Arc<dyn ProductionSource>>,
    construction: Option<Arc<dyn ConstructionSource>>,
    movement: Option<Arc<dyn MovementSource>>,
    event_bus: Option<EventBus>,
    memory_probe: Option<Box<dyn MemoryProbe>>,
    thresholds: AnomalyThresholds,
}

impl SchedulerBuilder {
    fn new() -> Self {
        Self {
            config: Ok(PipelineConfig::default()),
            production: None,
            construction: None,
            movement: None,
            event_bus: None,
            memory_probe: None,
            thresholds: AnomalyThresholds::default(),
        }
    }

    /// Override pipeline configuration
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Ok(config);
        self
    }

    /// Set the tick interval; validated by [`build`](Self::build).
    pub fn tick_interval_ms(mut self, tick_interval_ms: u64) -> Self {
        self.config = PipelineConfig::new(tick_interval_ms);
        self
    }

    /// Set the resource-production source (stage 1)
    pub fn production(mut self, source: impl ProductionSource + 'static) -> Self {
        self.production = Some(Arc::new(source));
        self
    }

    /// Set the construction-queue source (stage 2)
    pub fn construction(mut self, source: impl ConstructionSource + 'static) -> Self {
        self.construction = Some(Arc::new(source));
        self
    }

    /// Set the movement source (stage 3)
    pub fn movement(mut self, source: impl MovementSource + 'static) -> Self {
        self.movement = Some(Arc::new(source));
        self
    }

    /// Publish on an existing bus instead of a fresh one.
    pub fn event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Replace the default `sysinfo` process probe.
    pub fn memory_probe(mut self, probe: impl MemoryProbe + 'static) -> Self {
        self.memory_probe = Some(Box::new(probe));
        self
    }

    pub fn thresholds(mut self, thresholds: AnomalyThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Build the scheduler in the `Idle` state.
    pub fn build(self) -> Result<TickScheduler> {
        let config = self.config?;
        let production = self.production.ok_or(RuntimeError::MissingSource {
            stage: Stage::Production,
        })?;
        let construction = self.construction.ok_or(RuntimeError::MissingSource {
            stage: Stage::Construction,
        })?;
        let movement = self.movement.ok_or(RuntimeError::MissingSource {
            stage: Stage::Movement,
        })?;

        let event_bus = self.event_bus.unwrap_or_default();
        let memory_probe = self
            .memory_probe
            .unwrap_or_else(|| Box::new(ProcessMemoryProbe::new()));
        let recorder = MetricsRecorder::new(event_bus.clone(), memory_probe, self.thresholds);

        let (run_state, _) = watch::channel(RunState::Idle);
        let (busy, _) = watch::channel(false);

        Ok(TickScheduler {
            shared: Arc::new(Shared {
                config,
                pipeline: Pipeline::new(production, construction, movement),
                recorder,
                event_bus,
                tick_count: AtomicU64::new(0),
                skipped: AtomicU64::new(0),
                run_state,
                busy,
                timer: Mutex::new(None),
            }),
        })
    }
}
