//! One execution of the three-stage pipeline.
//!
//! Stages run strictly in order, each awaited before the next begins, and the
//! whole body sits behind a single failure boundary: a stage error or a panic
//! inside a source ends the cycle early but never escapes it.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::api::{
    ConstructionSource, CycleError, MovementSource, ProductionSource, SourceResult, Stage,
    StageError,
};
use crate::events::{CycleSummary, Event, TickErrorEvent, TickEvent};
use crate::scheduler::Shared;

/// The three injected sources, in stage order.
#[derive(Clone)]
pub(crate) struct Pipeline {
    production: Arc<dyn ProductionSource>,
    construction: Arc<dyn ConstructionSource>,
    movement: Arc<dyn MovementSource>,
}

impl Pipeline {
    pub(crate) fn new(
        production: Arc<dyn ProductionSource>,
        construction: Arc<dyn ConstructionSource>,
        movement: Arc<dyn MovementSource>,
    ) -> Self {
        Self {
            production,
            construction,
            movement,
        }
    }

    /// Runs production, construction, then movement.
    pub(crate) async fn run(&self) -> Result<CycleSummary, StageError> {
        let mut summary = CycleSummary::default();

        self.produce(&mut summary)
            .await
            .map_err(|e| StageError::new(Stage::Production, e))?;
        self.construct(&mut summary)
            .await
            .map_err(|e| StageError::new(Stage::Construction, e))?;
        self.move_ships(&mut summary)
            .await
            .map_err(|e| StageError::new(Stage::Movement, e))?;

        Ok(summary)
    }

    async fn produce(&self, summary: &mut CycleSummary) -> SourceResult<()> {
        for planet in self.production.all_planets().await? {
            self.production.update_resources(planet).await?;
            summary.planets_updated += 1;
        }
        Ok(())
    }

    async fn construct(&self, summary: &mut CycleSummary) -> SourceResult<()> {
        for queue in self.construction.all_queues().await? {
            let completed = self.construction.process_queue(queue).await?;
            summary.completed_items.extend(completed);
            summary.queues_processed += 1;
        }
        Ok(())
    }

    async fn move_ships(&self, summary: &mut CycleSummary) -> SourceResult<()> {
        for ship in self.movement.moving_ships().await? {
            let id = ship.id;
            if self.movement.update_ship_position(ship).await? {
                summary.arrived_ships.push(id);
            }
            summary.ships_moved += 1;
        }
        Ok(())
    }
}

/// Ends the cycle on drop, however it ends, finishing a pending `stop`.
struct BusyGuard<'a>(&'a Shared);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.end_cycle();
    }
}

/// Runs one full cycle and publishes its outcome.
///
/// The caller must have claimed the busy flag; it is released after the
/// `tick`/`tickError` and `stats` events are out.
pub(crate) async fn run_cycle(shared: Arc<Shared>) {
    let _busy = BusyGuard(&shared);

    let started_at = Utc::now();
    let started = Instant::now();

    // The body runs as its own task so a panicking source is caught at the
    // join point instead of unwinding through the scheduler.
    let pipeline = shared.pipeline.clone();
    let outcome = match tokio::spawn(async move { pipeline.run().await }).await {
        Ok(Ok(summary)) => Ok(summary),
        Ok(Err(stage_error)) => Err(CycleError::Stage(stage_error)),
        Err(join_error) => Err(CycleError::Panicked {
            message: if join_error.is_panic() {
                panic_message(join_error.into_panic())
            } else {
                join_error.to_string()
            },
        }),
    };

    let duration = started.elapsed();
    let tick = shared.tick_count.fetch_add(1, Ordering::SeqCst) + 1;
    let snapshot = shared.recorder.record_tick(tick, started_at, duration);

    match outcome {
        Ok(summary) => {
            debug!(
                target: "sim_runtime::cycle",
                tick,
                duration_ms = snapshot.duration_ms,
                planets = summary.planets_updated,
                queues = summary.queues_processed,
                completed = summary.completed_items.len(),
                ships = summary.ships_moved,
                arrived = summary.arrived_ships.len(),
                "Cycle completed"
            );
            shared.event_bus.publish(Event::Tick(TickEvent { tick, summary }));
        }
        Err(error) => {
            warn!(
                target: "sim_runtime::cycle",
                tick,
                stage = error.stage().map(Stage::as_str),
                error = %error,
                "Cycle failed"
            );
            shared.event_bus.publish(Event::TickError(TickErrorEvent {
                tick,
                error: Arc::new(error),
            }));
        }
    }

    trace!(target: "sim_runtime::cycle", tick, "Publishing stats");
    shared.event_bus.publish(Event::Stats(snapshot));
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "non-string panic payload".to_string(),
        },
    }
}
