//! World simulation server.
//!
//! Composition root that assembles:
//! 1. Configuration from the environment (`.env` supported)
//! 2. Logging to stderr and, optionally, a log file
//! 3. In-memory sources seeded with a demo world
//! 4. The tick scheduler, stopped gracefully on Ctrl-C
//!
//! ```bash
//! SIM_TICK_INTERVAL_MS=500 RUST_LOG=sim_runtime=debug cargo run -p world-server
//! ```

mod config;
mod demo;
mod logging;

use anyhow::{Context, Result};
use sim_runtime::{Event, EventBus, TickScheduler, Topic};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{MissedTickBehavior, interval_at};
use tracing::{info, warn};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    let _log_guard = logging::init(config.log_dir.as_deref())?;

    let world = demo::seed(config.demo_planets);
    info!(
        planets = world.production.len(),
        queued = world.construction.pending_items(),
        fleets = world.movement.in_transit(),
        "Demo world seeded"
    );

    let scheduler = TickScheduler::builder()
        .config(config.pipeline)
        .event_bus(EventBus::with_capacity(config.event_buffer))
        .production(world.production.clone())
        .construction(world.construction.clone())
        .movement(world.movement.clone())
        .build()?;

    let consumer = tokio::spawn(log_world_events(scheduler.clone()));

    scheduler.start();

    let mut summaries = interval_at(
        tokio::time::Instant::now() + config.summary_interval,
        config.summary_interval,
    );
    summaries.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = summaries.tick() => log_summary(&scheduler),
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    info!("Shutdown requested");
    scheduler.stop().await;
    log_summary(&scheduler);
    consumer.abort();

    Ok(())
}

fn log_summary(scheduler: &TickScheduler) {
    match serde_json::to_string(&scheduler.summary()) {
        Ok(json) => info!(
            tick = scheduler.tick_count(),
            skipped = scheduler.skipped_ticks(),
            summary = %json,
            "Metrics summary"
        ),
        Err(error) => warn!(%error, "Failed to serialize metrics summary"),
    }
}

/// Logs what each cycle changed in the world, plus anomalies.
async fn log_world_events(scheduler: TickScheduler) {
    let mut events = scheduler.subscribe_multiple(&[Topic::Tick, Topic::Anomaly]);
    let (Some(mut ticks), Some(mut anomalies)) =
        (events.remove(&Topic::Tick), events.remove(&Topic::Anomaly))
    else {
        return;
    };

    loop {
        let received = tokio::select! {
            event = ticks.recv() => event,
            event = anomalies.recv() => event,
        };

        match received {
            Ok(Event::Tick(tick)) => {
                for done in &tick.summary.completed_items {
                    info!(
                        tick = tick.tick,
                        planet = %done.planet_id,
                        kind = %done.item.kind,
                        level = done.item.level,
                        "Construction finished"
                    );
                }
                for ship in &tick.summary.arrived_ships {
                    info!(tick = tick.tick, ship = %ship, "Fleet arrived");
                }
            }
            Ok(Event::Anomaly(anomaly)) => match serde_json::to_string(&anomaly) {
                Ok(json) => warn!(anomaly = %json, "Performance anomaly"),
                Err(_) => warn!(anomaly = anomaly.name(), "Performance anomaly"),
            },
            Ok(_) => {}
            Err(RecvError::Lagged(missed)) => {
                warn!(missed, "Event consumer fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
