//! Test doubles for the three pipeline sources.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use game_core::{
    CompletedItem, ConstructionQueue, MovementWindow, Planet, PlanetId, PlayerId, QueueItem,
    QueueItemId, Ship, ShipId,
};
use sim_runtime::metrics::{FixedMemoryProbe, MemorySample};
use sim_runtime::{
    ConstructionSource, Event, MovementSource, ProductionSource, SchedulerBuilder, SourceError,
    SourceResult, TickScheduler,
};
use tokio::sync::broadcast;

/// Ordered record of every source call, shared by all three fakes.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<&'static str>>>);

impl CallLog {
    fn push(&self, call: &'static str) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

/// Production source that can be told to fail, panic, or stall on given calls.
pub struct FakeProduction {
    planets: usize,
    fail_on: Vec<usize>,
    panic_on: Vec<usize>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: Arc<AtomicUsize>,
    log: CallLog,
}

impl FakeProduction {
    pub fn new(log: &CallLog) -> Self {
        Self {
            planets: 2,
            fail_on: Vec::new(),
            panic_on: Vec::new(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            log: log.clone(),
        }
    }

    /// Fail `all_planets` on these 1-based call numbers.
    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.fail_on = calls.to_vec();
        self
    }

    /// Panic in `all_planets` on these 1-based call numbers.
    pub fn panicking_on(mut self, calls: &[usize]) -> Self {
        self.panic_on = calls.to_vec();
        self
    }

    /// Make every `all_planets` call take this long.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Highest number of concurrent `all_planets` calls observed.
    pub fn max_in_flight(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.max_in_flight)
    }
}

#[async_trait]
impl ProductionSource for FakeProduction {
    async fn all_planets(&self) -> SourceResult<Vec<Planet>> {
        self.log.push("all_planets");
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panic_on.contains(&call) {
            panic!("production formula blew up on call {call}");
        }
        if self.fail_on.contains(&call) {
            return Err(SourceError::unavailable("planet store", "connection reset"));
        }

        Ok((1..=self.planets as u64)
            .map(|id| Planet::new(PlanetId(id), PlayerId(1), format!("P{id}"), Utc::now()))
            .collect())
    }

    async fn update_resources(&self, planet: Planet) -> SourceResult<Planet> {
        self.log.push("update_resources");
        Ok(planet)
    }
}

/// Construction source with one queue that completes one item per cycle.
pub struct FakeConstruction {
    fail: bool,
    log: CallLog,
}

impl FakeConstruction {
    pub fn new(log: &CallLog) -> Self {
        Self {
            fail: false,
            log: log.clone(),
        }
    }

    pub fn always_failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl ConstructionSource for FakeConstruction {
    async fn all_queues(&self) -> SourceResult<Vec<ConstructionQueue>> {
        self.log.push("all_queues");
        if self.fail {
            return Err(SourceError::rejected("queue table locked"));
        }
        Ok(vec![ConstructionQueue {
            planet_id: PlanetId(1),
            items: vec![QueueItem {
                id: QueueItemId(10),
                kind: "metal_mine".into(),
                level: 2,
                completes_at: Utc::now(),
            }],
        }])
    }

    async fn process_queue(&self, queue: ConstructionQueue) -> SourceResult<Vec<CompletedItem>> {
        self.log.push("process_queue");
        Ok(queue
            .items
            .into_iter()
            .map(|item| CompletedItem {
                planet_id: queue.planet_id,
                item,
            })
            .collect())
    }
}

/// Movement source with two ships; only the first one arrives.
pub struct FakeMovement {
    log: CallLog,
}

impl FakeMovement {
    pub fn new(log: &CallLog) -> Self {
        Self { log: log.clone() }
    }
}

#[async_trait]
impl MovementSource for FakeMovement {
    async fn moving_ships(&self) -> SourceResult<Vec<Ship>> {
        self.log.push("moving_ships");
        let now = Utc::now();
        Ok((1..=2)
            .map(|id| Ship {
                id: ShipId(id),
                owner: PlayerId(1),
                origin: PlanetId(1),
                destination: PlanetId(2),
                movement: MovementWindow::new(now, now),
            })
            .collect())
    }

    async fn update_ship_position(&self, ship: Ship) -> SourceResult<bool> {
        self.log.push("update_ship_position");
        Ok(ship.id == ShipId(1))
    }
}

/// Builder preloaded with well-behaved fakes and a quiet memory probe.
pub fn builder(log: &CallLog, production: FakeProduction) -> SchedulerBuilder {
    TickScheduler::builder()
        .production(production)
        .construction(FakeConstruction::new(log))
        .movement(FakeMovement::new(log))
        .memory_probe(FixedMemoryProbe(MemorySample {
            heap_used: 32 * 1024 * 1024,
            heap_total: 64 * 1024 * 1024,
            external: 0,
            resident_set_size: 48 * 1024 * 1024,
        }))
}

pub fn scheduler(interval_ms: u64, production: FakeProduction, log: &CallLog) -> TickScheduler {
    builder(log, production)
        .tick_interval_ms(interval_ms)
        .build()
        .expect("scheduler should build")
}

/// Everything currently buffered on a receiver.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn names(events: &[Event]) -> Vec<&'static str> {
    events.iter().map(Event::name).collect()
}
