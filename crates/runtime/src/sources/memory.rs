use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use game_core::{
    CompletedItem, ConstructionQueue, Planet, PlanetId, QueueItem, Ship, ShipId,
};

use crate::api::{ConstructionSource, MovementSource, ProductionSource, SourceError, SourceResult};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Planets held in memory; production accrues linearly with wall-clock time.
#[derive(Default)]
pub struct InMemoryProduction {
    planets: Mutex<BTreeMap<PlanetId, Planet>>,
}

impl InMemoryProduction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, planet: Planet) {
        lock(&self.planets).insert(planet.id, planet);
    }

    pub fn planet(&self, id: PlanetId) -> Option<Planet> {
        lock(&self.planets).get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.planets).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.planets).is_empty()
    }
}

#[async_trait]
impl ProductionSource for InMemoryProduction {
    async fn all_planets(&self) -> SourceResult<Vec<Planet>> {
        Ok(lock(&self.planets).values().cloned().collect())
    }

    async fn update_resources(&self, mut planet: Planet) -> SourceResult<Planet> {
        let mut planets = lock(&self.planets);
        if !planets.contains_key(&planet.id) {
            return Err(SourceError::rejected(format!("unknown planet {}", planet.id)));
        }
        planet.accrue(Utc::now());
        planets.insert(planet.id, planet.clone());
        Ok(planet)
    }
}

/// Construction queues held in memory; items complete once their time passes.
#[derive(Default)]
pub struct InMemoryConstruction {
    queues: Mutex<BTreeMap<PlanetId, ConstructionQueue>>,
}

impl InMemoryConstruction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item to a planet's queue, creating the queue if needed.
    pub fn enqueue(&self, planet_id: PlanetId, item: QueueItem) {
        lock(&self.queues)
            .entry(planet_id)
            .or_insert_with(|| ConstructionQueue::new(planet_id))
            .items
            .push(item);
    }

    /// Items still waiting across all queues.
    pub fn pending_items(&self) -> usize {
        lock(&self.queues).values().map(|q| q.items.len()).sum()
    }
}

#[async_trait]
impl ConstructionSource for InMemoryConstruction {
    async fn all_queues(&self) -> SourceResult<Vec<ConstructionQueue>> {
        Ok(lock(&self.queues)
            .values()
            .filter(|q| !q.is_empty())
            .cloned()
            .collect())
    }

    /// Drains the stored queue, not the passed copy, so items enqueued since
    /// `all_queues` are kept.
    async fn process_queue(&self, queue: ConstructionQueue) -> SourceResult<Vec<CompletedItem>> {
        let mut queues = lock(&self.queues);
        let Some(stored) = queues.get_mut(&queue.planet_id) else {
            return Ok(Vec::new());
        };

        let completed = stored.drain_completed(Utc::now());
        if stored.is_empty() {
            queues.remove(&queue.planet_id);
        }
        Ok(completed)
    }
}

/// Ships in transit held in memory; a ship is removed once it arrives.
#[derive(Default)]
pub struct InMemoryMovement {
    ships: Mutex<BTreeMap<ShipId, Ship>>,
}

impl InMemoryMovement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self, ship: Ship) {
        lock(&self.ships).insert(ship.id, ship);
    }

    pub fn in_transit(&self) -> usize {
        lock(&self.ships).len()
    }
}

#[async_trait]
impl MovementSource for InMemoryMovement {
    async fn moving_ships(&self) -> SourceResult<Vec<Ship>> {
        Ok(lock(&self.ships).values().cloned().collect())
    }

    async fn update_ship_position(&self, ship: Ship) -> SourceResult<bool> {
        if !ship.movement.has_arrived(Utc::now()) {
            return Ok(false);
        }
        lock(&self.ships).remove(&ship.id);
        Ok(true)
    }
}
