//! Asynchronous capability traits for the subsystems a cycle drives.
//!
//! The scheduler never computes production, construction, or movement itself.
//! Each stage calls one of these traits, so the world can be backed by a
//! database, an in-memory store, or test doubles.
use std::sync::Arc;

use async_trait::async_trait;
use game_core::{CompletedItem, ConstructionQueue, Planet, Ship};

use super::errors::SourceResult;

/// Resource production (stage 1).
#[async_trait]
pub trait ProductionSource: Send + Sync {
    /// Every planet whose stockpile should advance this cycle.
    async fn all_planets(&self) -> SourceResult<Vec<Planet>>;

    /// Applies production to a single planet and returns the updated record.
    async fn update_resources(&self, planet: Planet) -> SourceResult<Planet>;
}

/// Construction queues (stage 2).
#[async_trait]
pub trait ConstructionSource: Send + Sync {
    /// Every queue with pending items.
    async fn all_queues(&self) -> SourceResult<Vec<ConstructionQueue>>;

    /// Resolves due items in a queue and returns the ones that completed.
    async fn process_queue(&self, queue: ConstructionQueue) -> SourceResult<Vec<CompletedItem>>;
}

/// Fleet movement (stage 3).
#[async_trait]
pub trait MovementSource: Send + Sync {
    /// Every ship currently in transit.
    async fn moving_ships(&self) -> SourceResult<Vec<Ship>>;

    /// Advances a ship along its movement window.
    ///
    /// Returns `true` when the ship arrived during this call.
    async fn update_ship_position(&self, ship: Ship) -> SourceResult<bool>;
}

#[async_trait]
impl<T: ProductionSource + ?Sized> ProductionSource for Arc<T> {
    async fn all_planets(&self) -> SourceResult<Vec<Planet>> {
        (**self).all_planets().await
    }

    async fn update_resources(&self, planet: Planet) -> SourceResult<Planet> {
        (**self).update_resources(planet).await
    }
}

#[async_trait]
impl<T: ConstructionSource + ?Sized> ConstructionSource for Arc<T> {
    async fn all_queues(&self) -> SourceResult<Vec<ConstructionQueue>> {
        (**self).all_queues().await
    }

    async fn process_queue(&self, queue: ConstructionQueue) -> SourceResult<Vec<CompletedItem>> {
        (**self).process_queue(queue).await
    }
}

#[async_trait]
impl<T: MovementSource + ?Sized> MovementSource for Arc<T> {
    async fn moving_ships(&self) -> SourceResult<Vec<Ship>> {
        (**self).moving_ships().await
    }

    async fn update_ship_position(&self, ship: Ship) -> SourceResult<bool> {
        (**self).update_ship_position(ship).await
    }
}
