//! Seed data for the in-memory sources.
use std::sync::Arc;

use chrono::{Duration, Utc};
use game_core::{
    MovementWindow, Planet, PlanetId, PlayerId, QueueItem, QueueItemId, Resources, Ship, ShipId,
};
use sim_runtime::{InMemoryConstruction, InMemoryMovement, InMemoryProduction};

/// Handles to the seeded sources. The scheduler gets clones of the `Arc`s.
pub struct DemoWorld {
    pub production: Arc<InMemoryProduction>,
    pub construction: Arc<InMemoryConstruction>,
    pub movement: Arc<InMemoryMovement>,
}

/// Builds `planets` planets, one queued building per planet, and one fleet
/// between each pair of neighbours. Completion and arrival times are spread
/// over the first minute so the log shows activity right away.
pub fn seed(planets: u64) -> DemoWorld {
    let now = Utc::now();
    let production = InMemoryProduction::new();
    let construction = InMemoryConstruction::new();
    let movement = InMemoryMovement::new();

    for n in 1..=planets {
        let id = PlanetId(n);
        let owner = PlayerId(n % 4 + 1);
        let level = n as f64;
        production.insert(
            Planet::new(id, owner, format!("Colony {n}"), now)
                .with_production(Resources::new(30.0 * level, 15.0 * level, 5.0 * level))
                .with_storage(Resources::new(100_000.0, 100_000.0, 50_000.0)),
        );

        construction.enqueue(
            id,
            QueueItem {
                id: QueueItemId(n),
                kind: "metal_mine".into(),
                level: 1 + (n % 5) as u32,
                completes_at: now + Duration::seconds((n * 5) as i64),
            },
        );

        if n < planets {
            movement.dispatch(Ship {
                id: ShipId(n),
                owner,
                origin: id,
                destination: PlanetId(n + 1),
                movement: MovementWindow::new(now, now + Duration::seconds((n * 7) as i64)),
            });
        }
    }

    DemoWorld {
        production: Arc::new(production),
        construction: Arc::new(construction),
        movement: Arc::new(movement),
    }
}
