//! World data shared between the tick scheduler and its subsystems.
//!
//! `game-core` defines the records the simulation pipeline moves around each
//! cycle: planets and their stockpiles, construction queues, and ships in
//! transit. The formulas that advance them live with the subsystems; this
//! crate only carries the data and a few time-based helpers every
//! implementation needs.
pub mod construction;
pub mod fleet;
pub mod ids;
pub mod planet;

pub use construction::{CompletedItem, ConstructionQueue, QueueItem};
pub use fleet::{MovementWindow, Ship};
pub use ids::{PlanetId, PlayerId, QueueItemId, ShipId};
pub use planet::{Planet, Resources};

/// Wall-clock timestamp used across world records.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
