//! Ships in transit between planets.
use crate::Timestamp;
use crate::ids::{PlanetId, PlayerId, ShipId};

/// Departure and arrival times of a movement order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovementWindow {
    pub start_time: Timestamp,
    pub arrival_time: Timestamp,
}

impl MovementWindow {
    pub fn new(start_time: Timestamp, arrival_time: Timestamp) -> Self {
        Self {
            start_time,
            arrival_time,
        }
    }

    /// Fraction of the journey covered at `now`, in `[0.0, 1.0]`.
    pub fn progress(&self, now: Timestamp) -> f64 {
        let total = (self.arrival_time - self.start_time).num_milliseconds();
        if total <= 0 {
            return 1.0;
        }
        let done = (now - self.start_time).num_milliseconds();
        (done as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn has_arrived(&self, now: Timestamp) -> bool {
        now >= self.arrival_time
    }
}

/// A ship (or fleet) currently moving between two planets.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ship {
    pub id: ShipId,
    pub owner: PlayerId,
    pub origin: PlanetId,
    pub destination: PlanetId,
    pub movement: MovementWindow,
}
