//! Planets and their resource stockpiles.
use std::ops::{Add, AddAssign, Mul};

use crate::Timestamp;
use crate::ids::{PlanetId, PlayerId};

/// Stockpile (or rate) of the three tradeable resources.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resources {
    pub metal: f64,
    pub crystal: f64,
    pub deuterium: f64,
}

impl Resources {
    pub const ZERO: Self = Self {
        metal: 0.0,
        crystal: 0.0,
        deuterium: 0.0,
    };

    pub const fn new(metal: f64, crystal: f64, deuterium: f64) -> Self {
        Self {
            metal,
            crystal,
            deuterium,
        }
    }

    /// Component-wise minimum, used to clamp a stockpile to storage capacity.
    pub fn min(self, cap: Self) -> Self {
        Self {
            metal: self.metal.min(cap.metal),
            crystal: self.crystal.min(cap.crystal),
            deuterium: self.deuterium.min(cap.deuterium),
        }
    }
}

impl Add for Resources {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            metal: self.metal + rhs.metal,
            crystal: self.crystal + rhs.crystal,
            deuterium: self.deuterium + rhs.deuterium,
        }
    }
}

impl AddAssign for Resources {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<f64> for Resources {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self {
            metal: self.metal * factor,
            crystal: self.crystal * factor,
            deuterium: self.deuterium * factor,
        }
    }
}

/// A colonised planet whose stockpile grows between cycles.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Planet {
    pub id: PlanetId,
    pub owner: PlayerId,
    pub name: String,
    pub resources: Resources,
    /// Hourly production rate.
    pub production_per_hour: Resources,
    pub storage_capacity: Resources,
    /// Last time resources were brought up to date.
    pub last_update: Timestamp,
}

impl Planet {
    pub fn new(id: PlanetId, owner: PlayerId, name: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id,
            owner,
            name: name.into(),
            resources: Resources::ZERO,
            production_per_hour: Resources::ZERO,
            storage_capacity: Resources::new(f64::MAX, f64::MAX, f64::MAX),
            last_update: now,
        }
    }

    pub fn with_production(mut self, per_hour: Resources) -> Self {
        self.production_per_hour = per_hour;
        self
    }

    pub fn with_storage(mut self, capacity: Resources) -> Self {
        self.storage_capacity = capacity;
        self
    }

    /// Credits production for the time elapsed since `last_update`, clamped to
    /// storage, and moves `last_update` forward to `now`.
    ///
    /// A `now` earlier than `last_update` credits nothing.
    pub fn accrue(&mut self, now: Timestamp) -> Resources {
        let elapsed_ms = (now - self.last_update).num_milliseconds().max(0);
        let hours = elapsed_ms as f64 / 3_600_000.0;

        let before = self.resources;
        self.resources = (self.resources + self.production_per_hour * hours).min(self.storage_capacity);
        if now > self.last_update {
            self.last_update = now;
        }

        Resources {
            metal: self.resources.metal - before.metal,
            crystal: self.resources.crystal - before.crystal,
            deuterium: self.resources.deuterium - before.deuterium,
        }
    }
}
