//! Construction queues and the items they complete.
use crate::Timestamp;
use crate::ids::{PlanetId, QueueItemId};

/// A building or research order waiting in a planet's queue.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueueItem {
    pub id: QueueItemId,
    /// What is being built, e.g. `"metal_mine"`.
    pub kind: String,
    /// Target level once the item completes.
    pub level: u32,
    pub completes_at: Timestamp,
}

impl QueueItem {
    pub fn is_complete(&self, now: Timestamp) -> bool {
        self.completes_at <= now
    }
}

/// Pending construction work for one planet.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstructionQueue {
    pub planet_id: PlanetId,
    pub items: Vec<QueueItem>,
}

impl ConstructionQueue {
    pub fn new(planet_id: PlanetId) -> Self {
        Self {
            planet_id,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes every item due at `now` and returns them as completions, in
    /// queue order.
    pub fn drain_completed(&mut self, now: Timestamp) -> Vec<CompletedItem> {
        let (done, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| item.is_complete(now));
        self.items = pending;

        done.into_iter()
            .map(|item| CompletedItem {
                planet_id: self.planet_id,
                item,
            })
            .collect()
    }
}

/// An item that finished during a cycle.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompletedItem {
    pub planet_id: PlanetId,
    pub item: QueueItem,
}
