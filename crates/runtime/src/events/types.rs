//! Event payloads for each topic.

use std::sync::Arc;

use game_core::{CompletedItem, ShipId};
use serde::Serialize;

use crate::api::CycleError;

/// Scheduler run-state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The timer was armed (Idle → Running).
    Started { tick_interval_ms: u64 },
    /// The last in-flight cycle finished and the scheduler is idle again.
    Stopped { tick_count: u64 },
}

/// What a successful cycle did, for fan-out to clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    pub planets_updated: usize,
    pub queues_processed: usize,
    pub completed_items: Vec<CompletedItem>,
    pub ships_moved: usize,
    pub arrived_ships: Vec<ShipId>,
}

/// A cycle completed without error.
#[derive(Debug, Clone, PartialEq)]
pub struct TickEvent {
    pub tick: u64,
    pub summary: CycleSummary,
}

/// A cycle completed, but one of its stages failed.
///
/// The tick counter was still advanced for this cycle.
#[derive(Debug, Clone)]
pub struct TickErrorEvent {
    pub tick: u64,
    pub error: Arc<CycleError>,
}
