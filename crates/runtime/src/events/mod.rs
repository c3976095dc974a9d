//! Topic-based event bus for scheduler events.
//!
//! Events are published to a fixed set of topics, and consumers subscribe
//! only to the topics they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{CycleSummary, LifecycleEvent, TickErrorEvent, TickEvent};
