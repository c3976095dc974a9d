//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{LifecycleEvent, TickErrorEvent, TickEvent};
use crate::metrics::{Anomaly, TickSnapshot};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// `started` / `stopped`
    Lifecycle,
    /// `tick` / `tickError`
    Tick,
    /// `stats`
    Stats,
    /// `slowTick` / `highMemory` / `eventLoopLag` / `lowTPS`
    Anomaly,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Lifecycle, Topic::Tick, Topic::Stats, Topic::Anomaly];
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone)]
pub enum Event {
    Lifecycle(LifecycleEvent),
    Tick(TickEvent),
    TickError(TickErrorEvent),
    Stats(TickSnapshot),
    Anomaly(Anomaly),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Lifecycle(_) => Topic::Lifecycle,
            Event::Tick(_) | Event::TickError(_) => Topic::Tick,
            Event::Stats(_) => Topic::Stats,
            Event::Anomaly(_) => Topic::Anomaly,
        }
    }

    /// Stable event name used by the network and telemetry layers.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Lifecycle(LifecycleEvent::Started { .. }) => "started",
            Event::Lifecycle(LifecycleEvent::Stopped { .. }) => "stopped",
            Event::Tick(_) => "tick",
            Event::TickError(_) => "tickError",
            Event::Stats(_) => "stats",
            Event::Anomaly(anomaly) => anomaly.name(),
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. The topic set is fixed, so channels are created
/// up front and never change.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity.max(1)).0))
            .collect();

        Self {
            channels: Arc::new(channels),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }

    /// Number of live receivers on a topic.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.sender(topic).receiver_count()
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        // Every topic is inserted in `with_capacity`.
        &self.channels[&topic]
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
