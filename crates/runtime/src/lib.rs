//! Tick scheduler for the real-time strategy world simulation.
//!
//! This crate drives world-state advancement on a fixed cadence. Each cycle
//! pulls due work from three external sources (resource production,
//! construction queues, fleet movement), runs it in a fixed order, and
//! publishes the outcome on a topic-based event bus. Consumers embed a
//! [`TickScheduler`] built with [`TickScheduler::builder`].
//!
//! Modules are organized by responsibility:
//! - [`scheduler`] hosts the run-state machine and builder
//! - [`api`] exposes the source traits and error types implementers use
//! - [`events`] provides the topic-based event bus
//! - [`metrics`] records per-cycle snapshots and detects anomalies
//! - [`sources`] ships in-memory source implementations
//! - [`config`] loads and validates pipeline configuration
//! - `workers` keeps the timer and cycle tasks internal to the crate
pub mod api;
pub mod config;
pub mod events;
pub mod metrics;
pub mod scheduler;
pub mod sources;

mod workers;

pub use api::{
    ConstructionSource, CycleError, MovementSource, ProductionSource, Result, RuntimeError,
    SourceError, SourceResult, Stage, StageError,
};
pub use config::{ConfigError, PipelineConfig};
pub use events::{
    CycleSummary, Event, EventBus, LifecycleEvent, TickErrorEvent, TickEvent, Topic,
};
pub use metrics::{
    Anomaly, AnomalyThresholds, MemoryProbe, MemoryUsage, MetricsRecorder, MetricsSummary,
    TickSnapshot,
};
pub use scheduler::{RunState, SchedulerBuilder, TickScheduler};
pub use sources::{InMemoryConstruction, InMemoryMovement, InMemoryProduction};
