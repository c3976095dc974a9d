//! Ready-made source implementations.
//!
//! The in-memory sources keep world records in process and apply the simplest
//! possible rules (linear production, completion and arrival by timestamp).
//! They back the world server's demo mode and the integration tests.

mod memory;

pub use memory::{InMemoryConstruction, InMemoryMovement, InMemoryProduction};
