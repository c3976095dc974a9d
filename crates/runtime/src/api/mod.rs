//! Public API surface: source traits and error types.

mod errors;
mod sources;

pub use errors::{
    CycleError, Result, RuntimeError, SourceError, SourceResult, Stage, StageError,
};
pub use sources::{ConstructionSource, MovementSource, ProductionSource};
