//! Unified error types surfaced by the runtime API.
//!
//! Sources report failures as [`SourceError`]; the cycle wraps them in a
//! [`StageError`] naming the pipeline stage, and the scheduler publishes the
//! result as a [`CycleError`]. Construction problems surface as
//! [`RuntimeError`] before any cycle runs.
use std::error::Error as StdError;

use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Result type returned by the pipeline source traits.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{stage} source not set")]
    MissingSource { stage: Stage },
}

/// Failure reported by an external pipeline source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{source_name} unavailable: {reason}")]
    Unavailable {
        source_name: &'static str,
        reason: String,
    },

    #[error("request rejected: {reason}")]
    Rejected { reason: String },

    #[error(transparent)]
    Other(Box<dyn StdError + Send + Sync>),
}

impl SourceError {
    pub fn unavailable(source_name: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            source_name,
            reason: reason.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn other(error: impl StdError + Send + Sync + 'static) -> Self {
        Self::Other(Box::new(error))
    }
}

/// The three ordered sub-steps of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Production,
    Construction,
    Movement,
}

impl Stage {
    /// Stages in execution order.
    pub const ORDER: [Stage; 3] = [Stage::Production, Stage::Construction, Stage::Movement];

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: SourceError,
}

impl StageError {
    pub fn new(stage: Stage, source: SourceError) -> Self {
        Self { stage, source }
    }
}

/// Why a cycle did not complete cleanly.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("cycle panicked: {message}")]
    Panicked { message: String },
}

impl CycleError {
    /// Stage that failed, if the failure came from a source call.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            CycleError::Stage(error) => Some(error.stage),
            CycleError::Panicked { .. } => None,
        }
    }
}
