//! Pipeline configuration and loaders.
use std::env;
use std::time::Duration;

use thiserror::Error;

/// Environment variable holding the tick interval in milliseconds.
pub const TICK_INTERVAL_ENV: &str = "SIM_TICK_INTERVAL_MS";

/// Interval used when nothing is configured.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tick interval must be a positive number of milliseconds")]
    ZeroInterval,

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Configuration captured when the scheduler is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    tick_interval: Duration,
}

impl PipelineConfig {
    /// Validates and wraps a tick interval.
    pub fn new(tick_interval_ms: u64) -> Result<Self, ConfigError> {
        if tick_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(Self {
            tick_interval: Duration::from_millis(tick_interval_ms),
        })
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SIM_TICK_INTERVAL_MS` - Milliseconds between cycle attempts (default: 1000)
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(TICK_INTERVAL_ENV) {
            Ok(raw) => Self::parse_interval(&raw),
            Err(_) => Self::new(DEFAULT_TICK_INTERVAL_MS),
        }
    }

    fn parse_interval(raw: &str) -> Result<Self, ConfigError> {
        let ms = raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidValue {
                key: TICK_INTERVAL_ENV,
                value: raw.to_string(),
            })?;
        Self::new(ms)
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval.as_millis() as u64
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
        }
    }
}
