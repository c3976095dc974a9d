//! Server configuration loaded from the environment.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use sim_runtime::PipelineConfig;

/// Everything the server binary needs to boot.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub pipeline: PipelineConfig,
    /// How often the metrics summary is logged.
    pub summary_interval: Duration,
    /// Per-topic event channel capacity.
    pub event_buffer: usize,
    /// Directory for the log file. `None` keeps logging on stderr only.
    pub log_dir: Option<PathBuf>,
    /// Number of demo planets seeded into the in-memory sources.
    pub demo_planets: u64,
}

impl ServerConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SIM_TICK_INTERVAL_MS` - Milliseconds between cycles (default: 1000)
    /// - `SIM_SUMMARY_INTERVAL_SECS` - Seconds between summary logs (default: 10)
    /// - `SIM_EVENT_BUFFER` - Event channel capacity per topic (default: 256)
    /// - `SIM_LOG_DIR` - Write logs to this directory as well (optional)
    /// - `SIM_DEMO_PLANETS` - Demo planets to seed (default: 8)
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self {
            pipeline: PipelineConfig::from_env()?,
            ..Self::default()
        };

        if let Some(secs) = read_env::<u64>("SIM_SUMMARY_INTERVAL_SECS") {
            config.summary_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(buffer) = read_env::<usize>("SIM_EVENT_BUFFER") {
            config.event_buffer = buffer.max(1);
        }
        config.log_dir = env::var_os("SIM_LOG_DIR").map(PathBuf::from);
        if let Some(planets) = read_env::<u64>("SIM_DEMO_PLANETS") {
            config.demo_planets = planets;
        }

        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            summary_interval: Duration::from_secs(10),
            event_buffer: 256,
            log_dir: None,
            demo_planets: 8,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
