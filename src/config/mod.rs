//! Process-wide configuration
//!
//! ```json
//! { "result_prefetch_queue_size": 4, "log_level": "info" }
//! ```
//!
//! Every field is optional. The configuration is installed at most once
//! per process; readers that run before installation see the defaults.

mod errors;

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::observability::{log_event, Event, Logger, Severity};

pub use errors::{ConfigError, ConfigResult};

static INSTALLED: OnceLock<GridConfig> = OnceLock::new();
static DEFAULTS: OnceLock<GridConfig> = OnceLock::new();

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Capacity of the materialized chunk cache (default 4, 0 disables it)
    #[serde(default = "default_result_prefetch_queue_size")]
    pub result_prefetch_queue_size: usize,

    /// Minimum logged severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_result_prefetch_queue_size() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            result_prefetch_queue_size: default_result_prefetch_queue_size(),
            log_level: default_log_level(),
        }
    }
}

impl GridConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        log_event(
            Event::ConfigLoaded,
            &[("path", path.display().to_string().as_str())],
        );
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: GridConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.severity().map(|_| ())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> ConfigResult<Severity> {
        Severity::parse(&self.log_level)
            .ok_or_else(|| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    /// Installs `config` as the process-wide configuration and applies its
    /// log level. Fails if a configuration is already installed.
    pub fn install(config: GridConfig) -> ConfigResult<()> {
        let severity = config.severity()?;
        let queue_size = config.result_prefetch_queue_size.to_string();
        INSTALLED
            .set(config)
            .map_err(|_| ConfigError::AlreadyInstalled)?;
        Logger::set_min_severity(severity);
        log_event(
            Event::ConfigInstalled,
            &[
                ("log_level", severity.as_str()),
                ("result_prefetch_queue_size", queue_size.as_str()),
            ],
        );
        Ok(())
    }

    /// The installed configuration, or the defaults
    pub fn global() -> &'static GridConfig {
        match INSTALLED.get() {
            Some(config) => config,
            None => DEFAULTS.get_or_init(GridConfig::default),
        }
    }
}
