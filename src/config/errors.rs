//! Configuration errors

use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid log_level: '{0}'. Expected trace, info, warn, error or fatal.")]
    InvalidLogLevel(String),

    #[error("Configuration already installed")]
    AlreadyInstalled,
}
