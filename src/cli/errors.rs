//! CLI-specific error types
//!
//! Every error reaching the binary boundary is a `CliError`; `main`
//! prints it and exits non-zero.

use std::fmt;
use std::io;

use crate::array::ArrayError;
use crate::config::ConfigError;
use crate::expr::PredicateError;
use crate::storage::LoadError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout)
    IoError,
    /// Malformed command line value
    InvalidArgument,
    /// Array file could not be loaded
    LoadFailed,
    /// Predicate file could not be loaded
    PredicateError,
    /// Building or iterating the filtered array failed
    QueryFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "AERO_CLI_CONFIG_ERROR",
            Self::IoError => "AERO_CLI_IO_ERROR",
            Self::InvalidArgument => "AERO_CLI_INVALID_ARGUMENT",
            Self::LoadFailed => "AERO_CLI_LOAD_FAILED",
            Self::PredicateError => "AERO_CLI_PREDICATE_ERROR",
            Self::QueryFailed => "AERO_CLI_QUERY_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidArgument, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<LoadError> for CliError {
    fn from(e: LoadError) -> Self {
        Self::new(CliErrorCode::LoadFailed, e.to_string())
    }
}

impl From<PredicateError> for CliError {
    fn from(e: PredicateError) -> Self {
        Self::new(CliErrorCode::PredicateError, e.to_string())
    }
}

impl From<ArrayError> for CliError {
    fn from(e: ArrayError) -> Self {
        Self::new(CliErrorCode::QueryFailed, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::invalid_argument("bad --low");
        assert_eq!(err.to_string(), "AERO_CLI_INVALID_ARGUMENT: bad --low");
    }

    #[test]
    fn test_array_error_keeps_inner_code() {
        let err: CliError = ArrayError::dimension_mismatch(2, 1).into();
        assert_eq!(err.code(), &CliErrorCode::QueryFailed);
        assert!(err.message().contains("AERO_DIMENSION_MISMATCH"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: CliError = ConfigError::InvalidLogLevel("loud".into()).into();
        assert_eq!(err.code_str(), "AERO_CLI_CONFIG_ERROR");
    }
}
