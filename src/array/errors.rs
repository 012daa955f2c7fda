//! Array access error types
//!
//! Error codes:
//! - AERO_NO_CURRENT_ELEMENT (ERROR)
//! - AERO_CURSOR_MISALIGNED (FATAL)
//! - AERO_OPERATION_FAILED (FATAL)
//! - AERO_INVALID_ATTRIBUTE (ERROR)
//! - AERO_DIMENSION_MISMATCH (ERROR)
//! - AERO_INVALID_SCHEMA (ERROR)
//! - AERO_INVALID_CELL (ERROR)
//!
//! A `set_position` that finds nothing is not an error; it returns `Ok(false)`.

use std::fmt;

use super::Coordinates;

/// Severity levels for array errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation failed but the enclosing query may report it
    Error,
    /// Storage or cursor state is inconsistent; the query must stop
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Array error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayErrorCode {
    /// Cursor has no current chunk or cell
    AeroNoCurrentElement,
    /// A companion cursor could not follow the primary cursor (FATAL)
    AeroCursorMisaligned,
    /// Storage refused an operation that must succeed (FATAL)
    AeroOperationFailed,
    /// Attribute id outside the array schema
    AeroInvalidAttribute,
    /// Coordinates or ranges with the wrong number of dimensions
    AeroDimensionMismatch,
    /// Array schema is malformed
    AeroInvalidSchema,
    /// Cell outside the array bounds or with values that do not fit the schema
    AeroInvalidCell,
}

impl ArrayErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ArrayErrorCode::AeroNoCurrentElement => "AERO_NO_CURRENT_ELEMENT",
            ArrayErrorCode::AeroCursorMisaligned => "AERO_CURSOR_MISALIGNED",
            ArrayErrorCode::AeroOperationFailed => "AERO_OPERATION_FAILED",
            ArrayErrorCode::AeroInvalidAttribute => "AERO_INVALID_ATTRIBUTE",
            ArrayErrorCode::AeroDimensionMismatch => "AERO_DIMENSION_MISMATCH",
            ArrayErrorCode::AeroInvalidSchema => "AERO_INVALID_SCHEMA",
            ArrayErrorCode::AeroInvalidCell => "AERO_INVALID_CELL",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            ArrayErrorCode::AeroCursorMisaligned | ArrayErrorCode::AeroOperationFailed => {
                Severity::Fatal
            }
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ArrayErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Array error type with full context
#[derive(Debug, Clone)]
pub struct ArrayError {
    code: ArrayErrorCode,
    message: String,
    position: Option<Coordinates>,
}

impl ArrayError {
    /// Cursor was read while exhausted or before positioning
    pub fn no_current_element(what: impl Into<String>) -> Self {
        Self {
            code: ArrayErrorCode::AeroNoCurrentElement,
            message: format!("No current element: {}", what.into()),
            position: None,
        }
    }

    /// Companion cursor failed to reach a position the primary reached (FATAL)
    pub fn misaligned(attribute: usize, position: &Coordinates) -> Self {
        Self {
            code: ArrayErrorCode::AeroCursorMisaligned,
            message: format!(
                "Attribute {} has no data at {:?} although the primary cursor does",
                attribute, position
            ),
            position: Some(position.clone()),
        }
    }

    /// Storage refused an operation that must succeed (FATAL)
    pub fn operation_failed(operation: &str, position: &Coordinates) -> Self {
        Self {
            code: ArrayErrorCode::AeroOperationFailed,
            message: format!("Operation failed: {} at {:?}", operation, position),
            position: Some(position.clone()),
        }
    }

    /// Attribute id does not exist in the schema
    pub fn invalid_attribute(attribute: usize, count: usize) -> Self {
        Self {
            code: ArrayErrorCode::AeroInvalidAttribute,
            message: format!(
                "Attribute {} out of range (array has {} attributes)",
                attribute, count
            ),
            position: None,
        }
    }

    /// Dimension count mismatch
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self {
            code: ArrayErrorCode::AeroDimensionMismatch,
            message: format!("Expected {} dimensions, got {}", expected, actual),
            position: None,
        }
    }

    /// Malformed schema
    pub fn invalid_schema(reason: impl Into<String>) -> Self {
        Self {
            code: ArrayErrorCode::AeroInvalidSchema,
            message: reason.into(),
            position: None,
        }
    }

    /// Cell rejected by the schema
    pub fn invalid_cell(position: &Coordinates, reason: impl Into<String>) -> Self {
        Self {
            code: ArrayErrorCode::AeroInvalidCell,
            message: format!("Invalid cell at {:?}: {}", position, reason.into()),
            position: Some(position.clone()),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ArrayErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the position involved, if any
    pub fn position(&self) -> Option<&Coordinates> {
        self.position.as_ref()
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for ArrayError {}

/// Result type for array operations
pub type ArrayResult<T> = Result<T, ArrayError>;
