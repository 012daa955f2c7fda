//! Cell values
//!
//! Values are what attribute cursors return and what predicates consume.
//! JSON mapping is untagged: `null`, `true`, `42`, `4.2`, `"text"`.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Attribute value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int64,
    /// 64-bit floating point
    Double,
    /// UTF-8 string
    String,
}

impl ValueType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int64 => "int64",
            ValueType::Double => "double",
            ValueType::String => "string",
        }
    }

    /// Value a cell holds when nothing was written to it
    pub fn default_value(&self) -> Value {
        match self {
            ValueType::Bool => Value::Bool(false),
            ValueType::Int64 => Value::Int64(0),
            ValueType::Double => Value::Double(0.0),
            ValueType::String => Value::String(String::new()),
        }
    }

    /// Whether `value` may be stored in an attribute of this type.
    ///
    /// Null is accepted everywhere; integers are accepted for doubles.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (ValueType::Bool, Value::Bool(_))
                | (ValueType::Int64, Value::Int64(_))
                | (ValueType::Double, Value::Double(_))
                | (ValueType::Double, Value::Int64(_))
                | (ValueType::String, Value::String(_))
        )
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int64(i64),
    /// Floating point value
    Double(f64),
    /// String value
    String(String),
}

impl Value {
    /// Returns true for `Value::Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean view; anything that is not `Bool(true)` reads as false
    pub fn as_bool(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    /// Integer view (doubles are not truncated)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; integers widen to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// String view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Compares two non-null values of compatible types.
    ///
    /// Integers compare exactly; mixed integer/double compare as f64.
    /// Returns None for null operands or incompatible types.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => None,
            },
        }
    }

    /// Appends a stable byte encoding of this value (used for checksums)
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Value::Null => out.push(0),
            Value::Bool(b) => {
                out.push(1);
                out.push(u8::from(*b));
            }
            Value::Int64(v) => {
                out.push(2);
                out.extend_from_slice(&v.to_le_bytes());
            }
            Value::Double(v) => {
                out.push(3);
                out.extend_from_slice(&v.to_bits().to_le_bytes());
            }
            Value::String(s) => {
                out.push(4);
                out.extend_from_slice(&(s.len() as u64).to_le_bytes());
                out.extend_from_slice(s.as_bytes());
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{:?}", s),
        }
    }
}
