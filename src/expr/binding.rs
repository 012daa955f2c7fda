//! Predicate parameter bindings

use serde::{Deserialize, Serialize};

use crate::array::{AttributeId, Value};

/// Source of one predicate parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Binding {
    /// Coordinate of the current cell on dimension `dim`
    Coordinate { dim: usize },
    /// Value of attribute `attr` at the current cell
    Attribute { attr: AttributeId },
    /// Constant
    Value { value: Value },
}

impl Binding {
    /// Returns the bound attribute for ATTRIBUTE bindings
    pub fn attribute(&self) -> Option<AttributeId> {
        match self {
            Binding::Attribute { attr } => Some(*attr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_json_shape() {
        let bindings: Vec<Binding> = serde_json::from_str(
            r#"[{"kind":"coordinate","dim":1},{"kind":"attribute","attr":0},{"kind":"value","value":7}]"#,
        )
        .unwrap();
        assert_eq!(bindings[0], Binding::Coordinate { dim: 1 });
        assert_eq!(bindings[1].attribute(), Some(0));
        assert_eq!(bindings[2], Binding::Value { value: Value::Int64(7) });
    }

    #[test]
    fn test_only_attribute_bindings_report_attribute() {
        assert_eq!(Binding::Coordinate { dim: 0 }.attribute(), None);
        assert_eq!(Binding::Value { value: Value::Null }.attribute(), None);
    }
}
