//! Compiled predicates
//!
//! A predicate is an ordered list of bindings plus an evaluator. The
//! cell cursor fills one parameter per binding and calls `evaluate`.
//! The evaluator is either an [`Expr`] tree or an opaque closure.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::array::{ArrayDesc, AttributeId, Value};

use super::binding::Binding;
use super::node::Expr;

/// Predicate construction errors
#[derive(Debug, Error)]
pub enum PredicateError {
    #[error("Expression references parameter {index} but only {count} bindings exist")]
    UnboundParam { index: usize, count: usize },

    #[error("Binding {binding} references dimension {dim} but the array has {count}")]
    InvalidDimension {
        binding: usize,
        dim: usize,
        count: usize,
    },

    #[error("Binding {binding} references attribute {attr} but the array has {count}")]
    InvalidAttribute {
        binding: usize,
        attr: AttributeId,
        count: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid predicate JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Closure form of an evaluator
pub type PredicateFn = dyn Fn(&[Value]) -> Value + Send + Sync;

#[derive(Clone)]
enum Evaluator {
    Expr(Expr),
    Native(Arc<PredicateFn>),
}

/// Bindings plus evaluator, shared by every cursor of one query
#[derive(Clone)]
pub struct Predicate {
    bindings: Vec<Binding>,
    evaluator: Evaluator,
}

impl Predicate {
    /// Expression predicate; every parameter must have a binding
    pub fn new(bindings: Vec<Binding>, expr: Expr) -> Result<Self, PredicateError> {
        if let Some(index) = expr.max_param() {
            if index >= bindings.len() {
                return Err(PredicateError::UnboundParam {
                    index,
                    count: bindings.len(),
                });
            }
        }
        Ok(Self {
            bindings,
            evaluator: Evaluator::Expr(expr),
        })
    }

    /// Opaque predicate
    pub fn from_fn<F>(bindings: Vec<Binding>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            bindings,
            evaluator: Evaluator::Native(Arc::new(f)),
        }
    }

    /// Reads a [`PredicateDef`] from a JSON file
    pub fn load(path: &Path) -> Result<Self, PredicateError> {
        let content = std::fs::read_to_string(path)?;
        let def: PredicateDef = serde_json::from_str(&content)?;
        def.into_predicate()
    }

    /// Parameter sources, in parameter order
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Evaluates with one parameter per binding
    pub fn evaluate(&self, params: &[Value]) -> Value {
        match &self.evaluator {
            Evaluator::Expr(expr) => expr.evaluate(params),
            Evaluator::Native(f) => f(params),
        }
    }

    /// Checks every binding against the input schema
    pub fn validate_against(&self, desc: &ArrayDesc) -> Result<(), PredicateError> {
        for (binding, b) in self.bindings.iter().enumerate() {
            match b {
                Binding::Coordinate { dim } if *dim >= desc.num_dims() => {
                    return Err(PredicateError::InvalidDimension {
                        binding,
                        dim: *dim,
                        count: desc.num_dims(),
                    });
                }
                Binding::Attribute { attr } if *attr >= desc.num_attributes() => {
                    return Err(PredicateError::InvalidAttribute {
                        binding,
                        attr: *attr,
                        count: desc.num_attributes(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// First attribute referenced by an ATTRIBUTE binding
    pub fn first_bound_attribute(&self) -> Option<AttributeId> {
        self.bindings.iter().find_map(Binding::attribute)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Predicate");
        s.field("bindings", &self.bindings);
        match &self.evaluator {
            Evaluator::Expr(expr) => s.field("expr", expr),
            Evaluator::Native(_) => s.field("expr", &"<native>"),
        };
        s.finish()
    }
}

/// Serialized predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateDef {
    pub bindings: Vec<Binding>,
    pub expr: Expr,
}

impl PredicateDef {
    /// Compiles into a predicate
    pub fn into_predicate(self) -> Result<Predicate, PredicateError> {
        Predicate::new(self.bindings, self.expr)
    }
}

/// Collects bindings while building an expression.
///
/// ```ignore
/// let mut b = PredicateBuilder::new();
/// let expr = b.dim(0).gt(Expr::lit(7i64)).and(b.dim(1).lt(Expr::lit(23i64)));
/// let predicate = b.build(expr)?;
/// ```
#[derive(Debug, Default)]
pub struct PredicateBuilder {
    bindings: Vec<Binding>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameter bound to the coordinate on `dim`
    pub fn dim(&mut self, dim: usize) -> Expr {
        self.bind(Binding::Coordinate { dim })
    }

    /// Parameter bound to attribute `attr`
    pub fn attr(&mut self, attr: AttributeId) -> Expr {
        self.bind(Binding::Attribute { attr })
    }

    /// Parameter bound to a constant
    pub fn constant(&mut self, value: impl Into<Value>) -> Expr {
        self.bind(Binding::Value {
            value: value.into(),
        })
    }

    /// Same binding, same parameter
    fn bind(&mut self, binding: Binding) -> Expr {
        let index = match self.bindings.iter().position(|b| *b == binding) {
            Some(index) => index,
            None => {
                self.bindings.push(binding);
                self.bindings.len() - 1
            }
        };
        Expr::param(index)
    }

    pub fn build(self, expr: Expr) -> Result<Predicate, PredicateError> {
        Predicate::new(self.bindings, expr)
    }
}
