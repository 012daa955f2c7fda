//! Boolean expressions over bound parameters
//!
//! Evaluation follows SQL three-valued logic: comparisons with a null
//! operand yield null, `AND` is false if any operand is false, `OR` is
//! true if any operand is true, and null wins otherwise.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::array::Value;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CmpOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
}

impl CmpOp {
    /// Returns true if this is an equality operation
    pub fn is_equality(&self) -> bool {
        matches!(self, CmpOp::Eq | CmpOp::Ne)
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ne => ordering != Ordering::Equal,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Lte => ordering != Ordering::Greater,
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Gte => ordering != Ordering::Less,
        }
    }
}

/// Expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    /// Parameter `index` of the evaluation vector
    Param { index: usize },
    /// Constant
    Literal { value: Value },
    /// Binary comparison
    Compare {
        cmp: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Conjunction
    And { args: Vec<Expr> },
    /// Disjunction
    Or { args: Vec<Expr> },
    /// Negation
    Not { arg: Box<Expr> },
}

impl Expr {
    /// Parameter reference
    pub fn param(index: usize) -> Expr {
        Expr::Param { index }
    }

    /// Constant
    pub fn lit(value: impl Into<Value>) -> Expr {
        Expr::Literal {
            value: value.into(),
        }
    }

    /// Comparison `self <cmp> other`
    pub fn compare(self, cmp: CmpOp, other: Expr) -> Expr {
        Expr::Compare {
            cmp,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    pub fn equals(self, other: Expr) -> Expr {
        self.compare(CmpOp::Eq, other)
    }

    pub fn not_equals(self, other: Expr) -> Expr {
        self.compare(CmpOp::Ne, other)
    }

    pub fn lt(self, other: Expr) -> Expr {
        self.compare(CmpOp::Lt, other)
    }

    pub fn lte(self, other: Expr) -> Expr {
        self.compare(CmpOp::Lte, other)
    }

    pub fn gt(self, other: Expr) -> Expr {
        self.compare(CmpOp::Gt, other)
    }

    pub fn gte(self, other: Expr) -> Expr {
        self.compare(CmpOp::Gte, other)
    }

    /// `self AND other`, flattening nested conjunctions
    pub fn and(self, other: Expr) -> Expr {
        match self {
            Expr::And { mut args } => {
                args.push(other);
                Expr::And { args }
            }
            first => Expr::And {
                args: vec![first, other],
            },
        }
    }

    /// `self OR other`, flattening nested disjunctions
    pub fn or(self, other: Expr) -> Expr {
        match self {
            Expr::Or { mut args } => {
                args.push(other);
                Expr::Or { args }
            }
            first => Expr::Or {
                args: vec![first, other],
            },
        }
    }

    /// `NOT self`
    pub fn negate(self) -> Expr {
        Expr::Not {
            arg: Box::new(self),
        }
    }

    /// Largest parameter index referenced, if any
    pub fn max_param(&self) -> Option<usize> {
        match self {
            Expr::Param { index } => Some(*index),
            Expr::Literal { .. } => None,
            Expr::Compare { left, right, .. } => left.max_param().max(right.max_param()),
            Expr::And { args } | Expr::Or { args } => {
                args.iter().filter_map(Expr::max_param).max()
            }
            Expr::Not { arg } => arg.max_param(),
        }
    }

    /// Evaluates against a parameter vector. Missing parameters read as null.
    pub fn evaluate(&self, params: &[Value]) -> Value {
        match self {
            Expr::Param { index } => params.get(*index).cloned().unwrap_or(Value::Null),
            Expr::Literal { value } => value.clone(),
            Expr::Compare { cmp, left, right } => {
                let l = left.evaluate(params);
                let r = right.evaluate(params);
                if l.is_null() || r.is_null() {
                    return Value::Null;
                }
                match l.compare(&r) {
                    Some(ordering) => Value::Bool(cmp.holds(ordering)),
                    // No coercion: mismatched types are never equal
                    None if cmp.is_equality() => Value::Bool(*cmp == CmpOp::Ne),
                    None => Value::Null,
                }
            }
            Expr::And { args } => {
                let mut saw_null = false;
                for arg in args {
                    match truth(&arg.evaluate(params)) {
                        Some(false) => return Value::Bool(false),
                        Some(true) => {}
                        None => saw_null = true,
                    }
                }
                if saw_null {
                    Value::Null
                } else {
                    Value::Bool(true)
                }
            }
            Expr::Or { args } => {
                let mut saw_null = false;
                for arg in args {
                    match truth(&arg.evaluate(params)) {
                        Some(true) => return Value::Bool(true),
                        Some(false) => {}
                        None => saw_null = true,
                    }
                }
                if saw_null {
                    Value::Null
                } else {
                    Value::Bool(false)
                }
            }
            Expr::Not { arg } => match truth(&arg.evaluate(params)) {
                Some(b) => Value::Bool(!b),
                None => Value::Null,
            },
        }
    }
}

/// Non-boolean operands count as unknown
fn truth(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}
