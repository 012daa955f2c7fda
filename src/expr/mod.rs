//! Predicate layer
//!
//! Predicates are opaque to the cursors: they see an ordered list of
//! [`Binding`]s and an `evaluate(params) -> Value` call. [`Expr`] is the
//! built-in evaluator; closures are accepted through
//! [`Predicate::from_fn`].

mod binding;
mod node;
mod predicate;

pub use binding::Binding;
pub use node::{CmpOp, Expr};
pub use predicate::{Predicate, PredicateBuilder, PredicateDef, PredicateError, PredicateFn};
