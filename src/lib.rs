//! aerogrid - range-filtered iteration over sparse chunked arrays
//!
//! The core is [`between::BetweenArray`]: a view over an input array
//! that yields only the chunks which both exist in storage and
//! intersect a set of coordinate ranges, and within those chunks only
//! the cells that satisfy a predicate.

pub mod array;
pub mod between;
pub mod cli;
pub mod config;
pub mod expr;
pub mod observability;
pub mod operator;
pub mod ranges;
pub mod storage;
