//! ZQLZ Core - Query model shared by the ZQLZ analysis crates
//!
//! This crate defines the read-only description of a query that analysis
//! tooling inspects:
//!
//! - `QueryModel` - Base table, top-level predicates, joins, grouping and ordering
//! - `Predicate` - Discriminated union of filter predicate kinds
//! - `Value` - Literal operands carried by predicates

mod predicate;
mod query;
mod types;

pub use predicate::*;
pub use query::*;
pub use types::*;
