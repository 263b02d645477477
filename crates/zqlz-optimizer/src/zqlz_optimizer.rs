//! ZQLZ Optimizer - Static query optimization advice
//!
//! This crate inspects a [`zqlz_core::QueryModel`] and suggests:
//! - Candidate indexes for filtered, joined, grouped and sorted columns
//! - A better evaluation order for filter predicates, and filters that can
//!   run on a joined table before the join
//! - Cheaper join sequences based on table statistics
//!
//! Nothing is executed and no database is contacted. All estimates are
//! heuristic.

pub mod advisors;
pub mod config;
pub mod error;
pub mod join_graph;
pub mod optimizer;
pub mod result;
pub mod selectivity;
pub mod statistics;
pub mod suggestions;

pub use advisors::*;
pub use config::*;
pub use error::*;
pub use join_graph::*;
pub use optimizer::*;
pub use result::*;
pub use selectivity::*;
pub use statistics::*;
pub use suggestions::*;
