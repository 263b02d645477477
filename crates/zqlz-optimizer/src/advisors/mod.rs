//! The three advisors run by the optimizer
//!
//! - `IndexAdvisor` - candidate indexes for filtered, joined and grouped columns
//! - `PredicatePushdownOptimizer` - predicate ordering and pushdown
//! - `JoinReorderOptimizer` - cheaper join sequences from table statistics

mod index_advisor;
mod join_reorder;
mod pushdown;

pub use index_advisor::*;
pub use join_reorder::*;
pub use pushdown::*;

/// Output of an advisor that may have skipped part of its input
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorOutcome<T> {
    value: T,
    degraded: Vec<String>,
}

impl<T> AdvisorOutcome<T> {
    /// An outcome that covered all of its input
    pub fn complete(value: T) -> Self {
        Self {
            value,
            degraded: Vec::new(),
        }
    }

    /// An outcome that skipped input for the given reasons
    pub fn degraded(value: T, reasons: Vec<String>) -> Self {
        Self {
            value,
            degraded: reasons,
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    /// Reasons input was skipped
    pub fn degraded_reasons(&self) -> &[String] {
        &self.degraded
    }

    pub fn into_parts(self) -> (T, Vec<String>) {
        (self.value, self.degraded)
    }
}
