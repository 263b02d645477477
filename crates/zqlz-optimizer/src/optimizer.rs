//! Query Optimizer - Advisor Coordination
//!
//! [`QueryOptimizer`] runs the enabled advisors over a query model, enforces
//! the analysis time budget and assembles an [`OptimizationResult`].
//!
//! # Example
//!
//! ```
//! use zqlz_core::{Predicate, QueryModel};
//! use zqlz_optimizer::QueryOptimizer;
//!
//! let query = QueryModel::new("users")
//!     .with_predicate(Predicate::like("name", "%son"))
//!     .with_predicate(Predicate::equals("id", 42i64));
//!
//! let result = QueryOptimizer::new().optimize(&query).unwrap();
//! assert!(result.has_suggestions());
//! ```

use crate::advisors::{IndexAdvisor, JoinReorderOptimizer, PredicatePushdownOptimizer};
use crate::config::{FailurePolicy, OptimizerConfig};
use crate::error::{OptimizerError, Result};
use crate::result::{AdvisorKind, DegradedAdvisor, OptimizationResult, ResultParts};
use crate::statistics::{DefaultTableStatistics, TableStatistics};
use std::sync::Arc;
use std::time::{Duration, Instant};
use zqlz_core::QueryModel;

/// Summary returned for SQL text, which is not analyzed
pub const SQL_TEXT_UNSUPPORTED: &str =
    "SQL text analysis is not supported; build a QueryModel to receive suggestions.";

/// Lifecycle of one analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnalysisState {
    Idle,
    Analyzing,
    Completed,
    Failed,
}

/// Tracks one call to [`QueryOptimizer::optimize`]
#[derive(Debug)]
pub(crate) struct AnalysisRun {
    state: AnalysisState,
    started: Option<Instant>,
    budget: Option<Duration>,
}

impl AnalysisRun {
    pub(crate) fn new(budget: Option<Duration>) -> Self {
        Self {
            state: AnalysisState::Idle,
            started: None,
            budget,
        }
    }

    pub(crate) fn state(&self) -> AnalysisState {
        self.state
    }

    pub(crate) fn start(&mut self) {
        self.transition(AnalysisState::Analyzing);
        self.started = Some(Instant::now());
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// Fails the run once the elapsed time exceeds the budget
    pub(crate) fn check_budget(&mut self) -> Result<()> {
        let Some(budget) = self.budget else {
            return Ok(());
        };

        let elapsed = self.elapsed();
        if elapsed > budget {
            let err = OptimizerError::TimeoutExceeded {
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: budget.as_millis() as u64,
            };
            self.fail(&err);
            return Err(err);
        }
        Ok(())
    }

    pub(crate) fn complete(&mut self) {
        self.transition(AnalysisState::Completed);
    }

    pub(crate) fn fail(&mut self, err: &OptimizerError) {
        tracing::warn!(error = %err, elapsed_ms = self.elapsed().as_millis() as u64, "query analysis failed");
        self.transition(AnalysisState::Failed);
    }

    fn transition(&mut self, next: AnalysisState) {
        let allowed = matches!(
            (self.state, next),
            (AnalysisState::Idle, AnalysisState::Analyzing)
                | (AnalysisState::Idle, AnalysisState::Failed)
                | (AnalysisState::Analyzing, AnalysisState::Completed)
                | (AnalysisState::Analyzing, AnalysisState::Failed)
        );
        if allowed {
            tracing::trace!(from = ?self.state, to = ?next, "analysis state");
            self.state = next;
        } else {
            tracing::trace!(from = ?self.state, to = ?next, "ignored analysis state change");
        }
    }
}

/// Runs the index, pushdown and join reorder advisors over a query model.
///
/// The optimizer holds only immutable configuration and shared statistics,
/// so one instance can serve concurrent callers.
#[derive(Clone)]
pub struct QueryOptimizer {
    config: OptimizerConfig,
    statistics: Arc<dyn TableStatistics>,
}

impl std::fmt::Debug for QueryOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryOptimizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for QueryOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryOptimizer {
    /// Creates an optimizer with the default configuration and statistics
    pub fn new() -> Self {
        Self {
            config: OptimizerConfig::default(),
            statistics: Arc::new(DefaultTableStatistics),
        }
    }

    /// Creates an optimizer with a validated configuration
    pub fn with_config(config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            statistics: Arc::new(DefaultTableStatistics),
        })
    }

    /// Replaces the statistics provider
    pub fn with_statistics(mut self, statistics: Arc<dyn TableStatistics>) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Analyzes a query model.
    ///
    /// Returns either a complete result or exactly one error. Advisors whose
    /// failure policy is [`FailurePolicy::Degrade`] contribute what they
    /// gathered plus a note in [`OptimizationResult::degraded`]. When the
    /// analysis overruns `max_analysis_time_ms` nothing is returned but
    /// [`OptimizerError::TimeoutExceeded`].
    pub fn optimize(&self, query: &QueryModel) -> Result<OptimizationResult> {
        let mut run = AnalysisRun::new(self.config.analysis_budget());

        if query.table().trim().is_empty() {
            let err = OptimizerError::invalid_argument("query model has no base table");
            run.fail(&err);
            return Err(err);
        }

        run.start();
        match self.run_advisors(query, &mut run) {
            Ok(mut parts) => {
                parts.analysis_time = run.elapsed();
                run.complete();
                let result = OptimizationResult::from_parts(parts, self.config.verbose_output);
                tracing::debug!(
                    table = query.table(),
                    suggestions = result.total_suggestions(),
                    degraded = result.degraded().len(),
                    elapsed_us = result.analysis_time().as_micros() as u64,
                    "query analysis complete"
                );
                Ok(result)
            }
            Err(err) => {
                if run.state() != AnalysisState::Failed {
                    run.fail(&err);
                }
                Err(err)
            }
        }
    }

    /// Accepts SQL text without analyzing it.
    ///
    /// There is no SQL parser; the result is always empty and its summary
    /// says so.
    pub fn optimize_sql(&self, sql: &str) -> OptimizationResult {
        tracing::debug!(length = sql.len(), "SQL text analysis requested");
        OptimizationResult::empty(SQL_TEXT_UNSUPPORTED, self.config.target_database)
    }

    fn run_advisors(&self, query: &QueryModel, run: &mut AnalysisRun) -> Result<ResultParts> {
        let mut parts = ResultParts {
            target_database: self.config.target_database,
            ..Default::default()
        };

        if self.config.index_suggestions_enabled {
            let (suggestions, notes) = IndexAdvisor::new(&self.config)
                .analyze_query(query)?
                .into_parts();
            parts.index_suggestions = suggestions;
            parts
                .degraded
                .extend(notes.into_iter().map(|reason| DegradedAdvisor {
                    advisor: AdvisorKind::Index,
                    reason,
                }));
            run.check_budget()?;
        }

        if self.config.predicate_pushdown_enabled {
            let optimizer = PredicatePushdownOptimizer::new(&self.config, self.statistics.clone());
            parts.pushdown_suggestions = self.apply_policy(
                AdvisorKind::Pushdown,
                self.config.failure_policy.pushdown,
                optimizer.optimize_query(query),
                &mut parts.degraded,
            )?;
            run.check_budget()?;
        }

        if self.config.join_reordering_enabled {
            let optimizer = JoinReorderOptimizer::new(&self.config, self.statistics.clone());
            parts.join_suggestions = self.apply_policy(
                AdvisorKind::JoinReorder,
                self.config.failure_policy.join_reorder,
                optimizer.optimize_join_order(query),
                &mut parts.degraded,
            )?;
        }

        run.check_budget()?;
        Ok(parts)
    }

    fn apply_policy<T>(
        &self,
        advisor: AdvisorKind,
        policy: FailurePolicy,
        outcome: Result<Vec<T>>,
        degraded: &mut Vec<DegradedAdvisor>,
    ) -> Result<Vec<T>> {
        match outcome {
            Ok(suggestions) => Ok(suggestions),
            Err(err) if policy == FailurePolicy::Degrade && err.is_recoverable() => {
                tracing::warn!(advisor = advisor.as_str(), error = %err, "advisor degraded");
                degraded.push(DegradedAdvisor {
                    advisor,
                    reason: err.to_string(),
                });
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests;
