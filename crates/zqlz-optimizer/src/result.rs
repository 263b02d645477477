//! Aggregate result of one optimizer run

use crate::config::TargetDatabase;
use crate::error::Result;
use crate::suggestions::{
    IndexSuggestion, JoinReorderSuggestion, PredicatePushdownSuggestion, Priority,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Advisor that contributed to a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorKind {
    Index,
    Pushdown,
    JoinReorder,
}

impl AdvisorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Pushdown => "pushdown",
            Self::JoinReorder => "join_reorder",
        }
    }
}

impl std::fmt::Display for AdvisorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Note that an advisor skipped part of its input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedAdvisor {
    pub advisor: AdvisorKind,
    pub reason: String,
}

/// Suggestions gathered for one query.
///
/// Built once by the optimizer and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    index_suggestions: Vec<IndexSuggestion>,
    pushdown_suggestions: Vec<PredicatePushdownSuggestion>,
    join_suggestions: Vec<JoinReorderSuggestion>,
    analysis_time: Duration,
    summary: String,
    degraded: Vec<DegradedAdvisor>,
    target_database: TargetDatabase,
}

/// Everything the optimizer collected before the summary is written
#[derive(Debug, Default)]
pub(crate) struct ResultParts {
    pub index_suggestions: Vec<IndexSuggestion>,
    pub pushdown_suggestions: Vec<PredicatePushdownSuggestion>,
    pub join_suggestions: Vec<JoinReorderSuggestion>,
    pub analysis_time: Duration,
    pub degraded: Vec<DegradedAdvisor>,
    pub target_database: TargetDatabase,
}

impl OptimizationResult {
    pub(crate) fn from_parts(parts: ResultParts, verbose: bool) -> Self {
        let mut result = Self {
            index_suggestions: parts.index_suggestions,
            pushdown_suggestions: parts.pushdown_suggestions,
            join_suggestions: parts.join_suggestions,
            analysis_time: parts.analysis_time,
            summary: String::new(),
            degraded: parts.degraded,
            target_database: parts.target_database,
        };
        result.summary = result.generate_summary(verbose);
        result
    }

    /// A result with no suggestions and a fixed summary
    pub(crate) fn empty(summary: impl Into<String>, target_database: TargetDatabase) -> Self {
        Self {
            index_suggestions: Vec::new(),
            pushdown_suggestions: Vec::new(),
            join_suggestions: Vec::new(),
            analysis_time: Duration::ZERO,
            summary: summary.into(),
            degraded: Vec::new(),
            target_database,
        }
    }

    pub fn index_suggestions(&self) -> &[IndexSuggestion] {
        &self.index_suggestions
    }

    pub fn pushdown_suggestions(&self) -> &[PredicatePushdownSuggestion] {
        &self.pushdown_suggestions
    }

    pub fn join_suggestions(&self) -> &[JoinReorderSuggestion] {
        &self.join_suggestions
    }

    /// Wall-clock time spent in the advisors
    pub fn analysis_time(&self) -> Duration {
        self.analysis_time
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Advisors that skipped part of the query
    pub fn degraded(&self) -> &[DegradedAdvisor] {
        &self.degraded
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    pub fn target_database(&self) -> TargetDatabase {
        self.target_database
    }

    pub fn total_suggestions(&self) -> usize {
        self.index_suggestions.len() + self.pushdown_suggestions.len() + self.join_suggestions.len()
    }

    pub fn has_suggestions(&self) -> bool {
        self.total_suggestions() > 0
    }

    /// Returns true when there are no suggestions and no degraded advisors
    pub fn is_empty(&self) -> bool {
        !self.has_suggestions() && self.degraded.is_empty()
    }

    pub fn high_priority_index_suggestions(&self) -> impl Iterator<Item = &IndexSuggestion> {
        self.index_suggestions
            .iter()
            .filter(|s| s.priority() == Priority::High)
    }

    /// Serializes the result for external caching
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn generate_summary(&self, verbose: bool) -> String {
        let high = self
            .high_priority_index_suggestions()
            .count()
            + self
                .pushdown_suggestions
                .iter()
                .filter(|s| s.priority() == Priority::High)
                .count();

        let mut summary = if !self.has_suggestions() {
            "No optimization opportunities found.".to_string()
        } else if high > 0 {
            format!(
                "Found {} suggestion(s), {} high priority: {} index, {} predicate, {} join order.",
                self.total_suggestions(),
                high,
                self.index_suggestions.len(),
                self.pushdown_suggestions.len(),
                self.join_suggestions.len()
            )
        } else {
            format!(
                "Found {} suggestion(s): {} index, {} predicate, {} join order.",
                self.total_suggestions(),
                self.index_suggestions.len(),
                self.pushdown_suggestions.len(),
                self.join_suggestions.len()
            )
        };

        if verbose {
            summary.push_str(&format!(
                " Analyzed in {:.3}ms for {}.",
                self.analysis_time.as_secs_f64() * 1000.0,
                self.target_database.display_name()
            ));
            for note in &self.degraded {
                summary.push_str(&format!(" {} advisor degraded: {}.", note.advisor, note.reason));
            }
        }

        summary
    }
}
