//! Optimizer configuration
//!
//! [`OptimizerConfig`] is an immutable value consumed by the optimizer. It is
//! built with `with_*` methods or deserialized from TOML; every field has a
//! default so partial documents are accepted.

use crate::error::{OptimizerError, Result};
use serde::{Deserialize, Serialize};

/// Database the analysis targets.
///
/// Descriptive only; suggestions and DDL are the same for every target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetDatabase {
    #[default]
    Generic,
    Postgresql,
    Mysql,
    H2,
    Oracle,
    SqlServer,
}

impl TargetDatabase {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Generic => "Generic SQL",
            Self::Postgresql => "PostgreSQL",
            Self::Mysql => "MySQL",
            Self::H2 => "H2",
            Self::Oracle => "Oracle",
            Self::SqlServer => "SQL Server",
        }
    }
}

/// What an advisor does when it cannot extract what it needs from the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log, record a degraded note on the result and continue with what was gathered
    Degrade,
    /// Abort the whole analysis with the error
    Propagate,
}

/// Failure policy per advisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailurePolicies {
    pub index: FailurePolicy,
    pub pushdown: FailurePolicy,
    pub join_reorder: FailurePolicy,
}

impl Default for FailurePolicies {
    fn default() -> Self {
        Self {
            index: FailurePolicy::Degrade,
            pushdown: FailurePolicy::Propagate,
            join_reorder: FailurePolicy::Propagate,
        }
    }
}

impl FailurePolicies {
    /// Every advisor degrades instead of failing the analysis
    pub fn degrade_all() -> Self {
        Self {
            index: FailurePolicy::Degrade,
            pushdown: FailurePolicy::Degrade,
            join_reorder: FailurePolicy::Degrade,
        }
    }

    /// Every advisor propagates its failures
    pub fn propagate_all() -> Self {
        Self {
            index: FailurePolicy::Propagate,
            pushdown: FailurePolicy::Propagate,
            join_reorder: FailurePolicy::Propagate,
        }
    }
}

/// Configuration for the query optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Whether to run the index advisor
    pub index_suggestions_enabled: bool,
    /// Whether to run the predicate pushdown optimizer
    pub predicate_pushdown_enabled: bool,
    /// Whether to run the join reorder optimizer
    pub join_reordering_enabled: bool,
    /// Usage fraction a column must exceed to join a composite index suggestion
    pub index_selectivity_threshold: f64,
    /// Minimum normalized displacement before a predicate reorder is suggested
    pub predicate_reordering_threshold: f64,
    /// Minimum fractional cardinality reduction before a join reorder is suggested
    pub join_reordering_threshold: f64,
    /// Analysis time budget in milliseconds; zero or negative disables the check
    pub max_analysis_time_ms: i64,
    /// Upper bound on the number of columns in a composite index suggestion
    pub max_composite_index_columns: usize,
    /// Include per-advisor details and degraded notes in the summary
    pub verbose_output: bool,
    pub target_database: TargetDatabase,
    pub failure_policy: FailurePolicies,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            index_suggestions_enabled: true,
            predicate_pushdown_enabled: true,
            join_reordering_enabled: true,
            index_selectivity_threshold: 0.3,
            predicate_reordering_threshold: 0.1,
            join_reordering_threshold: 0.1,
            max_analysis_time_ms: 5_000,
            max_composite_index_columns: 3,
            verbose_output: false,
            target_database: TargetDatabase::Generic,
            failure_policy: FailurePolicies::default(),
        }
    }
}

impl OptimizerConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a TOML document and validates the result
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that thresholds lie in [0, 1] and limits are usable
    pub fn validate(&self) -> Result<()> {
        check_fraction("index_selectivity_threshold", self.index_selectivity_threshold)?;
        check_fraction(
            "predicate_reordering_threshold",
            self.predicate_reordering_threshold,
        )?;
        check_fraction("join_reordering_threshold", self.join_reordering_threshold)?;

        if self.max_composite_index_columns < 1 {
            return Err(OptimizerError::invalid_argument(
                "max_composite_index_columns must be at least 1",
            ));
        }

        Ok(())
    }

    /// Returns the time budget, or `None` when the timeout is disabled
    pub fn analysis_budget(&self) -> Option<std::time::Duration> {
        u64::try_from(self.max_analysis_time_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map(std::time::Duration::from_millis)
    }

    pub fn with_index_suggestions(mut self, enabled: bool) -> Self {
        self.index_suggestions_enabled = enabled;
        self
    }

    pub fn with_predicate_pushdown(mut self, enabled: bool) -> Self {
        self.predicate_pushdown_enabled = enabled;
        self
    }

    pub fn with_join_reordering(mut self, enabled: bool) -> Self {
        self.join_reordering_enabled = enabled;
        self
    }

    pub fn with_index_selectivity_threshold(mut self, threshold: f64) -> Self {
        self.index_selectivity_threshold = threshold;
        self
    }

    pub fn with_predicate_reordering_threshold(mut self, threshold: f64) -> Self {
        self.predicate_reordering_threshold = threshold;
        self
    }

    pub fn with_join_reordering_threshold(mut self, threshold: f64) -> Self {
        self.join_reordering_threshold = threshold;
        self
    }

    /// Sets the time budget; pass 0 to disable the check
    pub fn with_max_analysis_time_ms(mut self, ms: i64) -> Self {
        self.max_analysis_time_ms = ms;
        self
    }

    pub fn with_max_composite_index_columns(mut self, columns: usize) -> Self {
        self.max_composite_index_columns = columns;
        self
    }

    pub fn with_verbose_output(mut self, verbose: bool) -> Self {
        self.verbose_output = verbose;
        self
    }

    pub fn with_target_database(mut self, target: TargetDatabase) -> Self {
        self.target_database = target;
        self
    }

    pub fn with_failure_policy(mut self, policies: FailurePolicies) -> Self {
        self.failure_policy = policies;
        self
    }
}

pub(crate) fn check_fraction(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(OptimizerError::InvalidArgument(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}
