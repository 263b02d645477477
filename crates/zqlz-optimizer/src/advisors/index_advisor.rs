//! Index Advisor - Candidate Index Suggestions
//!
//! Suggests single-column indexes for filtered columns, B-tree indexes for
//! join keys, and composite indexes for columns that are used together often
//! enough. Index advice is never required for a query to run, so
//! [`IndexAdvisor::analyze_query`] can skip predicates it cannot understand
//! instead of failing the analysis (see [`FailurePolicy`]).

use super::AdvisorOutcome;
use crate::config::{FailurePolicy, OptimizerConfig, check_fraction};
use crate::error::{OptimizerError, Result};
use crate::selectivity::{RANGE_SELECTIVITY, estimate_selectivity};
use crate::suggestions::{IndexKind, IndexSuggestion, Priority};
use std::collections::HashMap;
use zqlz_core::{ComparisonOp, Predicate, QueryModel, unqualified};

/// Selectivity assumed for join key columns
pub const JOIN_KEY_SELECTIVITY: f64 = 0.3;

/// Suggests indexes for a query
#[derive(Debug, Clone)]
pub struct IndexAdvisor {
    max_composite_columns: usize,
    composite_threshold: f64,
    failure_policy: FailurePolicy,
}

impl Default for IndexAdvisor {
    fn default() -> Self {
        Self::new(&OptimizerConfig::default())
    }
}

impl IndexAdvisor {
    pub fn new(config: &OptimizerConfig) -> Self {
        Self {
            max_composite_columns: config.max_composite_index_columns.max(1),
            composite_threshold: config.index_selectivity_threshold,
            failure_policy: config.failure_policy.index,
        }
    }

    /// Analyzes a whole query model.
    ///
    /// Predicates are attributed to the table their qualifier names (the base
    /// table when unqualified), join keys to the joined table, and column usage
    /// on the base table feeds composite suggestions. Duplicate targets keep
    /// the higher priority.
    pub fn analyze_query(&self, query: &QueryModel) -> Result<AdvisorOutcome<Vec<IndexSuggestion>>> {
        if query.table().trim().is_empty() {
            return Err(OptimizerError::invalid_argument(
                "query model has no base table",
            ));
        }

        let mut suggestions = Vec::new();
        let mut degraded = Vec::new();
        let mut usage: HashMap<String, usize> = HashMap::new();

        for predicate in query.predicates() {
            for leaf in predicate.leaves() {
                let table = resolve_table(query, leaf.qualifier());
                match self.suggest_for_leaf(leaf, table) {
                    Ok(Some(suggestion)) => {
                        if query.is_base_table(table) {
                            for column in suggestion.columns() {
                                *usage.entry(column.clone()).or_default() += 1;
                            }
                        }
                        suggestions.push(suggestion);
                    }
                    Ok(None) => {}
                    Err(err) => self.handle_failure(err, &mut degraded)?,
                }
            }
        }

        for join in query.joins() {
            if join.table.trim().is_empty() {
                self.handle_failure(
                    OptimizerError::extraction(format!(
                        "join on '{}' has no table name",
                        join.right_field
                    )),
                    &mut degraded,
                )?;
                continue;
            }

            match self.analyze_join_conditions(std::slice::from_ref(&join.right_field), &join.table)
            {
                Ok(join_suggestions) => suggestions.extend(join_suggestions),
                Err(err) => self.handle_failure(err, &mut degraded)?,
            }

            let left_on_base = join
                .left_field
                .rsplit_once('.')
                .is_none_or(|(qualifier, _)| query.is_base_table(qualifier));
            let left_column = unqualified(&join.left_field);
            if left_on_base && !left_column.is_empty() {
                *usage.entry(left_column.to_string()).or_default() += 1;
            }
        }

        for column in query
            .group_by()
            .iter()
            .map(String::as_str)
            .chain(query.order_by().iter().map(|o| o.column.as_str()))
        {
            let column = unqualified(column);
            if !column.is_empty() {
                *usage.entry(column.to_string()).or_default() += 1;
            }
        }

        match self.suggest_composite_indexes(&usage, query.table(), self.composite_threshold) {
            Ok(composites) => suggestions.extend(composites),
            Err(err) => self.handle_failure(err, &mut degraded)?,
        }

        let suggestions = dedup_suggestions(suggestions);
        tracing::debug!(
            table = query.table(),
            suggestions = suggestions.len(),
            degraded = degraded.len(),
            "index analysis complete"
        );

        Ok(if degraded.is_empty() {
            AdvisorOutcome::complete(suggestions)
        } else {
            AdvisorOutcome::degraded(suggestions, degraded)
        })
    }

    /// Emits one suggestion per leaf predicate on `table`.
    ///
    /// AND/OR/NOT groups are descended into; raw SQL fragments have no
    /// column and are skipped.
    pub fn analyze_predicates(
        &self,
        predicates: &[Predicate],
        table: &str,
    ) -> Result<Vec<IndexSuggestion>> {
        require_table(table)?;

        let mut suggestions = Vec::new();
        for predicate in predicates {
            for leaf in predicate.leaves() {
                if let Some(suggestion) = self.suggest_for_leaf(leaf, table)? {
                    suggestions.push(suggestion);
                }
            }
        }
        Ok(suggestions)
    }

    /// Emits one high-priority B-tree suggestion per join key
    pub fn analyze_join_conditions(
        &self,
        join_fields: &[String],
        table: &str,
    ) -> Result<Vec<IndexSuggestion>> {
        require_table(table)?;

        join_fields
            .iter()
            .map(|field| {
                let column = unqualified(field);
                if column.is_empty() {
                    return Err(OptimizerError::extraction(format!(
                        "join key on '{}' has no column name",
                        table
                    )));
                }

                Ok(IndexSuggestion::new(
                    table,
                    vec![column.to_string()],
                    IndexKind::Btree,
                    JOIN_KEY_SELECTIVITY,
                )?
                .with_priority(Priority::High)
                .with_reason(format!(
                    "Join key '{}' on '{}' is looked up once per row of the joined input",
                    column, table
                ))
                .with_expected_impact("Avoids a full scan of the joined table for every probe"))
            })
            .collect()
    }

    /// Suggests one composite index over the columns used more than once and
    /// more often than `threshold × distinct columns`.
    ///
    /// Columns are ordered lexicographically. Nothing is suggested unless at
    /// least two and at most `max_composite_index_columns` columns qualify.
    pub fn suggest_composite_indexes(
        &self,
        column_usage: &HashMap<String, usize>,
        table: &str,
        threshold: f64,
    ) -> Result<Vec<IndexSuggestion>> {
        check_fraction("threshold", threshold)?;
        require_table(table)?;

        let distinct = column_usage.len();
        let cutoff = threshold * distinct as f64;
        let mut columns: Vec<String> = column_usage
            .iter()
            .filter(|(_, count)| **count > 1 && **count as f64 > cutoff)
            .map(|(column, _)| column.clone())
            .collect();
        columns.sort();

        if columns.len() < 2 || columns.len() > self.max_composite_columns {
            tracing::trace!(
                table,
                qualifying = columns.len(),
                max = self.max_composite_columns,
                "no composite index suggested"
            );
            return Ok(Vec::new());
        }

        let selectivity = RANGE_SELECTIVITY.powi(columns.len() as i32);
        let column_list = columns.join(", ");
        let suggestion = IndexSuggestion::new(table, columns, IndexKind::Composite, selectivity)?
            .with_reason(format!(
                "Columns ({}) of '{}' are frequently used together",
                column_list, table
            ))
            .with_expected_impact(
                "A single index can satisfy filters, joins and sorts over these columns",
            );

        Ok(vec![suggestion])
    }

    fn suggest_for_leaf(&self, leaf: &Predicate, table: &str) -> Result<Option<IndexSuggestion>> {
        let Some(column) = leaf.column() else {
            return Ok(None);
        };
        if column.is_empty() {
            return Err(OptimizerError::extraction(format!(
                "predicate `{}` has no field reference",
                leaf
            )));
        }

        let selectivity = estimate_selectivity(leaf);
        let shown = format_selectivity(selectivity);

        let (kind, reason) = match leaf {
            Predicate::Comparison { op, .. } => {
                let reason = match op {
                    ComparisonOp::Eq => format!(
                        "Equality filter on '{}' (selectivity {}) can use a B-tree lookup",
                        column, shown
                    ),
                    ComparisonOp::NotEq => format!(
                        "Inequality filter on '{}' (selectivity {}) matches most rows; an index helps little",
                        column, shown
                    ),
                    _ => format!(
                        "Range filter on '{}' (selectivity {}) can use a B-tree range scan",
                        column, shown
                    ),
                };
                (IndexKind::Btree, reason)
            }
            Predicate::In { negated: true, .. } | Predicate::Like { negated: true, .. } => (
                IndexKind::Btree,
                format!(
                    "Negated filter `{}` (selectivity {}) matches most rows; an index helps little",
                    leaf, shown
                ),
            ),
            Predicate::In { values, .. } => (
                IndexKind::Btree,
                format!(
                    "IN-list filter with {} value(s) on '{}' (selectivity {}) can use B-tree lookups",
                    values.len(),
                    column,
                    shown
                ),
            ),
            Predicate::Between { .. } => (
                IndexKind::Btree,
                format!(
                    "BETWEEN filter on '{}' (selectivity {}) can use a B-tree range scan",
                    column, shown
                ),
            ),
            Predicate::Like { pattern, .. } => (
                IndexKind::Btree,
                format!(
                    "LIKE '{}' on '{}' (selectivity {}); a full-text index may outperform a B-tree index for complex patterns",
                    pattern, column, shown
                ),
            ),
            Predicate::NullCheck { is_null, .. } => (
                IndexKind::Partial,
                format!(
                    "{} check on '{}' (selectivity {}); a partial index over matching rows stays small",
                    if *is_null { "IS NULL" } else { "IS NOT NULL" },
                    column,
                    shown
                ),
            ),
            Predicate::Subquery { .. } => (
                IndexKind::Btree,
                format!(
                    "Sub-select membership test on '{}' (selectivity {}) can use B-tree lookups",
                    column, shown
                ),
            ),
            Predicate::Logical { .. } | Predicate::Raw { .. } => return Ok(None),
        };

        let suggestion = IndexSuggestion::new(table, vec![column.to_string()], kind, selectivity)?
            .with_reason(reason);
        let impact = expected_impact(suggestion.priority());
        Ok(Some(suggestion.with_expected_impact(impact)))
    }

    fn handle_failure(&self, err: OptimizerError, degraded: &mut Vec<String>) -> Result<()> {
        if self.failure_policy == FailurePolicy::Degrade && err.is_recoverable() {
            tracing::warn!(error = %err, "index analysis skipped part of the query");
            degraded.push(err.to_string());
            Ok(())
        } else {
            Err(err)
        }
    }
}

/// Formats a selectivity without trailing zeros (`0.1`, `0.03`)
pub(crate) fn format_selectivity(selectivity: f64) -> String {
    let formatted = format!("{:.2}", selectivity);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn expected_impact(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "Large reduction in rows read for this filter",
        Priority::Medium => "Moderate reduction in rows read for this filter",
        Priority::Low => "Small benefit; the filter matches a large share of rows",
    }
}

fn require_table(table: &str) -> Result<()> {
    if table.trim().is_empty() {
        Err(OptimizerError::invalid_argument("table name must not be empty"))
    } else {
        Ok(())
    }
}

fn resolve_table<'a>(query: &'a QueryModel, qualifier: Option<&str>) -> &'a str {
    qualifier
        .and_then(|q| query.joins().iter().find(|join| join.matches_name(q)))
        .map(|join| join.table.as_str())
        .unwrap_or_else(|| query.table())
}

fn dedup_suggestions(suggestions: Vec<IndexSuggestion>) -> Vec<IndexSuggestion> {
    let mut unique: Vec<IndexSuggestion> = Vec::with_capacity(suggestions.len());
    for suggestion in suggestions {
        match unique.iter_mut().find(|existing| existing.same_target(&suggestion)) {
            Some(existing) if existing.priority() < suggestion.priority() => *existing = suggestion,
            Some(_) => {}
            None => unique.push(suggestion),
        }
    }
    unique
}
