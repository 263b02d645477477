//! Predicate Pushdown Optimizer
//!
//! Suggests a better evaluation order for the top-level filters of a query
//! and points out filters that can be applied to a joined table before the
//! join runs. Predicates are only ever moved, never rewritten.

use super::index_advisor::format_selectivity;
use crate::config::OptimizerConfig;
use crate::error::{OptimizerError, Result};
use crate::join_graph::{JoinGraph, QueryJoinGraph};
use crate::selectivity::{EQUALITY_SELECTIVITY, estimate_selectivity};
use crate::statistics::{DefaultTableStatistics, TableStatistics};
use crate::suggestions::{PredicatePushdownSuggestion, Priority, PushdownKind};
use std::sync::Arc;
use zqlz_core::{Predicate, QueryModel};

/// Normalized displacement above which a reorder is high priority
const HIGH_PRIORITY_DISPLACEMENT: f64 = 0.5;

/// Reorders and pushes down filter predicates
#[derive(Clone)]
pub struct PredicatePushdownOptimizer {
    reordering_threshold: f64,
    statistics: Arc<dyn TableStatistics>,
}

impl std::fmt::Debug for PredicatePushdownOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicatePushdownOptimizer")
            .field("reordering_threshold", &self.reordering_threshold)
            .finish_non_exhaustive()
    }
}

impl Default for PredicatePushdownOptimizer {
    fn default() -> Self {
        Self::new(&OptimizerConfig::default(), Arc::new(DefaultTableStatistics))
    }
}

impl PredicatePushdownOptimizer {
    pub fn new(config: &OptimizerConfig, statistics: Arc<dyn TableStatistics>) -> Self {
        Self {
            reordering_threshold: config.predicate_reordering_threshold,
            statistics,
        }
    }

    /// Runs every pushdown analysis over the query's top-level predicates.
    ///
    /// At most one suggestion is returned per original position; when several
    /// analyses target the same predicate the highest priority wins, and the
    /// earlier analysis wins a tie. Results are ordered by original position.
    pub fn optimize_query(&self, query: &QueryModel) -> Result<Vec<PredicatePushdownSuggestion>> {
        if query.table().trim().is_empty() {
            return Err(OptimizerError::invalid_argument(
                "query model has no base table",
            ));
        }

        let predicates = query.predicates();
        let mut candidates = self.suggest_predicate_reordering(predicates);
        if query.has_joins() {
            let graph = QueryJoinGraph::from_query(query);
            candidates.extend(self.identify_pushdown_opportunities(predicates, &graph));
        }
        candidates.extend(self.suggest_early_filters(predicates));

        let index_columns = self.indexed_columns(query);
        candidates.extend(self.optimize_for_index_usage(predicates, &index_columns)?);

        let suggestions = keep_best_per_position(candidates);
        tracing::debug!(
            table = query.table(),
            predicates = predicates.len(),
            suggestions = suggestions.len(),
            "predicate pushdown analysis complete"
        );
        Ok(suggestions)
    }

    /// Suggests moving predicates toward their position in ascending
    /// selectivity order.
    ///
    /// A predicate is reported when its displacement divided by the number of
    /// predicates exceeds the reordering threshold. Predicates with equal
    /// selectivity keep their relative order.
    pub fn suggest_predicate_reordering(
        &self,
        predicates: &[Predicate],
    ) -> Vec<PredicatePushdownSuggestion> {
        let n = predicates.len();
        if n <= 1 {
            return Vec::new();
        }

        let selectivities: Vec<f64> = predicates.iter().map(estimate_selectivity).collect();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|a, b| selectivities[*a].total_cmp(&selectivities[*b]));

        let mut target_of = vec![0; n];
        for (target, original) in order.iter().enumerate() {
            target_of[*original] = target;
        }

        let mut suggestions = Vec::new();
        for (original, predicate) in predicates.iter().enumerate() {
            let target = target_of[original];
            let improvement = original.abs_diff(target) as f64 / n as f64;
            if improvement <= self.reordering_threshold {
                continue;
            }

            let priority = if improvement > HIGH_PRIORITY_DISPLACEMENT {
                Priority::High
            } else {
                Priority::Medium
            };
            let selectivity = selectivities[original];
            let reason = if target < original {
                format!(
                    "Predicate `{}` (selectivity {}) is more selective than the predicates before it",
                    predicate,
                    format_selectivity(selectivity)
                )
            } else {
                format!(
                    "Predicate `{}` (selectivity {}) filters fewer rows than the predicates after it",
                    predicate,
                    format_selectivity(selectivity)
                )
            };

            suggestions.push(
                PredicatePushdownSuggestion::new(
                    predicate,
                    original,
                    target,
                    selectivity,
                    PushdownKind::ReorderBySelectivity,
                    priority,
                )
                .with_reason(reason)
                .with_expected_impact(format!(
                    "Fewer rows reach later predicates (moves {} of {} positions)",
                    original.abs_diff(target),
                    n
                )),
            );
        }

        tracing::trace!(
            predicates = n,
            threshold = self.reordering_threshold,
            suggestions = suggestions.len(),
            "predicate reordering"
        );
        suggestions
    }

    /// Suggests filtering a joined table before the join for every predicate
    /// the join graph accepts.
    ///
    /// Each predicate is pushed at most once, to the first table in graph
    /// order that accepts it.
    pub fn identify_pushdown_opportunities(
        &self,
        predicates: &[Predicate],
        graph: &dyn JoinGraph,
    ) -> Vec<PredicatePushdownSuggestion> {
        let mut tables: Vec<String> = Vec::new();
        for table in graph.tables() {
            if !tables.iter().any(|seen| seen.eq_ignore_ascii_case(&table)) {
                tables.push(table);
            }
        }
        let mut suggestions = Vec::new();

        for (position, predicate) in predicates.iter().enumerate() {
            let Some(table) = tables
                .iter()
                .find(|table| graph.can_push_to_table(predicate, table))
            else {
                continue;
            };

            suggestions.push(
                PredicatePushdownSuggestion::new(
                    predicate,
                    position,
                    0,
                    estimate_selectivity(predicate),
                    PushdownKind::PushToJoinSource,
                    Priority::High,
                )
                .with_reason(format!(
                    "Predicate `{}` only references '{}' and can filter it before the join",
                    predicate, table
                ))
                .with_expected_impact(format!("Fewer '{}' rows enter the join", table))
                .with_target_table(table.clone()),
            );
        }

        suggestions
    }

    /// Suggests moving predicates on indexed columns one position earlier
    pub fn optimize_for_index_usage(
        &self,
        predicates: &[Predicate],
        index_columns: &[String],
    ) -> Result<Vec<PredicatePushdownSuggestion>> {
        let mut suggestions = Vec::new();

        for (position, predicate) in predicates.iter().enumerate() {
            let Some(column) = predicate.column() else {
                continue;
            };
            if column.is_empty() {
                return Err(OptimizerError::extraction(format!(
                    "predicate at position {} has no field reference",
                    position
                )));
            }

            if !index_columns
                .iter()
                .any(|indexed| zqlz_core::unqualified(indexed).eq_ignore_ascii_case(column))
            {
                continue;
            }

            suggestions.push(
                PredicatePushdownSuggestion::new(
                    predicate,
                    position,
                    position.saturating_sub(1),
                    estimate_selectivity(predicate),
                    PushdownKind::IndexFriendlyReorder,
                    Priority::Medium,
                )
                .with_reason(format!(
                    "Column '{}' is indexed; evaluating `{}` earlier lets the index narrow the scan",
                    column, predicate
                ))
                .with_expected_impact("Index lookup replaces a row-by-row filter"),
            );
        }

        Ok(suggestions)
    }

    fn suggest_early_filters(&self, predicates: &[Predicate]) -> Vec<PredicatePushdownSuggestion> {
        if predicates.len() < 2 {
            return Vec::new();
        }

        predicates
            .iter()
            .enumerate()
            .filter_map(|(position, predicate)| {
                let selectivity = estimate_selectivity(predicate);
                if selectivity > EQUALITY_SELECTIVITY {
                    return None;
                }

                let reason = format!(
                    "Highly selective predicate `{}` (selectivity {}) should be evaluated first",
                    predicate,
                    format_selectivity(selectivity)
                );
                Some(
                    PredicatePushdownSuggestion::new(
                        predicate,
                        position,
                        0,
                        selectivity,
                        PushdownKind::EarlyFilter,
                        Priority::High,
                    )
                    .with_reason(reason)
                    .with_expected_impact("Discards most rows before other predicates run"),
                )
            })
            .collect()
    }

    fn indexed_columns(&self, query: &QueryModel) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for predicate in query.predicates() {
            let Some(column) = predicate.column().filter(|c| !c.is_empty()) else {
                continue;
            };
            let table = predicate
                .qualifier()
                .and_then(|q| query.joins().iter().find(|join| join.matches_name(q)))
                .map(|join| join.table.as_str())
                .unwrap_or_else(|| query.table());

            if self.statistics.has_index_on_field(table, column)
                && !columns.iter().any(|c| c.eq_ignore_ascii_case(column))
            {
                columns.push(column.to_string());
            }
        }
        columns
    }
}

fn keep_best_per_position(
    candidates: Vec<PredicatePushdownSuggestion>,
) -> Vec<PredicatePushdownSuggestion> {
    let mut best: Vec<PredicatePushdownSuggestion> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match best
            .iter_mut()
            .find(|kept| kept.original_position() == candidate.original_position())
        {
            Some(kept) if kept.priority() < candidate.priority() => *kept = candidate,
            Some(_) => {}
            None => best.push(candidate),
        }
    }
    best.sort_by_key(|s| s.original_position());
    best
}
