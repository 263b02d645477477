//! Join Reorder Optimizer
//!
//! Compares the query's left-deep join sequence with greedy alternatives
//! built from table statistics.
//!
//! Each join clause is an edge between the joined table and the table its
//! left key belongs to. The cost of a sequence `t0, t1, ..., tn` is the sum of
//! its intermediate cardinalities:
//!
//! ```text
//! card(0) = rows(t0)
//! card(i) = card(i-1) × rows(ti) × sel(ti)
//! ```
//!
//! where `sel(ti)` is the lowest join selectivity among the edges linking
//! `ti` to a table already joined, or 1 when there is none. The index-driven
//! model multiplies an edge's selectivity by [`INDEX_LOOKUP_FACTOR`] when
//! the column probed on `ti` is indexed.

use crate::config::OptimizerConfig;
use crate::error::{OptimizerError, Result};
use crate::statistics::{DefaultTableStatistics, TableStatistics};
use crate::suggestions::{JoinReorderKind, JoinReorderSuggestion};
use std::sync::Arc;
use zqlz_core::{JoinType, QueryModel, unqualified};

/// Share of an indexed table's rows read by an index-driven join
pub const INDEX_LOOKUP_FACTOR: f64 = 0.5;

#[derive(Debug, Clone)]
struct JoinStep {
    table: String,
    alias: Option<String>,
}

impl JoinStep {
    fn matches(&self, name: &str) -> bool {
        self.table.eq_ignore_ascii_case(name)
            || self
                .alias
                .as_deref()
                .is_some_and(|alias| alias.eq_ignore_ascii_case(name))
    }
}

/// Join predicate `parent.parent_column = child.child_column`
#[derive(Debug, Clone)]
struct JoinEdge {
    parent: usize,
    child: usize,
    parent_column: String,
    child_column: String,
}

#[derive(Debug)]
struct EdgeEstimate {
    parent: usize,
    child: usize,
    selectivity: f64,
    parent_indexed: bool,
    child_indexed: bool,
}

/// Estimates gathered once per call so each table is asked about only once
#[derive(Debug)]
struct CostModel {
    rows: Vec<f64>,
    edges: Vec<EdgeEstimate>,
}

impl CostModel {
    fn collect(steps: &[JoinStep], edges: &[JoinEdge], statistics: &dyn TableStatistics) -> Self {
        let rows = steps
            .iter()
            .map(|step| statistics.estimated_row_count(&step.table) as f64)
            .collect();

        let edges = edges
            .iter()
            .map(|edge| {
                let parent = &steps[edge.parent].table;
                let child = &steps[edge.child].table;
                EdgeEstimate {
                    parent: edge.parent,
                    child: edge.child,
                    selectivity: statistics
                        .join_selectivity(parent, child, &edge.child_column)
                        .clamp(0.0, 1.0),
                    parent_indexed: statistics.has_index_on_field(parent, &edge.parent_column),
                    child_indexed: statistics.has_index_on_field(child, &edge.child_column),
                }
            })
            .collect();

        Self { rows, edges }
    }

    fn has_indexed_edge(&self) -> bool {
        self.edges
            .iter()
            .any(|edge| edge.parent_indexed || edge.child_indexed)
    }

    /// Selectivity of joining `next` onto `joined`, `None` when no edge links them
    fn join_factor(&self, joined: &[usize], next: usize, use_indexes: bool) -> Option<f64> {
        self.edges
            .iter()
            .filter_map(|edge| {
                let probed_indexed = if edge.child == next && joined.contains(&edge.parent) {
                    edge.child_indexed
                } else if edge.parent == next && joined.contains(&edge.child) {
                    edge.parent_indexed
                } else {
                    return None;
                };

                if use_indexes && probed_indexed {
                    Some(edge.selectivity * INDEX_LOOKUP_FACTOR)
                } else {
                    Some(edge.selectivity)
                }
            })
            .min_by(|a, b| a.total_cmp(b))
    }

    fn cost(&self, order: &[usize], use_indexes: bool) -> f64 {
        let Some(&first) = order.first() else {
            return 0.0;
        };

        let mut cardinality = self.rows[first];
        let mut total = cardinality;
        for position in 1..order.len() {
            let next = order[position];
            let factor = self
                .join_factor(&order[..position], next, use_indexes)
                .unwrap_or(1.0);
            cardinality *= self.rows[next] * factor;
            total += cardinality;
        }
        total
    }

    /// Smallest table first, then whichever connected table keeps the next
    /// intermediate result smallest. Ties go to the earlier original position.
    fn greedy_order(&self, use_indexes: bool) -> Vec<usize> {
        let n = self.rows.len();
        let mut start = 0;
        for candidate in 1..n {
            if self.rows[candidate] < self.rows[start] {
                start = candidate;
            }
        }

        let mut remaining: Vec<usize> = (0..n).filter(|&step| step != start).collect();
        let mut order = vec![start];
        let mut cardinality = self.rows[start];

        while !remaining.is_empty() {
            let factors: Vec<Option<f64>> = remaining
                .iter()
                .map(|&candidate| self.join_factor(&order, candidate, use_indexes))
                .collect();
            let any_connected = factors.iter().any(Option::is_some);

            let mut best: Option<(usize, f64)> = None;
            for (slot, (&candidate, factor)) in remaining.iter().zip(&factors).enumerate() {
                if any_connected && factor.is_none() {
                    continue;
                }
                let next = cardinality * self.rows[candidate] * factor.unwrap_or(1.0);
                if best.is_none_or(|(_, best_cardinality)| next < best_cardinality) {
                    best = Some((slot, next));
                }
            }

            let Some((slot, next)) = best else {
                break;
            };
            order.push(remaining.remove(slot));
            cardinality = next;
        }

        order
    }

    fn improvement(&self, original: &[usize], candidate: &[usize], use_indexes: bool) -> f64 {
        let before = self.cost(original, use_indexes);
        if before <= 0.0 {
            return 0.0;
        }
        ((before - self.cost(candidate, use_indexes)) / before).clamp(0.0, 1.0)
    }
}

#[derive(Debug)]
struct Candidate {
    kind: JoinReorderKind,
    order: Vec<usize>,
    improvement: f64,
    cost_before: f64,
    cost_after: f64,
}

/// Suggests cheaper join sequences
#[derive(Clone)]
pub struct JoinReorderOptimizer {
    threshold: f64,
    statistics: Arc<dyn TableStatistics>,
}

impl std::fmt::Debug for JoinReorderOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinReorderOptimizer")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl Default for JoinReorderOptimizer {
    fn default() -> Self {
        Self::new(&OptimizerConfig::default(), Arc::new(DefaultTableStatistics))
    }
}

impl JoinReorderOptimizer {
    pub fn new(config: &OptimizerConfig, statistics: Arc<dyn TableStatistics>) -> Self {
        Self {
            threshold: config.join_reordering_threshold,
            statistics,
        }
    }

    /// Suggests at most one alternative join sequence for `query`.
    ///
    /// The sequence is the base table followed by the joined tables in clause
    /// order. Queries with outer joins are left alone since moving the
    /// null-supplying side changes the result.
    pub fn optimize_join_order(&self, query: &QueryModel) -> Result<Vec<JoinReorderSuggestion>> {
        if query.table().trim().is_empty() {
            return Err(OptimizerError::invalid_argument(
                "query model has no base table",
            ));
        }

        if !query.has_joins() {
            return Ok(Vec::new());
        }
        let (steps, edges) = join_graph(query)?;

        if let Some(outer) = query
            .joins()
            .iter()
            .find(|join| !matches!(join.join_type, JoinType::Inner | JoinType::Cross))
        {
            tracing::trace!(
                table = %outer.table,
                join_type = outer.join_type.as_sql(),
                "join order is fixed by an outer join"
            );
            return Ok(Vec::new());
        }

        let model = CostModel::collect(&steps, &edges, self.statistics.as_ref());
        let original: Vec<usize> = (0..steps.len()).collect();

        let mut chosen: Option<Candidate> = None;
        let mut consider = |candidate: Candidate| {
            if candidate.order == original || candidate.improvement <= self.threshold {
                return;
            }
            if chosen
                .as_ref()
                .is_none_or(|current| candidate.improvement > current.improvement)
            {
                chosen = Some(candidate);
            }
        };

        let by_selectivity = model.greedy_order(false);
        consider(Candidate {
            kind: JoinReorderKind::SelectivityBased,
            improvement: model.improvement(&original, &by_selectivity, false),
            cost_before: model.cost(&original, false),
            cost_after: model.cost(&by_selectivity, false),
            order: by_selectivity,
        });

        if model.has_indexed_edge() {
            let by_index = model.greedy_order(true);
            consider(Candidate {
                kind: JoinReorderKind::IndexDriven,
                improvement: model.improvement(&original, &by_index, true),
                cost_before: model.cost(&original, true),
                cost_after: model.cost(&by_index, true),
                order: by_index,
            });
        }

        let Some(candidate) = chosen else {
            tracing::debug!(tables = steps.len(), "join order already acceptable");
            return Ok(Vec::new());
        };

        let original_sequence: Vec<String> =
            query.join_sequence().into_iter().map(str::to_string).collect();
        let suggested_sequence: Vec<String> = candidate
            .order
            .iter()
            .map(|&step| steps[step].table.clone())
            .collect();
        let first = candidate.order[0];

        let reason = match candidate.kind {
            JoinReorderKind::SelectivityBased => format!(
                "Starting from '{}' (~{} rows) and joining the most selective tables next shrinks intermediate results by {:.0}%",
                steps[first].table,
                model.rows[first] as u64,
                candidate.improvement * 100.0
            ),
            JoinReorderKind::IndexDriven => {
                let indexed: Vec<String> = edges
                    .iter()
                    .zip(&model.edges)
                    .flat_map(|(edge, estimate)| {
                        let parent = estimate.parent_indexed.then(|| {
                            format!("{}.{}", steps[edge.parent].table, edge.parent_column)
                        });
                        let child = estimate.child_indexed.then(|| {
                            format!("{}.{}", steps[edge.child].table, edge.child_column)
                        });
                        parent.into_iter().chain(child)
                    })
                    .collect();
                format!(
                    "Joining through indexed keys ({}) earlier shrinks intermediate results by {:.0}%",
                    indexed.join(", "),
                    candidate.improvement * 100.0
                )
            }
        };

        tracing::debug!(
            kind = ?candidate.kind,
            improvement = candidate.improvement,
            original = %original_sequence.join(", "),
            suggested = %suggested_sequence.join(", "),
            "join reorder suggested"
        );

        let suggestion = JoinReorderSuggestion::new(
            original_sequence,
            suggested_sequence,
            candidate.kind,
            candidate.improvement,
        )?
        .with_reason(reason)
        .with_expected_impact(format!(
            "Estimated intermediate rows drop from {:.0} to {:.0}",
            candidate.cost_before, candidate.cost_after
        ));

        Ok(vec![suggestion])
    }
}

/// Tables in clause order and the join predicates between them
fn join_graph(query: &QueryModel) -> Result<(Vec<JoinStep>, Vec<JoinEdge>)> {
    let mut steps = Vec::with_capacity(query.joins().len() + 1);
    steps.push(JoinStep {
        table: query.table().to_string(),
        alias: query.alias().map(str::to_string),
    });
    let mut edges = Vec::with_capacity(query.joins().len());

    for join in query.joins() {
        if join.table.trim().is_empty() {
            return Err(OptimizerError::extraction(format!(
                "join on '{}' has no table name",
                join.right_field
            )));
        }

        let child = steps.len();
        steps.push(JoinStep {
            table: join.table.clone(),
            alias: join.alias.clone(),
        });

        if join.join_type == JoinType::Cross {
            continue;
        }

        let child_column = join.join_column();
        let parent_column = unqualified(&join.left_field);
        if child_column.is_empty() || parent_column.is_empty() {
            return Err(OptimizerError::extraction(format!(
                "join with '{}' has no key column",
                join.table
            )));
        }

        let parent = join
            .left_field
            .rsplit_once('.')
            .and_then(|(qualifier, _)| steps[..child].iter().position(|s| s.matches(qualifier)))
            .unwrap_or(0);

        edges.push(JoinEdge {
            parent,
            child,
            parent_column: parent_column.to_string(),
            child_column: child_column.to_string(),
        });
    }

    Ok((steps, edges))
}
