//! Join graph collaborators
//!
//! A [`JoinGraph`] tells the pushdown optimizer which tables take part in a
//! query and whether a filter may be evaluated on one of them before the
//! join runs.

use serde::{Deserialize, Serialize};
use zqlz_core::{JoinType, Predicate, QueryModel, unqualified};

/// An edge between two tables of a join graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRelationship {
    pub left_table: String,
    pub right_table: String,
    pub left_field: String,
    pub right_field: String,
    pub join_type: JoinType,
}

/// Tables and join edges of a query
pub trait JoinGraph: Send + Sync {
    /// Every table taking part in the query
    fn tables(&self) -> Vec<String>;

    /// Join edges between those tables
    fn join_relationships(&self) -> Vec<JoinRelationship>;

    /// Whether `predicate` can be evaluated on `table` alone, before joining
    fn can_push_to_table(&self, predicate: &Predicate, table: &str) -> bool;
}

/// Graph with no tables; nothing is ever pushed
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJoinGraph;

impl JoinGraph for NoJoinGraph {
    fn tables(&self) -> Vec<String> {
        Vec::new()
    }

    fn join_relationships(&self) -> Vec<JoinRelationship> {
        Vec::new()
    }

    fn can_push_to_table(&self, _predicate: &Predicate, _table: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
struct GraphTable {
    name: String,
    alias: Option<String>,
    join_type: Option<JoinType>,
}

impl GraphTable {
    fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self
                .alias
                .as_deref()
                .is_some_and(|alias| alias.eq_ignore_ascii_case(name))
    }
}

/// Join graph derived from a [`QueryModel`].
///
/// A predicate can be pushed to a joined table when every field it references
/// is qualified with that table's name or alias, and the table is joined with
/// an inner or cross join. Filtering the null-supplying side of an outer join
/// before the join would change the result, so those tables never accept
/// pushed predicates. The base table is already the scan source and never
/// accepts them either.
#[derive(Debug, Clone)]
pub struct QueryJoinGraph {
    tables: Vec<GraphTable>,
    relationships: Vec<JoinRelationship>,
}

impl QueryJoinGraph {
    pub fn from_query(query: &QueryModel) -> Self {
        let mut tables = vec![GraphTable {
            name: query.table().to_string(),
            alias: query.alias().map(str::to_string),
            join_type: None,
        }];

        let mut relationships = Vec::with_capacity(query.joins().len());
        for join in query.joins() {
            let left_table = join
                .left_field
                .rsplit_once('.')
                .map(|(qualifier, _)| qualifier)
                .and_then(|qualifier| tables.iter().find(|t| t.matches(qualifier)))
                .map(|t| t.name.clone())
                .unwrap_or_else(|| query.table().to_string());

            relationships.push(JoinRelationship {
                left_table,
                right_table: join.table.clone(),
                left_field: unqualified(&join.left_field).to_string(),
                right_field: join.join_column().to_string(),
                join_type: join.join_type,
            });

            tables.push(GraphTable {
                name: join.table.clone(),
                alias: join.alias.clone(),
                join_type: Some(join.join_type),
            });
        }

        Self {
            tables,
            relationships,
        }
    }
}

impl JoinGraph for QueryJoinGraph {
    fn tables(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    fn join_relationships(&self) -> Vec<JoinRelationship> {
        self.relationships.clone()
    }

    fn can_push_to_table(&self, predicate: &Predicate, table: &str) -> bool {
        let leaves = predicate.leaves();
        if leaves.is_empty() {
            return false;
        }

        // A table joined twice under different aliases has one entry per occurrence.
        self.tables
            .iter()
            .filter(|t| t.name.eq_ignore_ascii_case(table))
            .filter(|t| matches!(t.join_type, Some(JoinType::Inner | JoinType::Cross)))
            .any(|target| {
                leaves
                    .iter()
                    .all(|leaf| leaf.qualifier().is_some_and(|q| target.matches(q)))
            })
    }
}
