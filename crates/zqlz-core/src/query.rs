//! Read-only query model
//!
//! A [`QueryModel`] describes a single SELECT against a base table: its
//! top-level filter predicates (implicitly AND-ed), the tables joined onto
//! it, and grouping/ordering/aggregation clauses. It is assembled with
//! builder methods and never mutated by consumers.

use crate::Predicate;
use serde::{Deserialize, Serialize};

/// Join type for a [`JoinClause`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// A table joined onto the query: `JOIN table ON <left_field> = table.<right_field>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinClause {
    /// Joined table name
    pub table: String,
    /// Alias used for the joined table
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub join_type: JoinType,
    /// Key on the already-joined side (may be qualified)
    pub left_field: String,
    /// Key on the joined table
    pub right_field: String,
}

impl JoinClause {
    /// Creates a join clause of the given type
    pub fn new(
        join_type: JoinType,
        table: impl Into<String>,
        left_field: impl Into<String>,
        right_field: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            alias: None,
            join_type,
            left_field: left_field.into(),
            right_field: right_field.into(),
        }
    }

    /// Creates an inner join clause
    pub fn inner(
        table: impl Into<String>,
        left_field: impl Into<String>,
        right_field: impl Into<String>,
    ) -> Self {
        Self::new(JoinType::Inner, table, left_field, right_field)
    }

    /// Creates a left outer join clause
    pub fn left(
        table: impl Into<String>,
        left_field: impl Into<String>,
        right_field: impl Into<String>,
    ) -> Self {
        Self::new(JoinType::Left, table, left_field, right_field)
    }

    /// Sets the alias for the joined table
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Returns the join key on the joined table without any qualifier
    pub fn join_column(&self) -> &str {
        unqualified(&self.right_field)
    }

    /// Returns true if `name` refers to this join's table or alias
    pub fn matches_name(&self, name: &str) -> bool {
        self.table.eq_ignore_ascii_case(name)
            || self
                .alias
                .as_deref()
                .is_some_and(|alias| alias.eq_ignore_ascii_case(name))
    }
}

/// ORDER BY entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    #[serde(default)]
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// Aggregate function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// Aggregate expression in the select list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub function: AggregateFunction,
    /// Aggregated column; `None` means `*`
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
}

/// A read-only description of a query
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryModel {
    table: String,
    #[serde(default)]
    alias: Option<String>,
    #[serde(default)]
    predicates: Vec<Predicate>,
    #[serde(default)]
    joins: Vec<JoinClause>,
    #[serde(default)]
    group_by: Vec<String>,
    #[serde(default)]
    order_by: Vec<OrderBy>,
    #[serde(default)]
    aggregates: Vec<Aggregate>,
}

impl QueryModel {
    /// Creates a query against the given base table
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Sets the alias of the base table
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Appends a top-level predicate
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Appends several top-level predicates in order
    pub fn with_predicates(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.predicates.extend(predicates);
        self
    }

    /// Appends a join clause
    pub fn with_join(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    /// Appends a GROUP BY column
    pub fn with_group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by.push(column.into());
        self
    }

    /// Appends an ORDER BY entry
    pub fn with_order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Appends an aggregate expression
    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregates.push(aggregate);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    pub fn order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }

    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    /// Returns the join sequence: the base table followed by each joined table
    pub fn join_sequence(&self) -> Vec<&str> {
        std::iter::once(self.table.as_str())
            .chain(self.joins.iter().map(|j| j.table.as_str()))
            .collect()
    }

    /// Returns true if `name` refers to the base table or its alias
    pub fn is_base_table(&self, name: &str) -> bool {
        self.table.eq_ignore_ascii_case(name)
            || self
                .alias
                .as_deref()
                .is_some_and(|alias| alias.eq_ignore_ascii_case(name))
    }
}

/// Strips a table qualifier from a field reference
pub fn unqualified(field: &str) -> &str {
    field.rsplit('.').next().unwrap_or(field).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_query() -> QueryModel {
        QueryModel::new("users")
            .with_alias("u")
            .with_predicate(Predicate::equals("u.status", "active"))
            .with_join(JoinClause::inner("orders", "u.id", "orders.user_id").with_alias("o"))
            .with_join(JoinClause::left("addresses", "u.id", "user_id"))
            .with_group_by("country")
            .with_order_by(OrderBy::desc("created_at"))
    }

    #[test]
    fn test_join_sequence() {
        assert_eq!(
            sample_query().join_sequence(),
            vec!["users", "orders", "addresses"]
        );
        assert_eq!(QueryModel::new("t").join_sequence(), vec!["t"]);
    }

    #[test]
    fn test_name_matching() {
        let query = sample_query();
        assert!(query.is_base_table("u"));
        assert!(query.is_base_table("USERS"));
        assert!(query.joins()[0].matches_name("o"));
        assert!(!query.joins()[1].matches_name("o"));
        assert_eq!(query.joins()[0].join_column(), "user_id");
        assert_eq!(query.joins()[1].join_column(), "user_id");
    }

    #[test]
    fn test_json_round_trip_with_defaults() {
        let json = r#"{"table":"users","predicates":[{"kind":"null_check","field":"deleted_at","is_null":true}]}"#;
        let query: QueryModel = serde_json::from_str(json).unwrap();
        assert_eq!(query.table(), "users");
        assert_eq!(query.predicates().len(), 1);
        assert!(query.joins().is_empty());
        assert_eq!(query.joins().len(), 0);
    }
}
