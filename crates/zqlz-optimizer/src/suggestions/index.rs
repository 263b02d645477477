use super::Priority;
use crate::error::{OptimizerError, Result};
use serde::{Deserialize, Serialize};

/// Kind of index being suggested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexKind {
    Btree,
    Hash,
    Composite,
    Unique,
    Partial,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Btree => "BTREE",
            Self::Hash => "HASH",
            Self::Composite => "COMPOSITE",
            Self::Unique => "UNIQUE",
            Self::Partial => "PARTIAL",
        }
    }

    /// Returns a human-readable description of this index kind
    pub fn description(&self) -> &'static str {
        match self {
            Self::Btree => "Ordered index supporting equality and range lookups",
            Self::Hash => "Hash index supporting equality lookups only",
            Self::Composite => "Multi-column index for columns filtered together",
            Self::Unique => "Index enforcing uniqueness of the indexed columns",
            Self::Partial => "Index covering only rows matching a condition",
        }
    }
}

/// A candidate index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSuggestion {
    table: String,
    columns: Vec<String>,
    kind: IndexKind,
    estimated_selectivity: f64,
    reason: String,
    expected_impact: String,
    priority: Priority,
}

impl IndexSuggestion {
    /// Creates a suggestion; the table must be named and at least one column given
    pub fn new(
        table: impl Into<String>,
        columns: Vec<String>,
        kind: IndexKind,
        estimated_selectivity: f64,
    ) -> Result<Self> {
        let table = table.into();
        if table.trim().is_empty() {
            return Err(OptimizerError::invalid_argument(
                "index suggestion requires a table name",
            ));
        }
        if columns.is_empty() || columns.iter().any(|c| c.trim().is_empty()) {
            return Err(OptimizerError::invalid_argument(format!(
                "index suggestion on '{}' requires at least one named column",
                table
            )));
        }

        let estimated_selectivity = estimated_selectivity.clamp(0.0, 1.0);
        Ok(Self {
            table,
            columns,
            kind,
            estimated_selectivity,
            reason: String::new(),
            expected_impact: String::new(),
            priority: Priority::from_selectivity(estimated_selectivity),
        })
    }

    /// Sets the human-readable reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Sets the expected-impact description
    pub fn with_expected_impact(mut self, impact: impl Into<String>) -> Self {
        self.expected_impact = impact.into();
        self
    }

    /// Overrides the priority derived from selectivity
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn estimated_selectivity(&self) -> f64 {
        self.estimated_selectivity
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn expected_impact(&self) -> &str {
        &self.expected_impact
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Name used in the generated DDL: `idx_<table>_<col1>_<col2>...`
    pub fn index_name(&self) -> String {
        format!(
            "idx_{}_{}",
            self.table.replace('.', "_"),
            self.columns.join("_")
        )
    }

    /// Renders `CREATE INDEX idx_<table>_<cols> ON <table> (<cols>)`
    pub fn to_create_index_sql(&self) -> String {
        format!(
            "CREATE INDEX {} ON {} ({})",
            self.index_name(),
            self.table,
            self.columns.join(", ")
        )
    }

    /// True when both suggestions would create the same index
    pub fn same_target(&self, other: &Self) -> bool {
        self.table == other.table && self.columns == other.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_columns_and_table() {
        assert!(matches!(
            IndexSuggestion::new("users", Vec::new(), IndexKind::Btree, 0.1),
            Err(OptimizerError::InvalidArgument(_))
        ));
        assert!(IndexSuggestion::new("", vec!["id".into()], IndexKind::Btree, 0.1).is_err());
        assert!(IndexSuggestion::new("t", vec![" ".into()], IndexKind::Btree, 0.1).is_err());
    }

    #[test]
    fn test_create_index_sql() {
        let single = IndexSuggestion::new("users", vec!["email".into()], IndexKind::Btree, 0.1)
            .unwrap();
        assert_eq!(
            single.to_create_index_sql(),
            "CREATE INDEX idx_users_email ON users (email)"
        );

        let composite = IndexSuggestion::new(
            "orders",
            vec!["customer_id".into(), "status".into()],
            IndexKind::Composite,
            0.2,
        )
        .unwrap();
        assert_eq!(
            composite.to_create_index_sql(),
            "CREATE INDEX idx_orders_customer_id_status ON orders (customer_id, status)"
        );
    }

    #[test]
    fn test_schema_qualified_table_name() {
        let suggestion =
            IndexSuggestion::new("sales.orders", vec!["id".into()], IndexKind::Btree, 0.1)
                .unwrap();
        assert_eq!(
            suggestion.to_create_index_sql(),
            "CREATE INDEX idx_sales_orders_id ON sales.orders (id)"
        );
    }

    #[test]
    fn test_builder_and_priority() {
        let suggestion = IndexSuggestion::new("t", vec!["c".into()], IndexKind::Hash, 1.7)
            .unwrap()
            .with_reason("because")
            .with_expected_impact("faster")
            .with_priority(Priority::High);

        assert!((suggestion.estimated_selectivity() - 1.0).abs() < f64::EPSILON);
        assert_eq!(suggestion.priority(), Priority::High);
        assert_eq!(suggestion.reason(), "because");
        assert_eq!(suggestion.expected_impact(), "faster");
        assert_eq!(suggestion.kind().as_str(), "HASH");
    }

    #[test]
    fn test_serialization() {
        let suggestion =
            IndexSuggestion::new("t", vec!["c".into()], IndexKind::Partial, 0.1).unwrap();
        let json = serde_json::to_value(&suggestion).unwrap();
        assert_eq!(json["kind"], "PARTIAL");
        assert_eq!(json["priority"], "MEDIUM");
    }
}
