//! Filter predicates
//!
//! A predicate is an immutable node in the WHERE-clause tree of a
//! [`QueryModel`](crate::QueryModel). Leaves reference a single field, which
//! may be table-qualified (`orders.status`). Composite predicates group
//! children under AND/OR/NOT.

use crate::{Value, unqualified};
use serde::{Deserialize, Serialize};

/// Comparison operator for [`Predicate::Comparison`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=", alias = "<>")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,
}

impl ComparisonOp {
    /// Returns the SQL symbol for this operator
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }

    /// Parses an operator symbol; both `!=` and `<>` map to [`ComparisonOp::NotEq`]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.trim() {
            "=" | "==" => Some(Self::Eq),
            "!=" | "<>" => Some(Self::NotEq),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::LtEq),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::GtEq),
            _ => None,
        }
    }

    /// Returns true for `<`, `<=`, `>` and `>=`
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Lt | Self::LtEq | Self::Gt | Self::GtEq)
    }
}

/// Boolean connective for [`Predicate::Logical`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

/// A filter predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// `field <op> value`
    Comparison {
        field: String,
        op: ComparisonOp,
        value: Value,
    },
    /// `field [NOT] IN (values...)`
    In {
        field: String,
        values: Vec<Value>,
        #[serde(default)]
        negated: bool,
    },
    /// `field BETWEEN low AND high`
    Between {
        field: String,
        low: Value,
        high: Value,
    },
    /// `field [NOT] LIKE pattern`
    Like {
        field: String,
        pattern: String,
        #[serde(default)]
        negated: bool,
    },
    /// `field IS [NOT] NULL`
    NullCheck { field: String, is_null: bool },
    /// AND/OR/NOT group
    Logical {
        op: LogicalOp,
        children: Vec<Predicate>,
    },
    /// `field IN (<sub-select>)`
    Subquery { field: String, sql: String },
    /// Opaque SQL fragment supplied by the caller
    Raw { sql: String },
}

impl Predicate {
    /// Creates a comparison predicate
    pub fn compare(field: impl Into<String>, op: ComparisonOp, value: impl Into<Value>) -> Self {
        Self::Comparison {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Creates an equality predicate
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, ComparisonOp::Eq, value)
    }

    /// Creates an IN-list predicate
    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In {
            field: field.into(),
            values,
            negated: false,
        }
    }

    /// Creates a `NOT IN` predicate
    pub fn not_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In {
            field: field.into(),
            values,
            negated: true,
        }
    }

    /// Creates a BETWEEN predicate
    pub fn between(
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::Between {
            field: field.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    /// Creates a LIKE predicate
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like {
            field: field.into(),
            pattern: pattern.into(),
            negated: false,
        }
    }

    /// Creates a `NOT LIKE` predicate
    pub fn not_like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like {
            field: field.into(),
            pattern: pattern.into(),
            negated: true,
        }
    }

    /// Creates an `IS NULL` predicate
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::NullCheck {
            field: field.into(),
            is_null: true,
        }
    }

    /// Creates an `IS NOT NULL` predicate
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::NullCheck {
            field: field.into(),
            is_null: false,
        }
    }

    pub fn and(children: Vec<Predicate>) -> Self {
        Self::Logical {
            op: LogicalOp::And,
            children,
        }
    }

    pub fn or(children: Vec<Predicate>) -> Self {
        Self::Logical {
            op: LogicalOp::Or,
            children,
        }
    }

    pub fn negate(child: Predicate) -> Self {
        Self::Logical {
            op: LogicalOp::Not,
            children: vec![child],
        }
    }

    /// Creates a sub-select membership predicate
    pub fn subquery(field: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::Subquery {
            field: field.into(),
            sql: sql.into(),
        }
    }

    /// Creates an opaque SQL fragment
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw { sql: sql.into() }
    }

    /// Returns the referenced field as written (possibly table-qualified).
    ///
    /// Composite and raw predicates have no single field.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Comparison { field, .. }
            | Self::In { field, .. }
            | Self::Between { field, .. }
            | Self::Like { field, .. }
            | Self::NullCheck { field, .. }
            | Self::Subquery { field, .. } => Some(field.as_str()),
            Self::Logical { .. } | Self::Raw { .. } => None,
        }
    }

    /// Returns the field with any table qualifier stripped
    pub fn column(&self) -> Option<&str> {
        self.field().map(unqualified)
    }

    /// Returns the table qualifier of the field, if it has one
    pub fn qualifier(&self) -> Option<&str> {
        self.field()
            .and_then(|field| field.rsplit_once('.'))
            .map(|(table, _)| table.trim())
            .filter(|table| !table.is_empty())
    }

    /// Returns true if this predicate references exactly one field
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::Logical { .. } | Self::Raw { .. })
    }

    /// Collects leaf predicates depth-first, descending into AND/OR/NOT groups
    pub fn leaves(&self) -> Vec<&Predicate> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Predicate>) {
        match self {
            Self::Logical { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
            Self::Raw { .. } => {}
            leaf => out.push(leaf),
        }
    }

    /// Renders the predicate as display SQL
    pub fn to_sql(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Comparison { field, op, value } => {
                write!(f, "{} {} {}", field, op.symbol(), value)
            }
            Self::In {
                field,
                values,
                negated,
            } => {
                let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                let keyword = if *negated { "NOT IN" } else { "IN" };
                write!(f, "{} {} ({})", field, keyword, rendered.join(", "))
            }
            Self::Between { field, low, high } => {
                write!(f, "{} BETWEEN {} AND {}", field, low, high)
            }
            Self::Like {
                field,
                pattern,
                negated,
            } => {
                let keyword = if *negated { "NOT LIKE" } else { "LIKE" };
                write!(f, "{} {} '{}'", field, keyword, pattern.replace('\'', "''"))
            }
            Self::NullCheck { field, is_null } => {
                let keyword = if *is_null { "IS NULL" } else { "IS NOT NULL" };
                write!(f, "{} {}", field, keyword)
            }
            Self::Logical { op, children } => match op {
                LogicalOp::Not => match children.first() {
                    Some(child) => write!(f, "NOT ({})", child),
                    None => write!(f, "NOT ()"),
                },
                LogicalOp::And | LogicalOp::Or => {
                    let separator = format!(" {} ", op.as_str());
                    let rendered: Vec<String> =
                        children.iter().map(|c| format!("({})", c)).collect();
                    write!(f, "{}", rendered.join(&separator))
                }
            },
            Self::Subquery { field, sql } => write!(f, "{} IN ({})", field, sql),
            Self::Raw { sql } => write!(f, "{}", sql),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_symbols() {
        assert_eq!(ComparisonOp::from_symbol("<>"), Some(ComparisonOp::NotEq));
        assert_eq!(ComparisonOp::from_symbol("!="), Some(ComparisonOp::NotEq));
        assert_eq!(ComparisonOp::from_symbol(">="), Some(ComparisonOp::GtEq));
        assert_eq!(ComparisonOp::from_symbol("~"), None);
        assert!(ComparisonOp::Lt.is_range());
        assert!(!ComparisonOp::Eq.is_range());
    }

    #[test]
    fn test_field_qualifier_and_column() {
        let predicate = Predicate::equals("orders.status", "paid");
        assert_eq!(predicate.field(), Some("orders.status"));
        assert_eq!(predicate.column(), Some("status"));
        assert_eq!(predicate.qualifier(), Some("orders"));

        let unqualified = Predicate::equals("id", 1i64);
        assert_eq!(unqualified.column(), Some("id"));
        assert_eq!(unqualified.qualifier(), None);

        assert_eq!(Predicate::raw("1 = 1").field(), None);
    }

    #[test]
    fn test_leaves_descend_into_groups() {
        let predicate = Predicate::or(vec![
            Predicate::equals("a", 1i64),
            Predicate::negate(Predicate::is_null("b")),
            Predicate::raw("c > d"),
        ]);

        let fields: Vec<_> = predicate
            .leaves()
            .into_iter()
            .filter_map(|p| p.field())
            .collect();
        assert_eq!(fields, vec!["a", "b"]);
    }

    #[test]
    fn test_to_sql() {
        assert_eq!(Predicate::equals("id", 123i64).to_sql(), "id = 123");
        assert_eq!(
            Predicate::between("age", 18i64, 65i64).to_sql(),
            "age BETWEEN 18 AND 65"
        );
        assert_eq!(
            Predicate::like("description", "%x%").to_sql(),
            "description LIKE '%x%'"
        );
        assert_eq!(
            Predicate::in_list("status", vec!["a".into(), "b".into()]).to_sql(),
            "status IN ('a', 'b')"
        );
        assert_eq!(
            Predicate::and(vec![Predicate::equals("a", 1i64), Predicate::is_not_null("b")]).to_sql(),
            "(a = 1) AND (b IS NOT NULL)"
        );
    }

    #[test]
    fn test_serde_tagging() {
        let predicate = Predicate::compare("age", ComparisonOp::GtEq, 21i64);
        let json = serde_json::to_string(&predicate).unwrap();
        assert!(json.contains("\"kind\":\"comparison\""));
        assert!(json.contains("\">=\""));

        let parsed: Predicate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, predicate);
    }

    #[test]
    fn test_not_equal_alias_deserializes() {
        let json = r#"{"kind":"comparison","field":"x","op":"<>","value":{"Int64":1}}"#;
        let parsed: Predicate = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, Predicate::compare("x", ComparisonOp::NotEq, 1i64));
    }
}
