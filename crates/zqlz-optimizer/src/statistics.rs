//! Table statistics collaborators
//!
//! The join reorder optimizer and the index-friendly predicate reordering
//! consult a [`TableStatistics`] provider. No live database is contacted; the
//! caller decides where the numbers come from.

use std::collections::{HashMap, HashSet};

/// Row count assumed for tables without statistics
pub const DEFAULT_ROW_COUNT: u64 = 1_000;

/// Join selectivity assumed for table pairs without statistics
pub const DEFAULT_JOIN_SELECTIVITY: f64 = 0.1;

/// Source of table-level estimates
pub trait TableStatistics: Send + Sync {
    /// Estimated number of rows in `table`
    fn estimated_row_count(&self, table: &str) -> u64;

    /// Fraction of the cross product of `left` and `right` that survives a join on `field`
    fn join_selectivity(&self, left: &str, right: &str, field: &str) -> f64;

    /// Whether `table` has an index whose leading column is `field`
    fn has_index_on_field(&self, table: &str, field: &str) -> bool;
}

/// Conservative constants for every table
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTableStatistics;

impl TableStatistics for DefaultTableStatistics {
    fn estimated_row_count(&self, _table: &str) -> u64 {
        DEFAULT_ROW_COUNT
    }

    fn join_selectivity(&self, _left: &str, _right: &str, _field: &str) -> f64 {
        DEFAULT_JOIN_SELECTIVITY
    }

    fn has_index_on_field(&self, _table: &str, _field: &str) -> bool {
        false
    }
}

/// Statistics from a fixed snapshot, e.g. a catalog dump taken by the caller.
///
/// Lookups are case-insensitive. Join selectivities are symmetric in the two
/// table names. Anything not registered falls back to the defaults.
#[derive(Debug, Clone)]
pub struct StaticTableStatistics {
    row_counts: HashMap<String, u64>,
    join_selectivities: HashMap<(String, String, String), f64>,
    indexes: HashSet<(String, String)>,
    default_row_count: u64,
    default_join_selectivity: f64,
}

impl Default for StaticTableStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticTableStatistics {
    pub fn new() -> Self {
        Self {
            row_counts: HashMap::new(),
            join_selectivities: HashMap::new(),
            indexes: HashSet::new(),
            default_row_count: DEFAULT_ROW_COUNT,
            default_join_selectivity: DEFAULT_JOIN_SELECTIVITY,
        }
    }

    /// Registers the row count of a table
    pub fn with_row_count(mut self, table: &str, rows: u64) -> Self {
        self.row_counts.insert(normalize(table), rows);
        self
    }

    /// Registers the selectivity of joining `left` and `right` on `field`
    pub fn with_join_selectivity(
        mut self,
        left: &str,
        right: &str,
        field: &str,
        selectivity: f64,
    ) -> Self {
        self.join_selectivities
            .insert(pair_key(left, right, field), selectivity.clamp(0.0, 1.0));
        self
    }

    /// Registers an index on `table(field)`
    pub fn with_index(mut self, table: &str, field: &str) -> Self {
        self.indexes.insert((normalize(table), normalize(field)));
        self
    }

    pub fn with_default_row_count(mut self, rows: u64) -> Self {
        self.default_row_count = rows;
        self
    }

    pub fn with_default_join_selectivity(mut self, selectivity: f64) -> Self {
        self.default_join_selectivity = selectivity.clamp(0.0, 1.0);
        self
    }
}

impl TableStatistics for StaticTableStatistics {
    fn estimated_row_count(&self, table: &str) -> u64 {
        self.row_counts
            .get(&normalize(table))
            .copied()
            .unwrap_or(self.default_row_count)
    }

    fn join_selectivity(&self, left: &str, right: &str, field: &str) -> f64 {
        self.join_selectivities
            .get(&pair_key(left, right, field))
            .copied()
            .unwrap_or(self.default_join_selectivity)
    }

    fn has_index_on_field(&self, table: &str, field: &str) -> bool {
        self.indexes
            .contains(&(normalize(table), normalize(zqlz_core::unqualified(field))))
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

fn pair_key(left: &str, right: &str, field: &str) -> (String, String, String) {
    let (left, right) = (normalize(left), normalize(right));
    let field = normalize(zqlz_core::unqualified(field));
    if left <= right {
        (left, right, field)
    } else {
        (right, left, field)
    }
}
