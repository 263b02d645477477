//! Common test utilities and mocks

#![allow(dead_code)]

use std::sync::{Arc, Once};
use std::time::Duration;
use zqlz_core::{ComparisonOp, JoinClause, OrderBy, Predicate, QueryModel};
use zqlz_optimizer::{StaticTableStatistics, TableStatistics};

static TRACING: Once = Once::new();

/// Installs a test-writer tracing subscriber once per test binary
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// `[id = 123, description LIKE '%x%', age BETWEEN 18 AND 65]` on `items`
pub fn mixed_filter_query() -> QueryModel {
    QueryModel::new("items").with_predicates(vec![
        Predicate::equals("id", 123i64),
        Predicate::like("description", "%x%"),
        Predicate::between("age", 18i64, 65i64),
    ])
}

/// Orders joined to customers and products with filters on every table
pub fn order_report_query() -> QueryModel {
    QueryModel::new("orders")
        .with_alias("o")
        .with_join(JoinClause::inner("customers", "o.customer_id", "id").with_alias("c"))
        .with_join(JoinClause::inner("products", "o.product_id", "id").with_alias("p"))
        .with_predicate(Predicate::compare("o.created_at", ComparisonOp::GtEq, "2024-01-01"))
        .with_predicate(Predicate::equals("c.country", "NZ"))
        .with_predicate(Predicate::like("p.name", "%widget%"))
        .with_predicate(Predicate::equals("o.status", "shipped"))
        .with_group_by("o.status")
        .with_order_by(OrderBy::desc("o.created_at"))
}

/// Catalog snapshot matching [`order_report_query`]
pub fn order_report_statistics() -> StaticTableStatistics {
    StaticTableStatistics::new()
        .with_row_count("orders", 5_000_000)
        .with_row_count("customers", 20_000)
        .with_row_count("products", 500)
        .with_join_selectivity("orders", "customers", "id", 0.00005)
        .with_join_selectivity("orders", "products", "id", 0.002)
        .with_index("customers", "id")
        .with_index("products", "id")
        .with_index("orders", "status")
}

/// Statistics provider that sleeps on every call
pub struct SlowStatistics {
    pub delay: Duration,
}

impl SlowStatistics {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl TableStatistics for SlowStatistics {
    fn estimated_row_count(&self, _table: &str) -> u64 {
        std::thread::sleep(self.delay);
        1_000
    }

    fn join_selectivity(&self, _left: &str, _right: &str, _field: &str) -> f64 {
        std::thread::sleep(self.delay);
        0.1
    }

    fn has_index_on_field(&self, _table: &str, _field: &str) -> bool {
        std::thread::sleep(self.delay);
        false
    }
}

/// Statistics provider that records every table it is asked about
pub struct CountingStatistics {
    inner: StaticTableStatistics,
    pub row_count_calls: Arc<parking_lot::Mutex<Vec<String>>>,
    pub total_calls: Arc<parking_lot::Mutex<usize>>,
}

impl CountingStatistics {
    pub fn new(inner: StaticTableStatistics) -> Self {
        Self {
            inner,
            row_count_calls: Arc::new(parking_lot::Mutex::new(Vec::new())),
            total_calls: Arc::new(parking_lot::Mutex::new(0)),
        }
    }
}

impl TableStatistics for CountingStatistics {
    fn estimated_row_count(&self, table: &str) -> u64 {
        *self.total_calls.lock() += 1;
        self.row_count_calls.lock().push(table.to_string());
        self.inner.estimated_row_count(table)
    }

    fn join_selectivity(&self, left: &str, right: &str, field: &str) -> f64 {
        *self.total_calls.lock() += 1;
        self.inner.join_selectivity(left, right, field)
    }

    fn has_index_on_field(&self, table: &str, field: &str) -> bool {
        *self.total_calls.lock() += 1;
        self.inner.has_index_on_field(table, field)
    }
}
