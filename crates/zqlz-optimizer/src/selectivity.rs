//! Heuristic selectivity estimation
//!
//! Selectivity is the fraction of rows expected to satisfy a predicate, in
//! [0, 1]. Lower values mean the predicate filters out more rows. Estimates
//! depend only on the predicate's shape, never on live statistics, so the
//! same predicate always yields the same value.

use crate::error::{OptimizerError, Result};
use zqlz_core::{ComparisonOp, Predicate};

pub const EQUALITY_SELECTIVITY: f64 = 0.1;
pub const INEQUALITY_SELECTIVITY: f64 = 0.9;
pub const RANGE_SELECTIVITY: f64 = 0.3;
pub const BETWEEN_SELECTIVITY: f64 = 0.3;
pub const IN_LIST_MAX_SELECTIVITY: f64 = 0.5;
pub const LIKE_EXACT_SELECTIVITY: f64 = 0.1;
pub const LIKE_LEADING_WILDCARD_SELECTIVITY: f64 = 0.7;
pub const LIKE_WILDCARD_SELECTIVITY: f64 = 0.3;
pub const NULL_CHECK_SELECTIVITY: f64 = 0.1;
pub const DEFAULT_SELECTIVITY: f64 = 0.5;

/// Estimates the selectivity of a predicate
pub fn estimate_selectivity(predicate: &Predicate) -> f64 {
    match predicate {
        Predicate::Comparison { op, .. } => match op {
            ComparisonOp::Eq => EQUALITY_SELECTIVITY,
            ComparisonOp::NotEq => INEQUALITY_SELECTIVITY,
            ComparisonOp::Lt | ComparisonOp::LtEq | ComparisonOp::Gt | ComparisonOp::GtEq => {
                RANGE_SELECTIVITY
            }
        },
        // NOT IN and NOT LIKE keep nearly every row, like an inequality
        Predicate::In { negated: true, .. } | Predicate::Like { negated: true, .. } => {
            INEQUALITY_SELECTIVITY
        }
        Predicate::In { values, .. } => {
            (values.len() as f64 / 100.0).min(IN_LIST_MAX_SELECTIVITY)
        }
        Predicate::Between { .. } => BETWEEN_SELECTIVITY,
        Predicate::Like { pattern, .. } => like_selectivity(pattern),
        Predicate::NullCheck { .. } => NULL_CHECK_SELECTIVITY,
        Predicate::Logical { .. } | Predicate::Subquery { .. } | Predicate::Raw { .. } => {
            DEFAULT_SELECTIVITY
        }
    }
}

/// Checked variant for callers holding an optional predicate
pub fn try_estimate_selectivity(predicate: Option<&Predicate>) -> Result<f64> {
    predicate
        .map(estimate_selectivity)
        .ok_or_else(|| OptimizerError::invalid_argument("predicate must not be null"))
}

fn like_selectivity(pattern: &str) -> f64 {
    let is_wildcard = |c: char| c == '%' || c == '_';

    if !pattern.contains(is_wildcard) {
        LIKE_EXACT_SELECTIVITY
    } else if pattern.starts_with(is_wildcard) {
        LIKE_LEADING_WILDCARD_SELECTIVITY
    } else {
        LIKE_WILDCARD_SELECTIVITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zqlz_core::Value;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_comparison_operators() {
        assert!(approx(
            estimate_selectivity(&Predicate::equals("id", 1i64)),
            0.1
        ));
        assert!(approx(
            estimate_selectivity(&Predicate::compare("id", ComparisonOp::NotEq, 1i64)),
            0.9
        ));
        for op in [
            ComparisonOp::Lt,
            ComparisonOp::LtEq,
            ComparisonOp::Gt,
            ComparisonOp::GtEq,
        ] {
            assert!(approx(
                estimate_selectivity(&Predicate::compare("age", op, 30i64)),
                0.3
            ));
        }
    }

    #[test]
    fn test_in_list_scales_with_value_count() {
        let values = |n: i64| (0..n).map(Value::from).collect::<Vec<_>>();

        assert!(approx(
            estimate_selectivity(&Predicate::in_list("id", values(3))),
            0.03
        ));
        assert!(approx(
            estimate_selectivity(&Predicate::in_list("id", values(50))),
            0.5
        ));
        assert!(approx(
            estimate_selectivity(&Predicate::in_list("id", values(500))),
            0.5
        ));
        assert!(approx(
            estimate_selectivity(&Predicate::in_list("id", Vec::new())),
            0.0
        ));
    }

    #[test]
    fn test_like_patterns() {
        assert!(approx(
            estimate_selectivity(&Predicate::like("name", "alice")),
            0.1
        ));
        assert!(approx(
            estimate_selectivity(&Predicate::like("name", "%alice")),
            0.7
        ));
        assert!(approx(
            estimate_selectivity(&Predicate::like("name", "_lice")),
            0.7
        ));
        assert!(approx(
            estimate_selectivity(&Predicate::like("name", "ali%")),
            0.3
        ));
        assert!(approx(
            estimate_selectivity(&Predicate::like("name", "a_ice")),
            0.3
        ));
    }

    #[test]
    fn test_negated_forms_behave_like_inequality() {
        assert!(approx(
            estimate_selectivity(&Predicate::not_in("status", vec!["deleted".into()])),
            0.9
        ));
        assert!(approx(
            estimate_selectivity(&Predicate::not_like("name", "bob")),
            0.9
        ));
        assert!(approx(
            estimate_selectivity(&Predicate::not_like("name", "%bob")),
            0.9
        ));
    }

    #[test]
    fn test_other_kinds() {
        assert!(approx(
            estimate_selectivity(&Predicate::between("age", 18i64, 65i64)),
            0.3
        ));
        assert!(approx(
            estimate_selectivity(&Predicate::is_null("deleted_at")),
            0.1
        ));
        assert!(approx(
            estimate_selectivity(&Predicate::is_not_null("deleted_at")),
            0.1
        ));
        assert!(approx(
            estimate_selectivity(&Predicate::and(vec![Predicate::equals("a", 1i64)])),
            0.5
        ));
        assert!(approx(
            estimate_selectivity(&Predicate::subquery("user_id", "SELECT id FROM vip")),
            0.5
        ));
        assert!(approx(estimate_selectivity(&Predicate::raw("1 = 1")), 0.5));
    }

    #[test]
    fn test_ordering_properties() {
        let eq = estimate_selectivity(&Predicate::equals("a", 1i64));
        let range = estimate_selectivity(&Predicate::compare("a", ComparisonOp::Gt, 1i64));
        let ne = estimate_selectivity(&Predicate::compare("a", ComparisonOp::NotEq, 1i64));
        assert!(eq <= range && range <= ne);

        let exact = estimate_selectivity(&Predicate::like("a", "x"));
        let other = estimate_selectivity(&Predicate::like("a", "x%"));
        let leading = estimate_selectivity(&Predicate::like("a", "%x"));
        assert!(exact <= other && other <= leading);
    }

    #[test]
    fn test_deterministic() {
        let predicates = [
            Predicate::equals("id", 1i64),
            Predicate::like("d", "%x%"),
            Predicate::in_list("s", vec!["a".into(), "b".into()]),
            Predicate::raw("x"),
        ];
        for predicate in &predicates {
            assert_eq!(
                estimate_selectivity(predicate).to_bits(),
                estimate_selectivity(predicate).to_bits()
            );
        }
    }

    #[test]
    fn test_try_estimate_rejects_missing_predicate() {
        assert!(matches!(
            try_estimate_selectivity(None),
            Err(OptimizerError::InvalidArgument(_))
        ));
        let predicate = Predicate::equals("id", 1i64);
        assert!(approx(try_estimate_selectivity(Some(&predicate)).unwrap(), 0.1));
    }
}
