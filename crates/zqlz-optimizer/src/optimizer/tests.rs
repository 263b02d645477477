//! Tests for the query optimizer facade

use super::*;
use crate::config::FailurePolicies;
use crate::statistics::StaticTableStatistics;
use crate::suggestions::{JoinReorderKind, Priority, PushdownKind};
use zqlz_core::{JoinClause, Predicate};

fn unreadable_query() -> QueryModel {
    QueryModel::new("users")
        .with_predicate(Predicate::equals("", 1i64))
        .with_predicate(Predicate::equals("email", "x"))
}

mod analysis_run_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_idle_to_completed() {
        let mut run = AnalysisRun::new(None);
        assert_eq!(run.state(), AnalysisState::Idle);
        run.start();
        assert_eq!(run.state(), AnalysisState::Analyzing);
        run.complete();
        assert_eq!(run.state(), AnalysisState::Completed);
    }

    #[test]
    fn test_finished_runs_do_not_change_state() {
        let mut run = AnalysisRun::new(None);
        run.start();
        run.fail(&OptimizerError::extraction("x"));
        run.complete();
        assert_eq!(run.state(), AnalysisState::Failed);
    }

    #[test]
    fn test_complete_requires_start() {
        let mut run = AnalysisRun::new(None);
        run.complete();
        assert_eq!(run.state(), AnalysisState::Idle);
    }

    #[test]
    fn test_budget_exceeded_fails_run() {
        let mut run = AnalysisRun::new(Some(Duration::ZERO));
        run.start();
        std::thread::sleep(Duration::from_millis(2));

        let err = run.check_budget().unwrap_err();
        assert!(matches!(err, OptimizerError::TimeoutExceeded { budget_ms: 0, .. }));
        assert_eq!(run.state(), AnalysisState::Failed);
    }

    #[test]
    fn test_no_budget_never_times_out() {
        let mut run = AnalysisRun::new(None);
        run.start();
        assert!(run.check_budget().is_ok());
    }
}

mod optimize_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collects_all_advisors() {
        let statistics = StaticTableStatistics::new()
            .with_row_count("users", 1_000_000)
            .with_row_count("orders", 10);
        let query = QueryModel::new("users")
            .with_alias("u")
            .with_join(JoinClause::inner("orders", "u.id", "user_id").with_alias("o"))
            .with_predicate(Predicate::like("u.name", "%a%"))
            .with_predicate(Predicate::equals("o.status", "paid"));

        let result = QueryOptimizer::new()
            .with_statistics(Arc::new(statistics))
            .optimize(&query)
            .unwrap();

        assert!(!result.index_suggestions().is_empty());
        assert!(
            result
                .pushdown_suggestions()
                .iter()
                .any(|s| s.kind() == PushdownKind::PushToJoinSource)
        );
        assert_eq!(result.join_suggestions().len(), 1);
        assert_eq!(
            result.join_suggestions()[0].kind(),
            JoinReorderKind::SelectivityBased
        );
        assert!(!result.is_degraded());
    }

    #[test]
    fn test_disabled_advisors_contribute_nothing() {
        let config = OptimizerConfig::default()
            .with_index_suggestions(false)
            .with_predicate_pushdown(false)
            .with_join_reordering(false);
        let optimizer = QueryOptimizer::with_config(config).unwrap();

        let result = optimizer.optimize(&unreadable_query()).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.summary(), "No optimization opportunities found.");
    }

    #[test]
    fn test_end_to_end_selective_predicate() {
        let query = QueryModel::new("items").with_predicates(vec![
            Predicate::equals("id", 123i64),
            Predicate::like("description", "%x%"),
            Predicate::between("age", 18i64, 65i64),
        ]);

        let result = QueryOptimizer::new().optimize(&query).unwrap();
        let id_move = result
            .pushdown_suggestions()
            .iter()
            .find(|s| s.original_position() == 0)
            .expect("suggestion for id = 123");

        assert_eq!(id_move.suggested_position(), 0);
        assert_eq!(id_move.priority(), Priority::High);
        assert!(id_move.reason().contains("0.1"));
    }

    #[test]
    fn test_empty_base_table_is_invalid() {
        let err = QueryOptimizer::new()
            .optimize(&QueryModel::new("  "))
            .unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidArgument(_)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = OptimizerConfig::default().with_join_reordering_threshold(1.5);
        assert!(matches!(
            QueryOptimizer::with_config(config),
            Err(OptimizerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_verbose_summary_includes_target() {
        let config = OptimizerConfig::default()
            .with_verbose_output(true)
            .with_target_database(crate::config::TargetDatabase::Mysql);
        let result = QueryOptimizer::with_config(config)
            .unwrap()
            .optimize(&QueryModel::new("users"))
            .unwrap();
        assert!(result.summary().contains("MySQL"));
        assert_eq!(result.target_database(), crate::config::TargetDatabase::Mysql);
    }
}

mod failure_policy_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_policy_propagates_pushdown_failure() {
        let err = QueryOptimizer::new()
            .optimize(&unreadable_query())
            .unwrap_err();
        assert!(matches!(err, OptimizerError::Extraction(_)));
    }

    #[test]
    fn test_index_only_degrades_by_default() {
        let config = OptimizerConfig::default().with_predicate_pushdown(false);
        let result = QueryOptimizer::with_config(config)
            .unwrap()
            .optimize(&unreadable_query())
            .unwrap();

        assert!(result.is_degraded());
        assert_eq!(result.degraded()[0].advisor, AdvisorKind::Index);
        assert_eq!(result.index_suggestions().len(), 1);
    }

    #[test]
    fn test_degrade_all_records_every_advisor() {
        let config = OptimizerConfig::default()
            .with_failure_policy(FailurePolicies::degrade_all())
            .with_verbose_output(true);
        let query = unreadable_query().with_join(JoinClause::inner("", "id", "user_id"));

        let result = QueryOptimizer::with_config(config)
            .unwrap()
            .optimize(&query)
            .unwrap();

        let advisors: Vec<AdvisorKind> = result.degraded().iter().map(|d| d.advisor).collect();
        assert!(advisors.contains(&AdvisorKind::Index));
        assert!(advisors.contains(&AdvisorKind::Pushdown));
        assert!(advisors.contains(&AdvisorKind::JoinReorder));
        assert!(result.summary().contains("pushdown advisor degraded"));
    }

    #[test]
    fn test_propagate_all_fails_on_index_extraction() {
        let config = OptimizerConfig::default()
            .with_failure_policy(FailurePolicies::propagate_all())
            .with_predicate_pushdown(false);
        let err = QueryOptimizer::with_config(config)
            .unwrap()
            .optimize(&unreadable_query())
            .unwrap_err();
        assert!(matches!(err, OptimizerError::Extraction(_)));
    }
}

mod sql_text_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sql_text_is_not_analyzed() {
        let result = QueryOptimizer::new().optimize_sql("SELECT * FROM users WHERE id = 1");
        assert!(!result.has_suggestions());
        assert_eq!(result.summary(), SQL_TEXT_UNSUPPORTED);
        assert_eq!(result.analysis_time(), Duration::ZERO);
    }
}
