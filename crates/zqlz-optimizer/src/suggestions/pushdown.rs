use super::Priority;
use serde::{Deserialize, Serialize};
use zqlz_core::Predicate;

/// Kind of predicate placement change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PushdownKind {
    /// Evaluate more selective predicates first
    ReorderBySelectivity,
    /// Filter a joined table before the join
    PushToJoinSource,
    /// Move the filter into a sub-select
    PushToSubquery,
    /// Evaluate a highly selective filter as early as possible
    EarlyFilter,
    /// Move a predicate that can use an index ahead of others
    IndexFriendlyReorder,
}

impl PushdownKind {
    /// Returns a human-readable description of this kind
    pub fn description(&self) -> &'static str {
        match self {
            Self::ReorderBySelectivity => "Reorder predicates by selectivity",
            Self::PushToJoinSource => "Push filter down to join source",
            Self::PushToSubquery => "Push filter into subquery",
            Self::EarlyFilter => "Apply filter early",
            Self::IndexFriendlyReorder => "Reorder predicate to use an index",
        }
    }
}

/// A suggested new position (or target table) for one predicate.
///
/// The predicate itself is carried unchanged; only its placement differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicatePushdownSuggestion {
    predicate: Predicate,
    original_position: usize,
    suggested_position: usize,
    estimated_selectivity: f64,
    kind: PushdownKind,
    reason: String,
    expected_impact: String,
    priority: Priority,
    target_table: Option<String>,
}

impl PredicatePushdownSuggestion {
    pub(crate) fn new(
        predicate: &Predicate,
        original_position: usize,
        suggested_position: usize,
        estimated_selectivity: f64,
        kind: PushdownKind,
        priority: Priority,
    ) -> Self {
        Self {
            predicate: predicate.clone(),
            original_position,
            suggested_position,
            estimated_selectivity,
            kind,
            reason: String::new(),
            expected_impact: String::new(),
            priority,
            target_table: None,
        }
    }

    pub(crate) fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub(crate) fn with_expected_impact(mut self, impact: impl Into<String>) -> Self {
        self.expected_impact = impact.into();
        self
    }

    pub(crate) fn with_target_table(mut self, table: impl Into<String>) -> Self {
        self.target_table = Some(table.into());
        self
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn original_position(&self) -> usize {
        self.original_position
    }

    pub fn suggested_position(&self) -> usize {
        self.suggested_position
    }

    pub fn estimated_selectivity(&self) -> f64 {
        self.estimated_selectivity
    }

    pub fn kind(&self) -> PushdownKind {
        self.kind
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

    pub fn target_table(&self) -> Option<&str> {
        self.target_table.as_deref()
    }

    /// Number of positions the predicate moves (0 for pure retargeting)
    pub fn displacement(&self) -> usize {
        self.original_position.abs_diff(self.suggested_position)
    }
}
