use crate::error::{OptimizerError, Result};
use serde::{Deserialize, Serialize};

/// Criterion that produced a join reorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinReorderKind {
    /// Small, selective tables first
    SelectivityBased,
    /// Orders chosen so indexed join keys are probed
    IndexDriven,
}

impl JoinReorderKind {
    pub fn description(&self) -> &'static str {
        match self {
            Self::SelectivityBased => "Join smaller, more selective tables first",
            Self::IndexDriven => "Join order chosen to probe indexed join keys",
        }
    }
}

/// An alternative join order for the same set of tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinReorderSuggestion {
    original_sequence: Vec<String>,
    suggested_sequence: Vec<String>,
    kind: JoinReorderKind,
    estimated_improvement: f64,
    reason: String,
    expected_impact: String,
}

impl JoinReorderSuggestion {
    /// Creates a suggestion; `suggested` must be a reordering of `original`
    pub fn new(
        original: Vec<String>,
        suggested: Vec<String>,
        kind: JoinReorderKind,
        estimated_improvement: f64,
    ) -> Result<Self> {
        if !is_permutation(&original, &suggested) {
            return Err(OptimizerError::InvalidArgument(format!(
                "suggested join order [{}] is not a permutation of [{}]",
                suggested.join(", "),
                original.join(", ")
            )));
        }

        Ok(Self {
            original_sequence: original,
            suggested_sequence: suggested,
            kind,
            estimated_improvement: estimated_improvement.clamp(0.0, 1.0),
            reason: String::new(),
            expected_impact: String::new(),
        })
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_expected_impact(mut self, impact: impl Into<String>) -> Self {
        self.expected_impact = impact.into();
        self
    }

    pub fn original_sequence(&self) -> &[String] {
        &self.original_sequence
    }

    pub fn suggested_sequence(&self) -> &[String] {
        &self.suggested_sequence
    }

    pub fn kind(&self) -> JoinReorderKind {
        self.kind
    }

    /// Fractional reduction of intermediate rows, in [0, 1]
    pub fn estimated_improvement(&self) -> f64 {
        self.estimated_improvement
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn expected_impact(&self) -> &str {
        &self.expected_impact
    }
}

fn is_permutation(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a: Vec<&String> = a.iter().collect();
    let mut b: Vec<&String> = b.iter().collect();
    a.sort();
    b.sort();
    a == b
}
