//! Suggestion types produced by the advisors
//!
//! Every suggestion is an immutable value: advisors build it once and callers
//! only read it through accessors.

mod index;
mod join;
mod pushdown;

pub use index::*;
pub use join::*;
pub use pushdown::*;

use serde::{Deserialize, Serialize};

/// How urgently a suggestion should be considered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Maps a selectivity to a priority: below 0.1 is high, below 0.3 medium
    pub fn from_selectivity(selectivity: f64) -> Self {
        if selectivity < 0.1 {
            Self::High
        } else if selectivity < 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_from_selectivity() {
        assert_eq!(Priority::from_selectivity(0.05), Priority::High);
        assert_eq!(Priority::from_selectivity(0.1), Priority::Medium);
        assert_eq!(Priority::from_selectivity(0.29), Priority::Medium);
        assert_eq!(Priority::from_selectivity(0.3), Priority::Low);
        assert_eq!(Priority::from_selectivity(0.9), Priority::Low);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_priority_serialization() {
        let json = serde_json::to_string(&Priority::High).unwrap();
        assert_eq!(json, "\"HIGH\"");
        let parsed: Priority = serde_json::from_str("\"LOW\"").unwrap();
        assert_eq!(parsed, Priority::Low);
    }
}
