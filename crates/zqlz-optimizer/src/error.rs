//! Error types for the optimizer

use thiserror::Error;

/// Errors surfaced by the optimizer and its advisors
#[derive(Debug, Error)]
pub enum OptimizerError {
    /// Caller supplied an argument the optimizer cannot work with
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Analysis finished but took longer than the configured budget
    #[error("Analysis took {elapsed_ms}ms, exceeding the {budget_ms}ms budget")]
    TimeoutExceeded { elapsed_ms: u64, budget_ms: u64 },

    /// Information needed by an advisor could not be extracted from the query model
    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OptimizerError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction(message.into())
    }

    /// Returns true for failures an advisor may degrade on instead of propagating
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Extraction(_))
    }
}

impl From<toml::de::Error> for OptimizerError {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Result type alias for optimizer operations
pub type Result<T> = std::result::Result<T, OptimizerError>;
