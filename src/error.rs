//! Error types for thlasso.

use thiserror::Error;

/// Error type for thlasso operations.
#[derive(Debug, Error)]
pub enum BanditError {
    /// Normal equations are not invertible.
    ///
    /// Only produced by the primary least-squares path; the estimator never
    /// sees it because the least-squares entry point falls back to SVD.
    #[error("Singular system: {0}")]
    Singular(String),

    /// Solver error.
    #[error("Solver error: {0}")]
    SolverError(String),

    /// Shape mismatch.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Invalid configuration or call sequence.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Numerical error (non-finite values). Fatal to the current trial.
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// Failure while persisting experiment logs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BanditError {
    pub(crate) fn shape(expected: impl ToString, got: impl ToString) -> Self {
        BanditError::ShapeMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

/// Result type for thlasso operations.
pub type Result<T> = std::result::Result<T, BanditError>;
