//! Error types for the floranet pipeline

use thiserror::Error;

/// Result type alias for floranet operations
pub type Result<T> = std::result::Result<T, FloranetError>;

/// Main error type for the floranet pipeline
#[derive(Error, Debug)]
pub enum FloranetError {
    #[error("data error: {0}")]
    Data(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("feature not found: {0}")]
    FeatureNotFound(String),

    /// Label outside the declared class set, or a feature column whose
    /// standardization is undefined.
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid fold count: k = {k} with {n} rows (need 2 <= k <= n)")]
    InvalidFoldCount { k: usize, n: usize },

    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Training exhausted its step budget without meeting the convergence
    /// threshold. Recoverable at the fold level, see `ConvergencePolicy`.
    #[error(
        "failed to converge after {steps} steps (loss delta {delta:.3e}, threshold {threshold:.3e})"
    )]
    Convergence {
        steps: usize,
        delta: f64,
        threshold: f64,
    },

    #[error("invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("not fitted")]
    NotFitted,

    /// Wraps any error escaping a cross-validation fold with its fold index.
    #[error("fold {fold_idx}: {source}")]
    Fold {
        fold_idx: usize,
        #[source]
        source: Box<FloranetError>,
    },
}

impl FloranetError {
    /// Attach fold context to an error propagating out of a fold.
    pub fn in_fold(self, fold_idx: usize) -> Self {
        FloranetError::Fold {
            fold_idx,
            source: Box::new(self),
        }
    }

    /// True for the recoverable trainer outcome, including its fold-wrapped form.
    pub fn is_convergence(&self) -> bool {
        match self {
            FloranetError::Convergence { .. } => true,
            FloranetError::Fold { source, .. } => source.is_convergence(),
            _ => false,
        }
    }
}

impl From<polars::error::PolarsError> for FloranetError {
    fn from(err: polars::error::PolarsError) -> Self {
        FloranetError::Data(err.to_string())
    }
}

impl From<ndarray::ShapeError> for FloranetError {
    fn from(err: ndarray::ShapeError) -> Self {
        FloranetError::ShapeMismatch {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FloranetError {
    fn from(err: serde_json::Error) -> Self {
        FloranetError::Data(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FloranetError::InvalidFoldCount { k: 1, n: 10 };
        assert_eq!(
            err.to_string(),
            "invalid fold count: k = 1 with 10 rows (need 2 <= k <= n)"
        );
    }

    #[test]
    fn test_fold_wrapping() {
        let err = FloranetError::Convergence {
            steps: 100,
            delta: 0.5,
            threshold: 0.01,
        }
        .in_fold(3);

        assert!(err.to_string().starts_with("fold 3:"));
        assert!(err.is_convergence());
        assert!(matches!(err, FloranetError::Fold { fold_idx: 3, .. }));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FloranetError = io_err.into();
        assert!(matches!(err, FloranetError::Io(_)));
    }
}
