//! Error types for mathematical operations.

/// Failure category shared by every error in the extraction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or empty input.
    Dimension,
    /// Rank-deficient or zero-information input.
    DegenerateInput,
    /// Eigensolver did not converge.
    NumericalInstability,
    /// Requested factor count out of range.
    InvalidK,
    /// NaN, Inf or otherwise unusable input values.
    InvalidInput,
    /// An internal invariant was broken; indicates a construction bug.
    InvariantViolation,
    /// The data provider failed.
    DataProvider,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dimension => write!(f, "dimension"),
            Self::DegenerateInput => write!(f, "degenerate input"),
            Self::NumericalInstability => write!(f, "numerical instability"),
            Self::InvalidK => write!(f, "invalid k"),
            Self::InvalidInput => write!(f, "invalid input"),
            Self::InvariantViolation => write!(f, "invariant violation"),
            Self::DataProvider => write!(f, "data provider"),
        }
    }
}

/// Errors that can occur during mathematical operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MathError {
    /// Panel has no periods or no assets.
    #[error("empty panel: {periods} periods x {assets} assets (need at least 1 x 1)")]
    EmptyPanel {
        /// Number of periods (T).
        periods: usize,
        /// Number of assets (N).
        assets: usize,
    },

    /// Dimension mismatch.
    #[error("dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// What was being compared.
        context: &'static str,
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Matrix has no rows.
    #[error("empty matrix")]
    EmptyMatrix,

    /// Matrix is not square.
    #[error("matrix must be square, got {rows} x {cols}")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Input carries no information to extract.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// Eigensolver failed to converge.
    #[error("eigensolver did not converge after {sweeps} sweeps (off-diagonal norm {off_norm:e})")]
    NumericalInstability {
        /// Sweeps performed.
        sweeps: usize,
        /// Remaining off-diagonal Frobenius norm.
        off_norm: f64,
    },

    /// NaN or Inf in an input matrix.
    #[error("non-finite value {value} at ({row}, {col}) in {context}")]
    NonFinite {
        /// Which matrix held the value.
        context: &'static str,
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// The offending value.
        value: f64,
    },

    /// Internal invariant broken.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl MathError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyPanel { .. }
            | Self::EmptyMatrix
            | Self::DimensionMismatch { .. }
            | Self::NotSquare { .. } => ErrorKind::Dimension,
            Self::DegenerateInput(_) => ErrorKind::DegenerateInput,
            Self::NumericalInstability { .. } => ErrorKind::NumericalInstability,
            Self::NonFinite { .. } => ErrorKind::InvalidInput,
            Self::InvariantViolation(_) => ErrorKind::InvariantViolation,
        }
    }

    /// Returns whether the caller may retry with different parameters.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::DegenerateInput(_) | Self::NumericalInstability { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MathError::EmptyPanel { periods: 0, assets: 3 };
        assert!(err.to_string().contains("0 periods x 3 assets"));

        let err = MathError::DimensionMismatch { context: "loadings", expected: 10, actual: 5 };
        assert_eq!(err.to_string(), "dimension mismatch for loadings: expected 10, got 5");
    }

    #[test]
    fn error_kind() {
        assert_eq!(MathError::NotSquare { rows: 2, cols: 3 }.kind(), ErrorKind::Dimension);
        assert_eq!(
            MathError::DegenerateInput("zero".to_string()).kind(),
            ErrorKind::DegenerateInput
        );
        assert_eq!(
            MathError::InvariantViolation("diag".to_string()).kind(),
            ErrorKind::InvariantViolation
        );
    }

    #[test]
    fn error_is_recoverable() {
        assert!(MathError::NumericalInstability { sweeps: 100, off_norm: 1e-3 }.is_recoverable());
        assert!(!MathError::InvariantViolation("diag".to_string()).is_recoverable());
        assert!(!MathError::EmptyPanel { periods: 0, assets: 0 }.is_recoverable());
    }
}
