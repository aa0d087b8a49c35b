//! Error types for factor extraction.

use aptpca_math::{ErrorKind, MathError};
use aptpca_traits::ProviderError;

/// Errors that can occur during factor extraction.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Data provider error.
    #[error("data provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Requested factor count out of range.
    #[error("invalid factor count: requested {k}, must be between 1 and {n}")]
    InvalidK {
        /// Requested factor count.
        k: usize,
        /// Number of available factors (assets).
        n: usize,
    },

    /// Shrinkage weight negative or not finite.
    #[error("invalid shrinkage weight: {0} (must be finite and non-negative)")]
    InvalidShrinkageWeight(f64),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ModelError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Math(e) => e.kind(),
            Self::Provider(_) => ErrorKind::DataProvider,
            Self::InvalidK { .. } => ErrorKind::InvalidK,
            Self::InvalidShrinkageWeight(_) | Self::InvalidConfig(_) => ErrorKind::InvalidInput,
        }
    }

    /// Returns whether a retry with a different weight or window could succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Math(e) => e.is_recoverable(),
            Self::Provider(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ModelError::InvalidK { k: 5, n: 3 };
        assert_eq!(err.to_string(), "invalid factor count: requested 5, must be between 1 and 3");

        let err = ModelError::from(MathError::EmptyPanel { periods: 0, assets: 2 });
        assert!(err.to_string().starts_with("math error: empty panel"));
    }

    #[test]
    fn error_kind() {
        assert_eq!(ModelError::InvalidK { k: 0, n: 3 }.kind(), ErrorKind::InvalidK);
        assert_eq!(
            ModelError::from(MathError::NumericalInstability { sweeps: 100, off_norm: 1.0 })
                .kind(),
            ErrorKind::NumericalInstability
        );
        assert_eq!(
            ModelError::from(ProviderError::MissingColumn("date".to_string())).kind(),
            ErrorKind::DataProvider
        );
    }

    #[test]
    fn error_is_recoverable() {
        let err = ModelError::from(MathError::DegenerateInput("zero".to_string()));
        assert!(err.is_recoverable());

        let err = ModelError::InvalidK { k: 0, n: 3 };
        assert!(!err.is_recoverable());
    }
}
