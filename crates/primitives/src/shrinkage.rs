//! Shrinkage weight definition.

use derive_more::{Display, Into};
use serde::{Deserialize, Serialize};

/// Non-negative weight applied to the mean-return adjustment of the moment matrix.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, Into, Serialize, Deserialize)]
pub struct ShrinkageWeight(f64);

impl ShrinkageWeight {
    /// Default APT weight.
    pub const DEFAULT: Self = Self(50.0);

    /// No shrinkage: the moment matrix is the plain second moment.
    pub const ZERO: Self = Self(0.0);

    /// Create a weight, rejecting negative and non-finite values.
    #[must_use]
    pub fn new(weight: f64) -> Option<Self> {
        (weight.is_finite() && weight >= 0.0).then_some(Self(weight))
    }

    /// Get the weight value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Check if the weight disables shrinkage.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl Default for ShrinkageWeight {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrinkage_weight_rejects_invalid() {
        assert!(ShrinkageWeight::new(-0.1).is_none());
        assert!(ShrinkageWeight::new(f64::NAN).is_none());
        assert!(ShrinkageWeight::new(f64::INFINITY).is_none());
        assert_eq!(ShrinkageWeight::new(0.0), Some(ShrinkageWeight::ZERO));
    }

    #[test]
    fn shrinkage_weight_default() {
        assert_eq!(ShrinkageWeight::default().value(), 50.0);
        assert!(!ShrinkageWeight::default().is_zero());
        let raw: f64 = ShrinkageWeight::ZERO.into();
        assert_eq!(raw, 0.0);
    }
}
