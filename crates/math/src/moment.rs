//! Shrinkage-adjusted second-moment matrix.

use aptpca_primitives::ShrinkageWeight;
use aptpca_traits::ShrinkageTarget;
use ndarray::{Array2, ArrayView2, Axis};

use crate::{MathError, MeanOuterProduct};

/// Symmetric N x N matrix `X'X / T + w * A(mu)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentMatrix {
    matrix: Array2<f64>,
}

impl MomentMatrix {
    /// Order of the matrix (N).
    #[must_use]
    pub fn order(&self) -> usize {
        self.matrix.nrows()
    }

    /// Borrow the underlying matrix.
    #[must_use]
    pub const fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Borrowed view of the matrix.
    #[must_use]
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.matrix.view()
    }

    /// Sum of the diagonal.
    #[must_use]
    pub fn trace(&self) -> f64 {
        self.matrix.diag().sum()
    }

    /// Consume into the underlying matrix.
    #[must_use]
    pub fn into_inner(self) -> Array2<f64> {
        self.matrix
    }
}

/// Builds the moment matrix from a return panel.
///
/// The second moment is uncentered so that mean-return information survives
/// into the factors. The shrinkage target `S` supplies the mean-return
/// adjustment blended in with the caller's weight.
#[derive(Debug, Clone, Default)]
pub struct MomentMatrixBuilder<S = MeanOuterProduct> {
    target: S,
}

impl MomentMatrixBuilder {
    /// Create a builder with the mean outer product target.
    #[must_use]
    pub const fn new() -> Self {
        Self { target: MeanOuterProduct }
    }
}

impl<S: ShrinkageTarget> MomentMatrixBuilder<S> {
    /// Create a builder with a custom shrinkage target.
    #[must_use]
    pub const fn with_target(target: S) -> Self {
        Self { target }
    }

    /// Get the shrinkage target.
    #[must_use]
    pub const fn target(&self) -> &S {
        &self.target
    }

    /// Build the moment matrix.
    ///
    /// Expects finite input; run the panel through the validator first.
    ///
    /// # Arguments
    /// * `returns` - Return panel (T x N)
    /// * `weight` - Shrinkage weight applied to the target
    ///
    /// # Errors
    /// Returns `MathError::EmptyPanel` if T or N is zero, and
    /// `MathError::DegenerateInput` if every column is constant with zero
    /// weight or the result is the zero matrix.
    pub fn build(
        &self,
        returns: ArrayView2<'_, f64>,
        weight: ShrinkageWeight,
    ) -> Result<MomentMatrix, MathError> {
        let (periods, assets) = returns.dim();
        if periods == 0 || assets == 0 {
            return Err(MathError::EmptyPanel { periods, assets });
        }

        if weight.is_zero() && all_columns_constant(returns) {
            return Err(MathError::DegenerateInput(
                "every column has zero variance and the shrinkage weight is zero".to_string(),
            ));
        }

        let mut matrix = returns.t().dot(&returns) / periods as f64;

        if !weight.is_zero() {
            let means = returns
                .mean_axis(Axis(0))
                .ok_or(MathError::EmptyPanel { periods, assets })?;
            let adjustment = self.target.adjustment(returns, means.view());
            if adjustment.dim() != (assets, assets) {
                return Err(MathError::DimensionMismatch {
                    context: "shrinkage adjustment",
                    expected: assets,
                    actual: adjustment.nrows(),
                });
            }
            matrix.scaled_add(weight.value(), &adjustment);
        }

        // Mirror the upper triangle so the result is exactly symmetric.
        for i in 0..assets {
            for j in (i + 1)..assets {
                matrix[[j, i]] = matrix[[i, j]];
            }
        }

        if matrix.iter().all(|&v| v == 0.0) {
            return Err(MathError::DegenerateInput("moment matrix is identically zero".to_string()));
        }

        tracing::debug!(
            periods,
            assets,
            weight = weight.value(),
            target = self.target.name(),
            "built moment matrix"
        );

        Ok(MomentMatrix { matrix })
    }
}

fn all_columns_constant(returns: ArrayView2<'_, f64>) -> bool {
    returns.columns().into_iter().all(|c| c.iter().all(|&x| x == c[0]))
}
