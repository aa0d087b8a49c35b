//! Shrinkage targets for the moment matrix.

use aptpca_traits::ShrinkageTarget;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Outer product of the column means, `mu mu^T`.
///
/// Rank one and PSD; pulls the moment matrix toward the cross-section of
/// mean returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeanOuterProduct;

impl ShrinkageTarget for MeanOuterProduct {
    fn adjustment(
        &self,
        _returns: ArrayView2<'_, f64>,
        column_means: ArrayView1<'_, f64>,
    ) -> Array2<f64> {
        let mu = column_means.insert_axis(Axis(1));
        mu.dot(&mu.t())
    }

    fn name(&self) -> &str {
        "mean_outer_product"
    }
}

/// Squared grand mean of the panel spread over every entry, `m^2 * 1 1^T`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrandMean;

impl ShrinkageTarget for GrandMean {
    fn adjustment(
        &self,
        returns: ArrayView2<'_, f64>,
        column_means: ArrayView1<'_, f64>,
    ) -> Array2<f64> {
        let n = column_means.len();
        let m = returns.mean().unwrap_or(0.0);
        Array2::from_elem((n, n), m * m)
    }

    fn name(&self) -> &str {
        "grand_mean"
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn mean_outer_product_values() {
        let x = array![[0.01, 0.03], [0.03, -0.01]];
        let mu = array![0.02, 0.01];
        let a = MeanOuterProduct.adjustment(x.view(), mu.view());
        assert_relative_eq!(a[[0, 0]], 4e-4, epsilon = 1e-15);
        assert_relative_eq!(a[[0, 1]], 2e-4, epsilon = 1e-15);
        assert_relative_eq!(a[[1, 0]], 2e-4, epsilon = 1e-15);
        assert_relative_eq!(a[[1, 1]], 1e-4, epsilon = 1e-15);
    }

    #[test]
    fn grand_mean_is_constant() {
        let x = array![[0.01, 0.03], [0.03, -0.01]];
        let mu = array![0.02, 0.01];
        let a = GrandMean.adjustment(x.view(), mu.view());
        // grand mean = 0.015
        assert!(a.iter().all(|&v| (v - 2.25e-4).abs() < 1e-15));
        assert_eq!(GrandMean.name(), "grand_mean");
    }
}
