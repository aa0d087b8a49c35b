//! Shrinkage target trait definitions.

use ndarray::{Array2, ArrayView1, ArrayView2};

/// Structured target blended into the raw second moment.
///
/// The moment matrix is `M + w * A`, where `A` is the adjustment returned by
/// [`ShrinkageTarget::adjustment`]. Implementations must return a symmetric
/// positive semi-definite `N x N` matrix so that the blend stays PSD.
pub trait ShrinkageTarget: Send + Sync {
    /// Build the adjustment matrix.
    ///
    /// # Arguments
    /// * `returns` - Return panel (T x N)
    /// * `column_means` - Per-asset mean returns (N,)
    fn adjustment(&self, returns: ArrayView2<'_, f64>, column_means: ArrayView1<'_, f64>)
    -> Array2<f64>;

    /// Returns the name of this target.
    fn name(&self) -> &str;
}
