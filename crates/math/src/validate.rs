//! Stage-boundary checks for the extraction pipeline.

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::MathError;

/// Maximum deviation of `V^T V` from the identity accepted for an eigenbasis.
const ORTHONORMAL_TOL: f64 = 1e-8;

/// Return an error for the first NaN or Inf entry of `matrix`.
///
/// # Errors
/// Returns `MathError::NonFinite` naming `context` and the entry's position.
pub fn check_finite(context: &'static str, matrix: ArrayView2<'_, f64>) -> Result<(), MathError> {
    match matrix.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, col), &value)) => Err(MathError::NonFinite { context, row, col, value }),
        None => Ok(()),
    }
}

/// Validator run between pipeline stages.
#[derive(Debug, Clone)]
pub struct Validator {
    /// Relative symmetry tolerance, scaled by the largest entry.
    tolerance: f64,
    /// Whether to log a warning for panels with fewer periods than assets.
    warn_underdetermined: bool,
}

impl Validator {
    /// Create a validator.
    #[must_use]
    pub const fn new(tolerance: f64, warn_underdetermined: bool) -> Self {
        Self { tolerance, warn_underdetermined }
    }

    /// Get the relative symmetry tolerance.
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Whether under-determined panels are logged.
    #[must_use]
    pub const fn warns_underdetermined(&self) -> bool {
        self.warn_underdetermined
    }

    /// Whether a `periods x assets` panel gets the under-determined warning.
    #[must_use]
    pub const fn flags_underdetermined(&self, periods: usize, assets: usize) -> bool {
        self.warn_underdetermined && periods < assets
    }

    /// Check a return panel before the moment matrix is built.
    ///
    /// Fewer periods than assets is permitted but logged.
    ///
    /// # Errors
    /// Returns `MathError` if the panel is empty or holds a non-finite value.
    pub fn check_panel(&self, returns: ArrayView2<'_, f64>) -> Result<(), MathError> {
        let (periods, assets) = returns.dim();
        if periods == 0 || assets == 0 {
            return Err(MathError::EmptyPanel { periods, assets });
        }
        check_finite("panel", returns)?;

        if self.flags_underdetermined(periods, assets) {
            tracing::warn!(
                periods,
                assets,
                "fewer periods than assets, moment matrix is rank deficient"
            );
        }
        Ok(())
    }

    /// Check a moment matrix before it is decomposed.
    ///
    /// A negative diagonal entry means the matrix was built incorrectly and is
    /// reported as an invariant violation, never recovered from.
    ///
    /// # Errors
    /// Returns `MathError` if the matrix is not square, not finite, not
    /// symmetric, or has a negative diagonal entry.
    pub fn check_moment_matrix(&self, sigma: ArrayView2<'_, f64>) -> Result<(), MathError> {
        let (rows, cols) = sigma.dim();
        if rows != cols {
            return Err(MathError::NotSquare { rows, cols });
        }
        if rows == 0 {
            return Err(MathError::EmptyMatrix);
        }
        check_finite("moment matrix", sigma)?;

        let scale = sigma.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let threshold = if scale > 0.0 { self.tolerance * scale } else { self.tolerance };

        for i in 0..rows {
            let d = sigma[[i, i]];
            if d < 0.0 {
                return Err(MathError::InvariantViolation(format!(
                    "moment matrix diagonal entry {i} is negative ({d:e})"
                )));
            }
            for j in (i + 1)..cols {
                let gap = (sigma[[i, j]] - sigma[[j, i]]).abs();
                if gap > threshold {
                    return Err(MathError::InvariantViolation(format!(
                        "moment matrix not symmetric at ({i}, {j}): |diff| = {gap:e}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Check an eigendecomposition before factors are extracted.
    ///
    /// # Errors
    /// Returns `MathError` if shapes disagree, values are not finite,
    /// eigenvalues are not descending, or the eigenvectors are not orthonormal.
    pub fn check_decomposition(
        &self,
        eigenvalues: ArrayView1<'_, f64>,
        eigenvectors: ArrayView2<'_, f64>,
    ) -> Result<(), MathError> {
        let n = eigenvalues.len();
        let (rows, cols) = eigenvectors.dim();
        if rows != cols {
            return Err(MathError::NotSquare { rows, cols });
        }
        if cols != n {
            return Err(MathError::DimensionMismatch {
                context: "eigenvectors",
                expected: n,
                actual: cols,
            });
        }
        check_finite("eigenvectors", eigenvectors)?;

        if let Some(i) = eigenvalues.windows(2).into_iter().position(|w| w[0] < w[1]) {
            return Err(MathError::InvariantViolation(format!(
                "eigenvalues not descending at position {}",
                i + 1
            )));
        }

        let gram = eigenvectors.t().dot(&eigenvectors);
        let deviation = max_abs_diff(&gram, &Array2::eye(n));
        if deviation > ORTHONORMAL_TOL {
            return Err(MathError::InvariantViolation(format!(
                "eigenvectors not orthonormal: max |V'V - I| = {deviation:e}"
            )));
        }
        Ok(())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(1e-10, true)
    }
}

fn max_abs_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    a.iter().zip(b.iter()).fold(0.0_f64, |acc, (x, y)| acc.max((x - y).abs()))
}
