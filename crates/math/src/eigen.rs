//! Symmetric eigendecomposition with deterministic ordering.

use std::cmp::Ordering;

use aptpca_primitives::FactorSet;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};

use crate::{MathError, validate::check_finite};

/// Coordinates at or below this magnitude are ignored when fixing signs.
const SIGN_TOL: f64 = 1e-12;

/// Configuration for the eigensolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenConfig {
    /// Relative tolerance. Scaled by `max |a_ij|` it gives the eigenvalue
    /// clamp and degeneracy threshold.
    pub tolerance: f64,
    /// Maximum number of Jacobi sweeps before giving up.
    pub max_sweeps: usize,
}

impl Default for EigenConfig {
    fn default() -> Self {
        Self { tolerance: 1e-10, max_sweeps: 100 }
    }
}

/// Eigenvalues and eigenvectors of a symmetric matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenDecomposition {
    /// Eigenvalues, descending, with negative noise clamped to zero.
    pub eigenvalues: Array1<f64>,
    /// Orthonormal eigenvectors as columns, sign-normalized.
    pub eigenvectors: Array2<f64>,
    /// Jacobi sweeps performed.
    pub sweeps: usize,
}

impl EigenDecomposition {
    /// Rebuild `V diag(lambda) V^T`.
    #[must_use]
    pub fn reconstruct(&self) -> Array2<f64> {
        let scaled = &self.eigenvectors * &self.eigenvalues.view().insert_axis(Axis(0));
        scaled.dot(&self.eigenvectors.t())
    }

    /// Convert into an ordered factor set over the full eigenbasis.
    #[must_use]
    pub fn into_factor_set(self) -> FactorSet {
        FactorSet::new(self.eigenvalues, self.eigenvectors)
    }
}

/// Cyclic Jacobi eigensolver for symmetric matrices.
///
/// Output is fully deterministic: eigenvalues are sorted descending, every
/// eigenvector has its first non-zero coordinate positive, and the basis of a
/// degenerate eigenspace is rebuilt from the coordinate axes and ordered
/// lexicographically.
#[derive(Debug, Clone, Default)]
pub struct Eigendecomposer {
    config: EigenConfig,
}

impl Eigendecomposer {
    /// Create a solver with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EigenConfig::default())
    }

    /// Create a solver with custom configuration.
    #[must_use]
    pub const fn with_config(config: EigenConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &EigenConfig {
        &self.config
    }

    /// Absolute tolerance for `matrix`: the relative tolerance times the
    /// largest entry magnitude, so that it scales with the input.
    ///
    /// Falls back to the relative tolerance itself for the zero matrix.
    #[must_use]
    pub fn effective_tolerance(&self, matrix: ArrayView2<'_, f64>) -> f64 {
        let scale = matrix.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if scale > 0.0 { self.config.tolerance * scale } else { self.config.tolerance }
    }

    /// Decompose a symmetric matrix.
    ///
    /// Only the upper triangle drives the rotations, but the matrix is
    /// expected to be symmetric.
    ///
    /// # Errors
    /// Returns `MathError::NotSquare` or `MathError::EmptyMatrix` for bad
    /// shapes, `MathError::NonFinite` for NaN/Inf entries, and
    /// `MathError::NumericalInstability` if Jacobi does not converge within
    /// `max_sweeps`.
    pub fn decompose(&self, matrix: ArrayView2<'_, f64>) -> Result<EigenDecomposition, MathError> {
        let (rows, cols) = matrix.dim();
        if rows != cols {
            return Err(MathError::NotSquare { rows, cols });
        }
        if rows == 0 {
            return Err(MathError::EmptyMatrix);
        }
        check_finite("symmetric matrix", matrix)?;

        let eps = self.effective_tolerance(matrix);
        let (raw_values, raw_vectors, sweeps) = jacobi(matrix, self.config.max_sweeps)?;

        let mut order: Vec<usize> = (0..rows).collect();
        order.sort_by(|&i, &j| raw_values[j].total_cmp(&raw_values[i]));

        let mut eigenvalues = Array1::zeros(rows);
        let mut eigenvectors = Array2::zeros((rows, rows));
        for (dst, &src) in order.iter().enumerate() {
            let mut value = raw_values[src];
            if value < 0.0 {
                if value < -eps {
                    tracing::warn!(value, tolerance = eps, "clamping negative eigenvalue to zero");
                }
                value = 0.0;
            }
            eigenvalues[dst] = value;
            eigenvectors.column_mut(dst).assign(&raw_vectors.column(src));
        }

        for (start, end) in degenerate_blocks(&eigenvalues, eps) {
            if end - start > 1 {
                let block = canonical_basis(eigenvectors.slice(s![.., start..end]))?;
                eigenvectors.slice_mut(s![.., start..end]).assign(&block);
            } else {
                let mut column = eigenvectors.column_mut(start);
                if leading_sign(column.view()) < 0.0 {
                    column.mapv_inplace(|x| -x);
                }
            }
        }

        tracing::debug!(order = rows, sweeps, tolerance = eps, "eigendecomposition converged");

        Ok(EigenDecomposition { eigenvalues, eigenvectors, sweeps })
    }
}

/// Run cyclic Jacobi. Returns unsorted eigenvalues, eigenvectors as columns,
/// and the number of sweeps.
fn jacobi(
    matrix: ArrayView2<'_, f64>,
    max_sweeps: usize,
) -> Result<(Array1<f64>, Array2<f64>, usize), MathError> {
    let n = matrix.nrows();
    let mut a = matrix.to_owned();
    let mut v = Array2::eye(n);
    let threshold = f64::EPSILON * frobenius(&a);

    let mut sweeps = 0;
    loop {
        let off = off_diagonal_norm(&a);
        if off <= threshold {
            break;
        }
        if sweeps == max_sweeps {
            return Err(MathError::NumericalInstability { sweeps, off_norm: off });
        }
        for p in 0..n {
            for q in (p + 1)..n {
                rotate(&mut a, &mut v, p, q, sweeps);
            }
        }
        sweeps += 1;
    }

    Ok((a.diag().to_owned(), v, sweeps))
}

/// Annihilate `a[p, q]` with a Jacobi rotation and accumulate it into `v`.
fn rotate(a: &mut Array2<f64>, v: &mut Array2<f64>, p: usize, q: usize, sweep: usize) {
    let apq = a[[p, q]];
    if apq == 0.0 {
        return;
    }
    let app = a[[p, p]];
    let aqq = a[[q, q]];

    // After a few sweeps, drop elements too small to move either diagonal entry.
    let g = 100.0 * apq.abs();
    if sweep > 3 && app.abs() + g == app.abs() && aqq.abs() + g == aqq.abs() {
        a[[p, q]] = 0.0;
        a[[q, p]] = 0.0;
        return;
    }

    let theta = (aqq - app) / (2.0 * apq);
    let t = theta.signum() / (theta.abs() + theta.hypot(1.0));
    let c = 1.0 / t.hypot(1.0);
    let s = t * c;

    a[[p, p]] = app - t * apq;
    a[[q, q]] = aqq + t * apq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    let n = a.nrows();
    for r in 0..n {
        if r == p || r == q {
            continue;
        }
        let arp = a[[r, p]];
        let arq = a[[r, q]];
        let new_rp = c * arp - s * arq;
        let new_rq = s * arp + c * arq;
        a[[r, p]] = new_rp;
        a[[p, r]] = new_rp;
        a[[r, q]] = new_rq;
        a[[q, r]] = new_rq;
    }

    for r in 0..n {
        let vrp = v[[r, p]];
        let vrq = v[[r, q]];
        v[[r, p]] = c * vrp - s * vrq;
        v[[r, q]] = s * vrp + c * vrq;
    }
}

fn frobenius(a: &Array2<f64>) -> f64 {
    a.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn off_diagonal_norm(a: &Array2<f64>) -> f64 {
    a.indexed_iter().filter(|((i, j), _)| i != j).map(|(_, x)| x * x).sum::<f64>().sqrt()
}

/// Half-open ranges of consecutive eigenvalues whose neighbours differ by
/// less than `eps`.
fn degenerate_blocks(eigenvalues: &Array1<f64>, eps: f64) -> Vec<(usize, usize)> {
    let n = eigenvalues.len();
    let mut blocks = Vec::new();
    let mut start = 0;
    for i in 1..=n {
        if i == n || eigenvalues[i - 1] - eigenvalues[i] >= eps {
            blocks.push((start, i));
            start = i;
        }
    }
    blocks
}

/// Sign of the first coordinate larger than `SIGN_TOL` in magnitude.
fn leading_sign(v: ArrayView1<'_, f64>) -> f64 {
    v.iter().find(|x| x.abs() > SIGN_TOL).map_or(1.0, |x| x.signum())
}

/// Rebuild an orthonormal basis of the span of `block`'s columns that depends
/// only on the span.
///
/// Each step projects every coordinate axis onto the span, removes the
/// components along the vectors already chosen, and keeps the axis with the
/// largest residual (lowest index on ties). The chosen vectors are then
/// sign-normalized and sorted in descending lexicographic order.
fn canonical_basis(block: ArrayView2<'_, f64>) -> Result<Array2<f64>, MathError> {
    let (n, m) = block.dim();

    // Column j of the projector B B^T is B times row j of B.
    let mut residuals: Vec<Array1<f64>> = (0..n).map(|j| block.dot(&block.row(j))).collect();
    let mut basis: Vec<Array1<f64>> = Vec::with_capacity(m);

    for _ in 0..m {
        let mut best = 0;
        let mut best_norm = 0.0;
        for (j, r) in residuals.iter().enumerate() {
            let norm = r.dot(r).sqrt();
            if norm > best_norm {
                best = j;
                best_norm = norm;
            }
        }
        if best_norm <= SIGN_TOL {
            return Err(MathError::InvariantViolation(format!(
                "degenerate eigenspace of dimension {m} collapsed after {} vectors",
                basis.len()
            )));
        }

        let mut chosen = &residuals[best] / best_norm;
        if leading_sign(chosen.view()) < 0.0 {
            chosen.mapv_inplace(|x| -x);
        }
        for r in &mut residuals {
            let d = r.dot(&chosen);
            r.scaled_add(-d, &chosen);
        }
        basis.push(chosen);
    }

    basis.sort_by(|a, b| lexicographic(b, a));

    let mut out = Array2::zeros((n, m));
    for (k, vector) in basis.iter().enumerate() {
        out.column_mut(k).assign(vector);
    }
    Ok(out)
}

fn lexicographic(a: &Array1<f64>, b: &Array1<f64>) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use rstest::rstest;

    use super::*;
    use crate::ErrorKind;

    fn random_symmetric(seed: u64, n: usize) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let x = Array2::from_shape_fn((2 * n, n), |_| rng.gen_range(-1.0..1.0));
        x.t().dot(&x)
    }

    fn assert_matrix_close(a: &Array2<f64>, b: &Array2<f64>, eps: f64) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = eps);
        }
    }

    #[test]
    fn diagonal_matrix() {
        let m = array![[1.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 2.0]];
        let d = Eigendecomposer::new().decompose(m.view()).unwrap();
        assert_eq!(d.eigenvalues, array![3.0, 2.0, 1.0]);
        assert_eq!(d.eigenvectors.column(0), array![0.0, 1.0, 0.0].view());
        assert_eq!(d.eigenvectors.column(1), array![0.0, 0.0, 1.0].view());
        assert_eq!(d.eigenvectors.column(2), array![1.0, 0.0, 0.0].view());
        assert_eq!(d.sweeps, 0);
    }

    #[test]
    fn two_by_two_closed_form() {
        let (a, b, d) = (4.0, 1.5, 1.0);
        let m = array![[a, b], [b, d]];
        let dec = Eigendecomposer::new().decompose(m.view()).unwrap();

        let mid = (a + d) / 2.0;
        let radius = (((a - d) / 2.0_f64).powi(2) + b * b).sqrt();
        assert_abs_diff_eq!(dec.eigenvalues[0], mid + radius, epsilon = 1e-12);
        assert_abs_diff_eq!(dec.eigenvalues[1], mid - radius, epsilon = 1e-12);

        // Eigenvector for lambda is proportional to (b, lambda - a).
        let l1 = mid + radius;
        let norm = (b * b + (l1 - a) * (l1 - a)).sqrt();
        assert_abs_diff_eq!(dec.eigenvectors[[0, 0]], b / norm, epsilon = 1e-12);
        assert_abs_diff_eq!(dec.eigenvectors[[1, 0]], (l1 - a) / norm, epsilon = 1e-12);
        // Second vector is orthogonal with a positive leading coordinate.
        assert_abs_diff_eq!(dec.eigenvectors[[0, 1]], (l1 - a).abs() / norm, epsilon = 1e-12);
        assert_abs_diff_eq!(dec.eigenvectors[[1, 1]], -b / norm, epsilon = 1e-12);
    }

    #[rstest]
    #[case(1, 2)]
    #[case(2, 5)]
    #[case(3, 12)]
    #[case(4, 30)]
    fn reconstruction_and_trace(#[case] seed: u64, #[case] n: usize) {
        let m = random_symmetric(seed, n);
        let dec = Eigendecomposer::new().decompose(m.view()).unwrap();

        let scale = m.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        assert_matrix_close(&dec.reconstruct(), &m, 1e-10 * scale);
        assert_abs_diff_eq!(dec.eigenvalues.sum(), m.diag().sum(), epsilon = 1e-10 * scale);

        let gram = dec.eigenvectors.t().dot(&dec.eigenvectors);
        assert_matrix_close(&gram, &Array2::eye(n), 1e-10);

        for w in dec.eigenvalues.windows(2) {
            assert!(w[0] >= w[1]);
        }
        assert!(dec.eigenvalues.iter().all(|&l| l >= 0.0));
    }

    #[test]
    fn eigenvectors_are_sign_normalized() {
        let m = random_symmetric(11, 8);
        let dec = Eigendecomposer::new().decompose(m.view()).unwrap();
        for column in dec.eigenvectors.columns() {
            let first = column.iter().find(|x| x.abs() > SIGN_TOL).unwrap();
            assert!(*first > 0.0);
        }
    }

    #[test]
    fn identity_yields_coordinate_axes() {
        let m = Array2::<f64>::eye(4);
        let dec = Eigendecomposer::new().decompose(m.view()).unwrap();
        assert_eq!(dec.eigenvalues, Array1::from_elem(4, 1.0));
        assert_eq!(dec.eigenvectors, Array2::eye(4));
    }

    #[test]
    fn degenerate_eigenspace_has_canonical_basis() {
        // Eigenvalue 1 on span{u, e1} with u = (cos a, 0, sin a); eigenvalue 2 on w.
        let angle = 0.3_f64;
        let (c, s) = (angle.cos(), angle.sin());
        let u = array![c, 0.0, s];
        let e1 = array![0.0, 1.0, 0.0];
        let w = array![-s, 0.0, c];
        let outer = |x: &Array1<f64>| {
            x.view().insert_axis(Axis(1)).dot(&x.view().insert_axis(Axis(0)))
        };
        let m = outer(&u) + outer(&e1) + outer(&w) * 2.0;

        let dec = Eigendecomposer::new().decompose(m.view()).unwrap();
        assert_abs_diff_eq!(dec.eigenvalues[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dec.eigenvalues[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dec.eigenvalues[2], 1.0, epsilon = 1e-12);

        // w has a negative leading coordinate, so it is flipped.
        for (x, y) in dec.eigenvectors.column(0).iter().zip((-&w).iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-10);
        }
        // Lexicographic order puts u (leading cos a) before e1 (leading 0).
        for (x, y) in dec.eigenvectors.column(1).iter().zip(u.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-10);
        }
        for (x, y) in dec.eigenvectors.column(2).iter().zip(e1.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-10);
        }
    }

    #[test]
    fn decomposition_is_deterministic() {
        let m = random_symmetric(5, 10);
        let solver = Eigendecomposer::new();
        let first = solver.decompose(m.view()).unwrap();
        let second = solver.decompose(m.view()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_element() {
        let m = array![[2.5e-4]];
        let dec = Eigendecomposer::new().decompose(m.view()).unwrap();
        assert_eq!(dec.eigenvalues, array![2.5e-4]);
        assert_eq!(dec.eigenvectors, array![[1.0]]);
    }

    #[rstest]
    #[case(-1e-14)]
    #[case(-1e-6)]
    #[case(-0.5)]
    fn negative_eigenvalue_is_clamped(#[case] negative: f64) {
        // Both inside and well below -eps: clamped either way, never an error.
        let m = array![[negative, 0.0], [0.0, 1.0]];
        let dec = Eigendecomposer::new().decompose(m.view()).unwrap();
        assert_eq!(dec.eigenvalues, array![1.0, 0.0]);
        assert_eq!(dec.eigenvectors.column(0), array![0.0, 1.0].view());
        assert_eq!(dec.eigenvectors.column(1), array![1.0, 0.0].view());
    }

    #[test]
    fn tolerance_scales_with_matrix() {
        let solver = Eigendecomposer::new();
        let m = array![[2e-12, 0.0], [0.0, 1e-12]];
        assert_abs_diff_eq!(solver.effective_tolerance(m.view()), 2e-22, epsilon = 1e-35);
        let zero = Array2::<f64>::zeros((2, 2));
        assert_eq!(solver.effective_tolerance(zero.view()), 1e-10);
    }

    #[rstest]
    #[case(1e-4)]
    #[case(1e-8)]
    #[case(1e-12)]
    fn eigenvectors_invariant_to_scale(#[case] factor: f64) {
        let m = random_symmetric(17, 6);
        let solver = Eigendecomposer::new();
        let reference = solver.decompose(m.view()).unwrap();
        let scaled = solver.decompose((&m * factor).view()).unwrap();

        assert_matrix_close(&scaled.eigenvectors, &reference.eigenvectors, 1e-9);
        for (a, b) in scaled.eigenvalues.iter().zip(reference.eigenvalues.iter()) {
            assert_abs_diff_eq!(a / factor, b, epsilon = 1e-9 * reference.eigenvalues[0]);
        }
        let scale = m.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())) * factor;
        assert_matrix_close(&scaled.reconstruct(), &(&m * factor), 1e-10 * scale);
    }

    #[test]
    fn non_convergence_is_reported() {
        let m = random_symmetric(9, 6);
        let solver = Eigendecomposer::with_config(EigenConfig { tolerance: 1e-10, max_sweeps: 0 });
        let err = solver.decompose(m.view()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NumericalInstability);
    }

    #[test]
    fn shape_errors() {
        let solver = Eigendecomposer::new();
        let rect = Array2::<f64>::zeros((2, 3));
        assert_eq!(solver.decompose(rect.view()).unwrap_err(), MathError::NotSquare {
            rows: 2,
            cols: 3
        });
        let empty = Array2::<f64>::zeros((0, 0));
        assert_eq!(solver.decompose(empty.view()).unwrap_err(), MathError::EmptyMatrix);
        let nan = array![[f64::NAN]];
        assert_eq!(solver.decompose(nan.view()).unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn degenerate_blocks_chain() {
        let values = array![3.0, 2.0, 2.0 - 1e-12, 1.0];
        assert_eq!(degenerate_blocks(&values, 1e-10), vec![(0, 1), (1, 3), (3, 4)]);
    }
}
