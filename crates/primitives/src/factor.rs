//! Factor-related type definitions.

use ndarray::{Array1, Array2, ArrayView1, Axis, s};
use serde::{Deserialize, Serialize};

use crate::Date;

/// Name of a statistical factor, e.g. `PC1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactorName(pub String);

impl FactorName {
    /// Name of the principal factor at zero-based position `index`.
    #[must_use]
    pub fn principal(index: usize) -> Self {
        Self(format!("PC{}", index + 1))
    }

    /// Get the factor name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Eigenvalue/loading pairs ordered by eigenvalue, largest first.
///
/// Column `i` of `loadings` is the unit-norm, sign-normalized loading vector
/// paired with `eigenvalues[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorSet {
    eigenvalues: Array1<f64>,
    loadings: Array2<f64>,
}

impl FactorSet {
    /// Create a factor set from eigenvalues and loading columns.
    ///
    /// The caller is responsible for ordering; debug builds assert the
    /// shapes agree.
    #[must_use]
    pub fn new(eigenvalues: Array1<f64>, loadings: Array2<f64>) -> Self {
        debug_assert_eq!(eigenvalues.len(), loadings.ncols());
        Self { eigenvalues, loadings }
    }

    /// Number of factors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// Number of assets each loading vector spans.
    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.loadings.nrows()
    }

    /// Eigenvalues, descending.
    #[must_use]
    pub const fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// Loading matrix (N x K), one column per factor.
    #[must_use]
    pub const fn loadings(&self) -> &Array2<f64> {
        &self.loadings
    }

    /// Loading vector of factor `i`.
    #[must_use]
    pub fn loading(&self, i: usize) -> Option<ArrayView1<'_, f64>> {
        (i < self.len()).then(|| self.loadings.column(i))
    }

    /// Iterate over `(eigenvalue, loading)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, ArrayView1<'_, f64>)> {
        self.eigenvalues.iter().copied().zip(self.loadings.axis_iter(Axis(1)))
    }

    /// Keep the first `k` factors.
    #[must_use]
    pub fn truncate(&self, k: usize) -> Self {
        let k = k.min(self.len());
        Self {
            eigenvalues: self.eigenvalues.slice(s![..k]).to_owned(),
            loadings: self.loadings.slice(s![.., ..k]).to_owned(),
        }
    }
}

/// Factor realizations over time (T x K).
#[derive(Debug, Clone, PartialEq)]
pub struct FactorSeries {
    dates: Option<Vec<Date>>,
    values: Array2<f64>,
}

impl FactorSeries {
    /// Create a factor series.
    #[must_use]
    pub fn new(dates: Option<Vec<Date>>, values: Array2<f64>) -> Self {
        debug_assert!(dates.as_ref().is_none_or(|d| d.len() == values.nrows()));
        Self { dates, values }
    }

    /// Number of periods.
    #[must_use]
    pub fn n_periods(&self) -> usize {
        self.values.nrows()
    }

    /// Number of factors.
    #[must_use]
    pub fn n_factors(&self) -> usize {
        self.values.ncols()
    }

    /// Row dates, if known.
    #[must_use]
    pub fn dates(&self) -> Option<&[Date]> {
        self.dates.as_deref()
    }

    /// Factor realizations, one column per factor.
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Time series of factor `i`.
    #[must_use]
    pub fn factor(&self, i: usize) -> Option<ArrayView1<'_, f64>> {
        (i < self.n_factors()).then(|| self.values.column(i))
    }
}
