//! Top-K factor extraction from an eigenbasis.

use aptpca_math::MathError;
use aptpca_primitives::{CrossSectionalPanel, FactorName, FactorSeries, FactorSet, Symbol};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Result of one factor extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorExtraction {
    symbols: Vec<Symbol>,
    eigenvalues: Array1<f64>,
    factors: FactorSet,
    series: FactorSeries,
    variance_explained: Array1<f64>,
}

impl FactorExtraction {
    /// Asset symbols the loadings refer to, in row order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Number of extracted factors (K).
    #[must_use]
    pub fn n_factors(&self) -> usize {
        self.factors.len()
    }

    /// All N eigenvalues, descending.
    #[must_use]
    pub const fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// Top-K eigenvalue/loading pairs.
    #[must_use]
    pub const fn factors(&self) -> &FactorSet {
        &self.factors
    }

    /// Factor realizations (T x K).
    #[must_use]
    pub const fn series(&self) -> &FactorSeries {
        &self.series
    }

    /// Share of total variance for each of the N factors.
    #[must_use]
    pub const fn variance_explained(&self) -> &Array1<f64> {
        &self.variance_explained
    }

    /// Running sum of the variance-explained ratios.
    #[must_use]
    pub fn cumulative_variance_explained(&self) -> Array1<f64> {
        let mut total = 0.0;
        self.variance_explained.mapv(|r| {
            total += r;
            total
        })
    }

    /// Smallest number of factors whose cumulative share reaches `threshold`.
    ///
    /// Returns `None` if `threshold` is outside `(0, 1]`.
    #[must_use]
    pub fn factors_for_variance(&self, threshold: f64) -> Option<usize> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return None;
        }
        let cumulative = self.cumulative_variance_explained();
        let n = cumulative.len();
        // Rounding can leave the final cumulative share a hair under 1.
        Some(cumulative.iter().position(|&c| c >= threshold - 1e-12).map_or(n, |i| i + 1))
    }

    /// Serializable snapshot of the extraction.
    #[must_use]
    pub fn summary(&self) -> ExtractionSummary {
        let factors = self
            .factors
            .iter()
            .enumerate()
            .map(|(i, (eigenvalue, loading))| FactorSummary {
                name: FactorName::principal(i),
                eigenvalue,
                variance_explained: self.variance_explained[i],
                loadings: loading.to_vec(),
            })
            .collect();

        ExtractionSummary {
            symbols: self.symbols.clone(),
            n_periods: self.series.n_periods(),
            eigenvalues: self.eigenvalues.to_vec(),
            variance_explained: self.variance_explained.to_vec(),
            factors,
        }
    }

    /// Print a concise summary of the extraction.
    pub fn print_summary(&self) {
        println!(
            "\n================================================================================"
        );
        println!(
            "APT FACTOR EXTRACTION: {} assets, {} periods",
            self.symbols.len(),
            self.series.n_periods()
        );
        println!(
            "================================================================================"
        );
        println!("{:<8} {:>14} {:>12} {:>12}", "Factor", "Eigenvalue", "Explained", "Cumulative");
        println!("{:-<8} {:-^14} {:-^12} {:-^12}", "", "", "", "");

        let cumulative = self.cumulative_variance_explained();
        for (i, (eigenvalue, _)) in self.factors.iter().enumerate() {
            println!(
                "{:<8} {:>14.6e} {:>11.2}% {:>11.2}%",
                FactorName::principal(i).as_str(),
                eigenvalue,
                self.variance_explained[i] * 100.0,
                cumulative[i] * 100.0
            );
        }

        println!("\nTOP LOADINGS:");
        for (i, (_, loading)) in self.factors.iter().enumerate() {
            let mut ranked: Vec<(usize, f64)> = loading.iter().copied().enumerate().collect();
            ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
            let top: Vec<String> = ranked
                .iter()
                .take(5)
                .map(|&(j, w)| format!("{} {:+.3}", self.symbols[j], w))
                .collect();
            println!("{:<8} {}", FactorName::principal(i).as_str(), top.join(", "));
        }
    }
}

/// One factor in an [`ExtractionSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSummary {
    /// Factor name (`PC1`, `PC2`, ...).
    pub name: FactorName,
    /// Eigenvalue.
    pub eigenvalue: f64,
    /// Share of total variance.
    pub variance_explained: f64,
    /// Loading per asset, in symbol order.
    pub loadings: Vec<f64>,
}

/// Serializable view of a [`FactorExtraction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    /// Asset symbols.
    pub symbols: Vec<Symbol>,
    /// Number of periods in the panel.
    pub n_periods: usize,
    /// All eigenvalues, descending.
    pub eigenvalues: Vec<f64>,
    /// Variance-explained ratio for every eigenvalue.
    pub variance_explained: Vec<f64>,
    /// Extracted factors.
    pub factors: Vec<FactorSummary>,
}

/// Selects the leading factors of an eigenbasis and projects the panel on them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactorExtractor;

impl FactorExtractor {
    /// Create a new extractor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Extract the top `k` factors.
    ///
    /// # Arguments
    /// * `factor_set` - Full eigenbasis, eigenvalues descending
    /// * `panel` - Return panel the eigenbasis was built from
    /// * `k` - Number of factors to keep
    ///
    /// # Errors
    /// Returns `ModelError::InvalidK` if `k` is zero or exceeds the number of
    /// factors, a dimension error if the panel does not match the loadings,
    /// and a degenerate-input error if the eigenvalues sum to zero.
    pub fn extract(
        &self,
        factor_set: &FactorSet,
        panel: &CrossSectionalPanel,
        k: usize,
    ) -> Result<FactorExtraction, ModelError> {
        let n = factor_set.len();
        if k == 0 || k > n {
            return Err(ModelError::InvalidK { k, n });
        }
        if panel.n_assets() != factor_set.n_assets() {
            return Err(MathError::DimensionMismatch {
                context: "panel columns",
                expected: factor_set.n_assets(),
                actual: panel.n_assets(),
            }
            .into());
        }

        let eigenvalues = factor_set.eigenvalues().clone();
        let total = eigenvalues.sum();
        if !(total > 0.0) {
            return Err(MathError::DegenerateInput(format!(
                "eigenvalues sum to {total:e}, no variance to explain"
            ))
            .into());
        }
        let variance_explained = &eigenvalues / total;

        let factors = factor_set.truncate(k);
        let values = panel.returns().dot(factors.loadings());
        let series = FactorSeries::new(panel.dates().map(<[_]>::to_vec), values);

        Ok(FactorExtraction {
            symbols: panel.symbols().to_vec(),
            eigenvalues,
            factors,
            series,
            variance_explained,
        })
    }
}
