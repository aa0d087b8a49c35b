//! End-to-end factor extraction pipeline.

use aptpca_math::{
    EigenConfig, Eigendecomposer, MeanOuterProduct, MomentMatrix, MomentMatrixBuilder, Validator,
};
use aptpca_primitives::{CrossSectionalPanel, Date, ShrinkageWeight};
use aptpca_traits::{DataProvider, ShrinkageTarget};

use crate::{FactorExtraction, FactorExtractor, ModelError};

/// Configuration for factor extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractorConfig {
    /// Weight on the mean-return adjustment of the moment matrix.
    pub shrinkage_weight: f64,
    /// Eigensolver settings.
    pub eigen: EigenConfig,
    /// Log a warning when the panel has fewer periods than assets.
    pub warn_underdetermined: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            shrinkage_weight: ShrinkageWeight::DEFAULT.value(),
            eigen: EigenConfig::default(),
            warn_underdetermined: true,
        }
    }
}

/// APT factor model.
///
/// Builds the shrinkage-adjusted moment matrix of a return panel,
/// decomposes it, and keeps the leading `k` factors. Each call is
/// independent: the model holds configuration only.
#[derive(Debug, Clone)]
pub struct FactorModel<S = MeanOuterProduct> {
    config: ExtractorConfig,
    builder: MomentMatrixBuilder<S>,
    solver: Eigendecomposer,
    validator: Validator,
    extractor: FactorExtractor,
}

impl FactorModel {
    /// Create a model with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ExtractorConfig::default())
    }

    /// Create a model with custom configuration.
    #[must_use]
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self::with_target(config, MeanOuterProduct)
    }
}

impl Default for FactorModel {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ShrinkageTarget> FactorModel<S> {
    /// Create a model with a custom shrinkage target.
    #[must_use]
    pub fn with_target(config: ExtractorConfig, target: S) -> Self {
        Self {
            builder: MomentMatrixBuilder::with_target(target),
            solver: Eigendecomposer::with_config(config.eigen),
            validator: Validator::new(config.eigen.tolerance, config.warn_underdetermined),
            extractor: FactorExtractor::new(),
            config,
        }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Get the stage validator built from the configuration.
    #[must_use]
    pub const fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Extract the top `k` factors with the configured shrinkage weight.
    ///
    /// # Errors
    /// Returns `ModelError` if the panel is empty or non-finite, `k` is out of
    /// range, the input carries no variance, or the eigensolver fails.
    pub fn extract(
        &self,
        panel: &CrossSectionalPanel,
        k: usize,
    ) -> Result<FactorExtraction, ModelError> {
        self.extract_with_weight(panel, self.config.shrinkage_weight, k)
    }

    /// Extract the top `k` factors with an explicit shrinkage weight.
    ///
    /// # Errors
    /// As [`FactorModel::extract`], plus `ModelError::InvalidShrinkageWeight`
    /// for a negative or non-finite weight.
    pub fn extract_with_weight(
        &self,
        panel: &CrossSectionalPanel,
        shrinkage_weight: f64,
        k: usize,
    ) -> Result<FactorExtraction, ModelError> {
        let weight = ShrinkageWeight::new(shrinkage_weight)
            .ok_or(ModelError::InvalidShrinkageWeight(shrinkage_weight))?;

        self.validator.check_panel(panel.view())?;
        let n = panel.n_assets();
        if k == 0 || k > n {
            return Err(ModelError::InvalidK { k, n });
        }

        let sigma = self.builder.build(panel.view(), weight)?;
        self.validator.check_moment_matrix(sigma.view())?;

        let decomposition = self.solver.decompose(sigma.view())?;
        self.validator
            .check_decomposition(decomposition.eigenvalues.view(), decomposition.eigenvectors.view())?;

        let result = self.extractor.extract(&decomposition.into_factor_set(), panel, k)?;

        tracing::debug!(
            periods = panel.n_periods(),
            assets = n,
            k,
            weight = weight.value(),
            explained = result.cumulative_variance_explained()[k - 1],
            "extracted factors"
        );

        Ok(result)
    }

    /// Build the moment matrix alone, with the configured weight.
    ///
    /// # Errors
    /// Returns `ModelError` if the weight or the panel is invalid.
    pub fn moment_matrix(&self, panel: &CrossSectionalPanel) -> Result<MomentMatrix, ModelError> {
        let weight = ShrinkageWeight::new(self.config.shrinkage_weight)
            .ok_or(ModelError::InvalidShrinkageWeight(self.config.shrinkage_weight))?;
        self.validator.check_panel(panel.view())?;
        Ok(self.builder.build(panel.view(), weight)?)
    }

    /// Fetch a panel for `[start, end]` and extract the top `k` factors.
    ///
    /// # Errors
    /// Returns `ModelError::Provider` if the provider fails, otherwise as
    /// [`FactorModel::extract`].
    pub fn extract_from_provider<P: DataProvider + ?Sized>(
        &self,
        provider: &P,
        start: Date,
        end: Date,
        k: usize,
    ) -> Result<FactorExtraction, ModelError> {
        let panel = provider.get_cross_sectional_data(start, end)?;
        tracing::debug!(
            provider = provider.name(),
            %start,
            %end,
            periods = panel.n_periods(),
            assets = panel.n_assets(),
            "fetched panel"
        );
        self.extract(&panel, k)
    }
}

/// Extract the top `k` APT factors from a return panel.
///
/// # Arguments
/// * `panel` - Return panel (T x N), no missing values
/// * `shrinkage_weight` - Weight on the mean outer product, non-negative
/// * `k` - Number of factors, `1..=N`
///
/// # Errors
/// Returns `ModelError` on invalid input or numerical failure.
pub fn extract_factors(
    panel: &CrossSectionalPanel,
    shrinkage_weight: f64,
    k: usize,
) -> Result<FactorExtraction, ModelError> {
    FactorModel::new().extract_with_weight(panel, shrinkage_weight, k)
}
