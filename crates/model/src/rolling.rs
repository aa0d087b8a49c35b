//! Rolling-window factor extraction.

use aptpca_math::MeanOuterProduct;
use aptpca_primitives::{CrossSectionalPanel, Date};
use aptpca_traits::ShrinkageTarget;
use ndarray::parallel::prelude::*;

use crate::{ExtractorConfig, FactorExtraction, FactorModel, ModelError};

/// Window layout for rolling extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingConfig {
    /// Rows per window.
    pub window: usize,
    /// Rows between consecutive window starts.
    pub step: usize,
}

impl Default for RollingConfig {
    fn default() -> Self {
        // One trading year, advanced monthly.
        Self { window: 252, step: 21 }
    }
}

/// Extraction over rows `start..end` of the source panel.
#[derive(Debug)]
pub struct WindowExtraction {
    /// First row of the window.
    pub start: usize,
    /// One past the last row of the window.
    pub end: usize,
    /// Date of the first row, if the panel is dated.
    pub start_date: Option<Date>,
    /// Date of the last row, if the panel is dated.
    pub end_date: Option<Date>,
    /// Outcome for this window.
    pub result: Result<FactorExtraction, ModelError>,
}

/// Runs one independent extraction per window of a panel.
///
/// Windows are processed in parallel and returned in window order.
#[derive(Debug, Clone)]
pub struct RollingExtractor<S = MeanOuterProduct> {
    config: RollingConfig,
    model: FactorModel<S>,
}

impl RollingExtractor {
    /// Create a rolling extractor with the default model.
    #[must_use]
    pub fn new(config: RollingConfig) -> Self {
        Self { config, model: FactorModel::new() }
    }

    /// Create a rolling extractor with a custom model configuration.
    #[must_use]
    pub fn with_config(config: RollingConfig, extractor: ExtractorConfig) -> Self {
        Self { config, model: FactorModel::with_config(extractor) }
    }
}

impl<S: ShrinkageTarget> RollingExtractor<S> {
    /// Create a rolling extractor around an existing model.
    #[must_use]
    pub const fn with_model(config: RollingConfig, model: FactorModel<S>) -> Self {
        Self { config, model }
    }

    /// Get the window layout.
    #[must_use]
    pub const fn config(&self) -> &RollingConfig {
        &self.config
    }

    /// Row ranges `(start, end)` of every window over `periods` rows.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` if the window or step is zero, or
    /// the window is longer than the panel.
    pub fn windows(&self, periods: usize) -> Result<Vec<(usize, usize)>, ModelError> {
        let RollingConfig { window, step } = self.config;
        if window == 0 || step == 0 {
            return Err(ModelError::InvalidConfig(format!(
                "window ({window}) and step ({step}) must be positive"
            )));
        }
        if window > periods {
            return Err(ModelError::InvalidConfig(format!(
                "window ({window}) longer than panel ({periods} periods)"
            )));
        }
        Ok((0..=periods - window).step_by(step).map(|start| (start, start + window)).collect())
    }

    /// Extract the top `k` factors in every window.
    ///
    /// A failing window carries its own error and does not stop the others.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` if the window layout does not fit
    /// the panel.
    pub fn extract(
        &self,
        panel: &CrossSectionalPanel,
        k: usize,
    ) -> Result<Vec<WindowExtraction>, ModelError> {
        let windows = self.windows(panel.n_periods())?;
        tracing::debug!(
            windows = windows.len(),
            window = self.config.window,
            step = self.config.step,
            "starting rolling extraction"
        );

        let dates = panel.dates();
        let results = windows
            .into_par_iter()
            .map(|(start, end)| {
                let result = panel
                    .slice_rows(start, end)
                    .ok_or_else(|| {
                        ModelError::InvalidConfig(format!("rows {start}..{end} out of range"))
                    })
                    .and_then(|slice| self.model.extract(&slice, k));
                WindowExtraction {
                    start,
                    end,
                    start_date: dates.map(|d| d[start]),
                    end_date: dates.map(|d| d[end - 1]),
                    result,
                }
            })
            .collect::<Vec<_>>();

        let failed = results.iter().filter(|w| w.result.is_err()).count();
        if failed > 0 {
            tracing::warn!(failed, total = results.len(), "some rolling windows failed");
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use aptpca_math::ErrorKind;
    use ndarray::Array2;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use rstest::rstest;

    use super::*;

    fn dated_panel(seed: u64, t: usize, n: usize) -> CrossSectionalPanel {
        let mut rng = StdRng::seed_from_u64(seed);
        let returns = Array2::from_shape_fn((t, n), |_| rng.gen_range(-0.05..0.05));
        let dates = Date::from_ymd_opt(2023, 1, 1).unwrap().iter_days().take(t).collect();
        CrossSectionalPanel::from_returns(returns).with_dates(dates).unwrap()
    }

    #[test]
    fn window_layout() {
        let rolling = RollingExtractor::new(RollingConfig { window: 4, step: 3 });
        assert_eq!(rolling.windows(10).unwrap(), vec![(0, 4), (3, 7), (6, 10)]);
        assert_eq!(rolling.windows(4).unwrap(), vec![(0, 4)]);
    }

    #[rstest]
    #[case(0, 1, 10)]
    #[case(5, 0, 10)]
    #[case(11, 1, 10)]
    fn invalid_layout(#[case] window: usize, #[case] step: usize, #[case] periods: usize) {
        let rolling = RollingExtractor::new(RollingConfig { window, step });
        let err = rolling.windows(periods).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfig(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn windows_match_direct_extraction_in_order() {
        let panel = dated_panel(5, 40, 4);
        let rolling = RollingExtractor::new(RollingConfig { window: 20, step: 5 });
        let results = rolling.extract(&panel, 2).unwrap();

        assert_eq!(results.len(), 5);
        let model = FactorModel::new();
        for (i, window) in results.iter().enumerate() {
            assert_eq!(window.start, i * 5);
            assert_eq!(window.end, i * 5 + 20);
            assert_eq!(window.start_date, panel.dates().map(|d| d[window.start]));
            assert_eq!(window.end_date, panel.dates().map(|d| d[window.end - 1]));

            let slice = panel.slice_rows(window.start, window.end).unwrap();
            let direct = model.extract(&slice, 2).unwrap();
            assert_eq!(window.result.as_ref().unwrap(), &direct);
        }
    }

    #[test]
    fn failing_window_is_isolated() {
        let mut returns = Array2::from_elem((6, 2), 0.01);
        returns[[0, 0]] = 0.02;
        returns[[1, 1]] = -0.03;
        // Last window is all zeros.
        returns.slice_mut(ndarray::s![3.., ..]).fill(0.0);
        let panel = CrossSectionalPanel::from_returns(returns);

        let rolling = RollingExtractor::new(RollingConfig { window: 3, step: 3 });
        let results = rolling.extract(&panel, 1).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].result.is_ok());
        let err = results[1].result.as_ref().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
        assert_eq!(results[1].start_date, None);
    }
}
