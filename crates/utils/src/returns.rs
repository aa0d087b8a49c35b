//! Close price to return conversion.

use ndarray::{Array2, ArrayView2, s};
use serde::{Deserialize, Serialize};

/// How to turn a close price series into returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReturnKind {
    /// Simple return `p_t / p_{t-1} - 1`.
    #[default]
    PctChange,
    /// Log return `ln(p_t / p_{t-1})`.
    LogDiff,
}

impl ReturnKind {
    /// Return between two consecutive prices.
    ///
    /// A missing (NaN) price on either side gives NaN.
    #[must_use]
    pub fn between(self, previous: f64, current: f64) -> f64 {
        let simple = current / previous - 1.0;
        match self {
            Self::PctChange => simple,
            Self::LogDiff => simple.ln_1p(),
        }
    }
}

/// Convert a T x N price table to (T-1) x N returns.
///
/// The first row has no predecessor and is dropped. Missing prices stay
/// missing in every return they touch.
#[must_use]
pub fn prices_to_returns(prices: ArrayView2<'_, f64>, kind: ReturnKind) -> Array2<f64> {
    let (periods, assets) = prices.dim();
    if periods < 2 {
        return Array2::zeros((0, assets));
    }
    let previous = prices.slice(s![..-1, ..]);
    let current = prices.slice(s![1.., ..]);
    let mut returns = Array2::zeros((periods - 1, assets));
    ndarray::Zip::from(&mut returns)
        .and(&previous)
        .and(&current)
        .for_each(|r, &p0, &p1| *r = kind.between(p0, p1));
    returns
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    use super::*;

    #[test]
    fn pct_change() {
        let prices = array![[100.0, 50.0], [110.0, 45.0], [99.0, 45.0]];
        let r = prices_to_returns(prices.view(), ReturnKind::PctChange);
        assert_eq!(r.dim(), (2, 2));
        assert_relative_eq!(r[[0, 0]], 0.1, epsilon = 1e-12);
        assert_relative_eq!(r[[0, 1]], -0.1, epsilon = 1e-12);
        assert_relative_eq!(r[[1, 0]], -0.1, epsilon = 1e-12);
        assert_eq!(r[[1, 1]], 0.0);
    }

    #[test]
    fn log_diff() {
        let prices = array![[100.0], [110.0], [99.0]];
        let r = prices_to_returns(prices.view(), ReturnKind::LogDiff);
        assert_relative_eq!(r[[0, 0]], 1.1_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(r[[1, 0]], 0.9_f64.ln(), epsilon = 1e-12);
    }

    #[rstest]
    #[case(ReturnKind::PctChange)]
    #[case(ReturnKind::LogDiff)]
    fn missing_price_propagates(#[case] kind: ReturnKind) {
        let prices = array![[100.0, 10.0], [f64::NAN, 11.0], [102.0, 12.0]];
        let r = prices_to_returns(prices.view(), kind);
        assert!(r[[0, 0]].is_nan());
        assert!(r[[1, 0]].is_nan());
        assert!(r.column(1).iter().all(|x| x.is_finite()));
    }

    #[test]
    fn short_history() {
        let prices = array![[100.0, 10.0]];
        assert_eq!(prices_to_returns(prices.view(), ReturnKind::PctChange).dim(), (0, 2));
    }
}
