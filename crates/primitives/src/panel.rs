//! Cross-sectional return panel.

use std::collections::HashSet;

use ndarray::{Array2, ArrayView2, s};

use crate::{Date, Symbol, anonymous_symbols};

/// Errors raised while assembling a panel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    /// Number of symbols does not match the number of columns.
    #[error("symbol count mismatch: panel has {expected} columns, got {actual} symbols")]
    SymbolCount {
        /// Number of columns in the return matrix.
        expected: usize,
        /// Number of symbols supplied.
        actual: usize,
    },

    /// Number of dates does not match the number of rows.
    #[error("date count mismatch: panel has {expected} rows, got {actual} dates")]
    DateCount {
        /// Number of rows in the return matrix.
        expected: usize,
        /// Number of dates supplied.
        actual: usize,
    },

    /// The same symbol labels two columns.
    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(Symbol),

    /// Dates are not strictly increasing.
    #[error("dates not strictly increasing at row {0}")]
    UnorderedDates(usize),
}

/// A T x N matrix of per-period asset returns.
///
/// Rows are time periods in chronological order, columns are assets. The panel is
/// immutable once built. Finiteness and non-emptiness are checked by the validator
/// at the extraction boundary, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSectionalPanel {
    symbols: Vec<Symbol>,
    dates: Option<Vec<Date>>,
    returns: Array2<f64>,
}

impl CrossSectionalPanel {
    /// Create a panel from labelled columns.
    ///
    /// # Errors
    /// Returns `PanelError` if the symbol count does not match the column count
    /// or a symbol is repeated.
    pub fn new(symbols: Vec<Symbol>, returns: Array2<f64>) -> Result<Self, PanelError> {
        if symbols.len() != returns.ncols() {
            return Err(PanelError::SymbolCount {
                expected: returns.ncols(),
                actual: symbols.len(),
            });
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        for symbol in &symbols {
            if !seen.insert(symbol) {
                return Err(PanelError::DuplicateSymbol(symbol.clone()));
            }
        }

        Ok(Self { symbols, dates: None, returns })
    }

    /// Create a panel with anonymous symbols `A0..A{N-1}`.
    #[must_use]
    pub fn from_returns(returns: Array2<f64>) -> Self {
        let symbols = anonymous_symbols(returns.ncols());
        Self { symbols, dates: None, returns }
    }

    /// Attach one date per row.
    ///
    /// # Errors
    /// Returns `PanelError` if the date count does not match the row count or the
    /// dates are not strictly increasing.
    pub fn with_dates(mut self, dates: Vec<Date>) -> Result<Self, PanelError> {
        if dates.len() != self.returns.nrows() {
            return Err(PanelError::DateCount { expected: self.returns.nrows(), actual: dates.len() });
        }
        if let Some(i) = dates.windows(2).position(|w| w[0] >= w[1]) {
            return Err(PanelError::UnorderedDates(i + 1));
        }
        self.dates = Some(dates);
        Ok(self)
    }

    /// Number of time periods (T).
    #[must_use]
    pub fn n_periods(&self) -> usize {
        self.returns.nrows()
    }

    /// Number of assets (N).
    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.returns.ncols()
    }

    /// Check if the panel has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Asset symbols in column order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Row dates, if the panel carries them.
    #[must_use]
    pub fn dates(&self) -> Option<&[Date]> {
        self.dates.as_deref()
    }

    /// The return matrix.
    #[must_use]
    pub const fn returns(&self) -> &Array2<f64> {
        &self.returns
    }

    /// Borrowed view of the return matrix.
    #[must_use]
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.returns.view()
    }

    /// Copy rows `start..end` into a new panel with the same symbols.
    ///
    /// Returns `None` if `start > end` or `end` exceeds the number of periods.
    #[must_use]
    pub fn slice_rows(&self, start: usize, end: usize) -> Option<Self> {
        if start > end || end > self.n_periods() {
            return None;
        }
        Some(Self {
            symbols: self.symbols.clone(),
            dates: self.dates.as_ref().map(|d| d[start..end].to_vec()),
            returns: self.returns.slice(s![start..end, ..]).to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn date(d: u32) -> Date {
        Date::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn panel_dimensions() {
        let panel = CrossSectionalPanel::from_returns(array![[0.01, 0.02], [0.0, -0.01], [0.03, 0.0]]);
        assert_eq!(panel.n_periods(), 3);
        assert_eq!(panel.n_assets(), 2);
        assert_eq!(panel.symbols()[1].as_str(), "A1");
        assert!(panel.dates().is_none());
    }

    #[test]
    fn symbol_count_mismatch() {
        let err = CrossSectionalPanel::new(vec!["AAPL".into()], array![[0.01, 0.02]]).unwrap_err();
        assert_eq!(err, PanelError::SymbolCount { expected: 2, actual: 1 });
    }

    #[test]
    fn duplicate_symbol_rejected() {
        let err = CrossSectionalPanel::new(vec!["AAPL".into(), "AAPL".into()], array![[0.01, 0.02]])
            .unwrap_err();
        assert_eq!(err, PanelError::DuplicateSymbol(Symbol::new("AAPL")));
    }

    #[test]
    fn dates_must_increase() {
        let panel = CrossSectionalPanel::from_returns(array![[0.01], [0.02], [0.03]]);
        let err = panel.clone().with_dates(vec![date(2), date(3), date(3)]).unwrap_err();
        assert_eq!(err, PanelError::UnorderedDates(2));

        let err = panel.clone().with_dates(vec![date(2)]).unwrap_err();
        assert_eq!(err, PanelError::DateCount { expected: 3, actual: 1 });

        let panel = panel.with_dates(vec![date(2), date(3), date(4)]).unwrap();
        assert_eq!(panel.dates().unwrap()[0], date(2));
    }

    #[test]
    fn slice_rows_keeps_dates_aligned() {
        let panel = CrossSectionalPanel::from_returns(array![[0.01], [0.02], [0.03]])
            .with_dates(vec![date(2), date(3), date(4)])
            .unwrap();
        let window = panel.slice_rows(1, 3).unwrap();
        assert_eq!(window.n_periods(), 2);
        assert_eq!(window.returns()[[0, 0]], 0.02);
        assert_eq!(window.dates().unwrap(), &[date(3), date(4)]);
    }

    #[test]
    fn slice_rows_out_of_range() {
        let panel = CrossSectionalPanel::from_returns(array![[0.01], [0.02], [0.03]]);
        assert!(panel.slice_rows(1, 4).is_none());
        assert!(panel.slice_rows(2, 1).is_none());
        assert_eq!(panel.slice_rows(3, 3).map(|p| p.n_periods()), Some(0));
    }
}
