//! Panel providers over wide date-by-asset tables.

use std::path::Path;

use aptpca_primitives::{CrossSectionalPanel, Date, Symbol};
use aptpca_traits::{DataProvider, ProviderError};
use ndarray::{Array2, Axis, s};
use polars::prelude::*;

use crate::{ReturnKind, prices_to_returns};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Options for reading a wide table into panels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOptions {
    /// Name of the date column. Every other column is one asset.
    pub date_column: String,
    /// Treat values as close prices and convert them to returns.
    pub prices: Option<ReturnKind>,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self { date_column: "date".to_string(), prices: None }
    }
}

/// Chronologically sorted returns with NaN marking missing values.
#[derive(Debug, Clone)]
struct ReturnTable {
    symbols: Vec<Symbol>,
    dates: Vec<Date>,
    values: Array2<f64>,
}

impl ReturnTable {
    fn from_frame(df: &DataFrame, options: &ProviderOptions) -> Result<Self, ProviderError> {
        let date_column = df
            .column(&options.date_column)
            .map_err(|_| ProviderError::MissingColumn(options.date_column.clone()))?;
        let days = date_column.cast(&DataType::Date)?.cast(&DataType::Int32)?;
        let raw_dates = days
            .i32()?
            .into_iter()
            .enumerate()
            .map(|(row, day)| {
                day.and_then(|d| Date::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE))
                    .ok_or_else(|| ProviderError::InvalidData(format!("missing date in row {row}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut order: Vec<usize> = (0..raw_dates.len()).collect();
        order.sort_by_key(|&i| raw_dates[i]);
        let dates: Vec<Date> = order.iter().map(|&i| raw_dates[i]).collect();
        if let Some(pair) = dates.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(ProviderError::InvalidData(format!("duplicate date {}", pair[0])));
        }

        let asset_columns: Vec<&Column> = df
            .get_columns()
            .iter()
            .filter(|c| c.name().as_str() != options.date_column)
            .collect();
        if asset_columns.is_empty() {
            return Err(ProviderError::InvalidData("no asset columns".to_string()));
        }

        let mut values = Array2::from_elem((dates.len(), asset_columns.len()), f64::NAN);
        let mut symbols = Vec::with_capacity(asset_columns.len());
        for (j, column) in asset_columns.iter().enumerate() {
            symbols.push(Symbol::new(column.name().as_str()));
            let cast = column.cast(&DataType::Float64)?;
            let raw: Vec<Option<f64>> = cast.f64()?.into_iter().collect();
            for (row, &src) in order.iter().enumerate() {
                if let Some(v) = raw[src] {
                    values[[row, j]] = v;
                }
            }
        }

        let (dates, values) = match options.prices {
            Some(kind) => {
                let returns = prices_to_returns(values.view(), kind);
                (dates.into_iter().skip(1).collect(), returns)
            }
            None => (dates, values),
        };

        tracing::debug!(
            periods = dates.len(),
            assets = symbols.len(),
            prices = options.prices.is_some(),
            "loaded return table"
        );

        Ok(Self { symbols, dates, values })
    }

    fn select(&self, start: Date, end: Date) -> Result<CrossSectionalPanel, ProviderError> {
        if start > end {
            return Err(ProviderError::InvalidRange { start, end });
        }
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end);
        if lo >= hi {
            return Err(ProviderError::EmptyRange { start, end });
        }

        let window = self.values.slice(s![lo..hi, ..]);
        let keep: Vec<usize> = window
            .columns()
            .into_iter()
            .enumerate()
            .filter(|(_, column)| column.iter().all(|v| v.is_finite()))
            .map(|(j, _)| j)
            .collect();
        if keep.is_empty() {
            return Err(ProviderError::NoCompleteAssets { start, end });
        }

        let dropped = self.symbols.len() - keep.len();
        if dropped > 0 {
            tracing::debug!(dropped, kept = keep.len(), %start, %end, "dropped incomplete assets");
        }

        let symbols = keep.iter().map(|&j| self.symbols[j].clone()).collect();
        let returns = window.select(Axis(1), &keep);
        Ok(CrossSectionalPanel::new(symbols, returns)?.with_dates(self.dates[lo..hi].to_vec())?)
    }
}

/// Provider over an in-memory wide `DataFrame`.
///
/// The frame holds one date column and one numeric column per asset. Rows
/// may arrive in any order; nulls and non-finite values count as missing.
#[derive(Debug, Clone)]
pub struct FramePanelProvider {
    table: ReturnTable,
    name: String,
}

impl FramePanelProvider {
    /// Create a provider from a frame.
    ///
    /// # Errors
    /// Returns `ProviderError` if the date column is missing or has nulls or
    /// duplicates, there are no asset columns, or a column cannot be cast.
    pub fn new(df: &DataFrame, options: &ProviderOptions) -> Result<Self, ProviderError> {
        Ok(Self { table: ReturnTable::from_frame(df, options)?, name: "frame".to_string() })
    }

    /// Every asset in the table, in column order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.table.symbols
    }

    /// Every date in the table, ascending.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.table.dates
    }
}

impl DataProvider for FramePanelProvider {
    fn get_cross_sectional_data(
        &self,
        start: Date,
        end: Date,
    ) -> Result<CrossSectionalPanel, ProviderError> {
        self.table.select(start, end)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Provider reading a wide CSV file.
#[derive(Debug, Clone)]
pub struct CsvPanelProvider {
    inner: FramePanelProvider,
}

impl CsvPanelProvider {
    /// Read `path` into a provider.
    ///
    /// The header row names the columns. Dates are parsed as ISO `YYYY-MM-DD`.
    ///
    /// # Errors
    /// Returns `ProviderError` if the file cannot be read or parsed, or on any
    /// error from [`FramePanelProvider::new`].
    pub fn open(path: impl AsRef<Path>, options: &ProviderOptions) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        let mut inner = FramePanelProvider::new(&df, options)?;
        inner.name = path.display().to_string();
        Ok(Self { inner })
    }

    /// Every asset in the file, in column order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        self.inner.symbols()
    }

    /// Every date in the file, ascending.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        self.inner.dates()
    }
}

impl DataProvider for CsvPanelProvider {
    fn get_cross_sectional_data(
        &self,
        start: Date,
        end: Date,
    ) -> Result<CrossSectionalPanel, ProviderError> {
        self.inner.get_cross_sectional_data(start, end)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
