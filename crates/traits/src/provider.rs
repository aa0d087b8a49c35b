//! Data provider trait definitions.

use aptpca_primitives::{CrossSectionalPanel, Date, PanelError};
use polars::prelude::PolarsError;

/// Errors that can occur while acquiring a return panel.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Start date is after end date.
    #[error("invalid date range: {start} is after {end}")]
    InvalidRange {
        /// Requested start.
        start: Date,
        /// Requested end.
        end: Date,
    },

    /// No rows fall inside the requested range.
    #[error("no data between {start} and {end}")]
    EmptyRange {
        /// Requested start.
        start: Date,
        /// Requested end.
        end: Date,
    },

    /// Every asset has a gap inside the requested range.
    #[error("no asset has complete data between {start} and {end}")]
    NoCompleteAssets {
        /// Requested start.
        start: Date,
        /// Requested end.
        end: Date,
    },

    /// Missing required column.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// Source data is malformed.
    #[error("invalid source data: {0}")]
    InvalidData(String),

    /// Panel assembly error.
    #[error("panel error: {0}")]
    Panel(#[from] PanelError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] PolarsError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Returns whether a different date range could succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::EmptyRange { .. } | Self::NoCompleteAssets { .. })
    }
}

/// Source of cross-sectional return panels.
///
/// Implementations own alignment and gap-filling: a returned panel has one
/// row per period in `[start, end]`, in chronological order, and no missing
/// values.
pub trait DataProvider: Send + Sync {
    /// Fetch the return panel for the inclusive range `[start, end]`.
    ///
    /// # Errors
    /// Returns `ProviderError` if the range is invalid or no usable data exists.
    fn get_cross_sectional_data(
        &self,
        start: Date,
        end: Date,
    ) -> Result<CrossSectionalPanel, ProviderError>;

    /// Returns the name of this provider.
    fn name(&self) -> &str;
}
