//! Provider traits and structured error types.
//!
//! Market and macro providers abstract over data sources (Yahoo Finance, FRED,
//! local CSV, synthetic) so the pipelines can swap implementations and mock
//! them in tests. Providers return loosely-typed data; validation happens in
//! the cleaner and the aligner.

use crate::domain::{ExternalSeries, RawFrame};
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Provider failure for a single symbol or series.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Network(e.to_string())
    }
}

/// Source of daily OHLCV rows for a symbol.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch raw daily rows for `symbol` over `[start, end]`.
    ///
    /// File-backed providers may return rows outside the range; the pipeline
    /// clips after cleaning.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<RawFrame, ProviderError>;
}

/// Source of a dated scalar series (index levels, rates, monthly releases).
pub trait MacroDataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch the series identified by `id`. The returned series is named `id`.
    fn fetch_series(
        &self,
        id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ExternalSeries, ProviderError>;
}

/// Progress callback for sequential fetch loops.
pub trait FetchProgress: Send + Sync {
    /// Called when starting to fetch an item.
    fn on_start(&self, name: &str, index: usize, total: usize);

    /// Called when an item fetch completes.
    fn on_complete(&self, name: &str, index: usize, total: usize, error: Option<&str>);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, name: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {name}...", index + 1, total);
    }

    fn on_complete(&self, name: &str, _index: usize, _total: usize, error: Option<&str>) {
        match error {
            None => println!("  OK: {name}"),
            Some(e) => println!("  FAIL: {name}: {e}"),
        }
    }
}

/// Progress reporter that does nothing.
pub struct NoProgress;

impl FetchProgress for NoProgress {
    fn on_start(&self, _name: &str, _index: usize, _total: usize) {}

    fn on_complete(&self, _name: &str, _index: usize, _total: usize, _error: Option<&str>) {}
}
