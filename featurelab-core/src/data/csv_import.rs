//! Local CSV providers: the offline path for asset bars and macro series.

use super::clean::coerce_date;
use super::provider::{MacroDataProvider, MarketDataProvider, ProviderError};
use crate::domain::{ExternalSeries, RawFrame, RawValue};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads `{dir}/{SYMBOL}_data.csv`, the layout the raw-bar writer produces.
///
/// Every cell is handed to the cleaner as text; no typing happens here.
pub struct CsvBarProvider {
    dir: PathBuf,
}

impl CsvBarProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}_data.csv"))
    }
}

impl MarketDataProvider for CsvBarProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<RawFrame, ProviderError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let frame = read_raw_frame(symbol, &path)?;
        debug!(%symbol, path = %path.display(), rows = frame.height(), "read csv bars");
        Ok(frame)
    }
}

/// Read any headed CSV into a raw frame.
pub fn read_raw_frame(symbol: &str, path: &Path) -> Result<RawFrame, ProviderError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let columns = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut frame = RawFrame::new(symbol, columns);
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        frame.push_row(record.iter().map(|cell| RawValue::from(cell.trim())).collect());
    }
    Ok(frame)
}

/// How a series file encodes its dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateColumns {
    /// One column holding a full date.
    Single(String),
    /// Separate year and month columns; the date is the first of the month.
    YearMonth { year: String, month: String },
}

/// A single series stored in a local CSV file.
pub struct CsvSeriesProvider {
    path: PathBuf,
    dates: DateColumns,
    value_column: String,
}

impl CsvSeriesProvider {
    pub fn new(path: impl Into<PathBuf>, dates: DateColumns, value_column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            dates,
            value_column: value_column.into(),
        }
    }

    fn column_index(&self, headers: &csv::StringRecord, name: &str) -> Result<usize, ProviderError> {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                ProviderError::Parse(format!(
                    "{}: missing column {name:?}",
                    self.path.display()
                ))
            })
    }
}

impl MacroDataProvider for CsvSeriesProvider {
    fn name(&self) -> &str {
        "csv"
    }

    /// Rows with an unparseable date or value are skipped, the way the
    /// fredgraph `.` marker is. Range clipping is left to the caller.
    fn fetch_series(
        &self,
        id: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<ExternalSeries, ProviderError> {
        if !self.path.exists() {
            return Err(ProviderError::Io {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| csv_error(&self.path, e))?;
        let headers = reader.headers().map_err(|e| csv_error(&self.path, e))?.clone();

        let value_idx = self.column_index(&headers, &self.value_column)?;
        let date_idx = match &self.dates {
            DateColumns::Single(col) => (self.column_index(&headers, col)?, None),
            DateColumns::YearMonth { year, month } => (
                self.column_index(&headers, year)?,
                Some(self.column_index(&headers, month)?),
            ),
        };

        let mut pairs = Vec::new();
        let mut skipped = 0usize;
        for record in reader.records() {
            let record = record.map_err(|e| csv_error(&self.path, e))?;
            let date = match date_idx {
                (col, None) => record
                    .get(col)
                    .and_then(|s| coerce_date(&RawValue::Text(s.to_string()))),
                (year_col, Some(month_col)) => year_month_date(
                    record.get(year_col).unwrap_or(""),
                    record.get(month_col).unwrap_or(""),
                ),
            };
            let value = record
                .get(value_idx)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite());
            match (date, value) {
                (Some(date), Some(value)) => pairs.push((date, value)),
                _ => skipped += 1,
            }
        }

        debug!(
            series = %id,
            path = %self.path.display(),
            observations = pairs.len(),
            skipped,
            "read csv series"
        );
        Ok(ExternalSeries::from_pairs(id, pairs))
    }
}

// ── Helpers ──

fn year_month_date(year: &str, month: &str) -> Option<NaiveDate> {
    // Year/Month cells are sometimes written as floats ("2024.0").
    let year = year.trim().parse::<f64>().ok()?;
    let month = month.trim().parse::<f64>().ok()?;
    if year.fract() != 0.0 || month.fract() != 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(year as i32, month as u32, 1)
}

fn csv_error(path: &Path, e: csv::Error) -> ProviderError {
    if e.is_io_error() {
        match e.into_kind() {
            csv::ErrorKind::Io(source) => ProviderError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => ProviderError::Parse(format!("{}: {other:?}", path.display())),
        }
    } else {
        ProviderError::Parse(format!("{}: {e}", path.display()))
    }
}
