//! Persistence of panels and raw bars.
//!
//! Layout under the output directory:
//! - `indicators/{SYMBOL}_indicators.{ext}`
//! - `macro/macro_indicators.{ext}`
//! - `raw/{SYMBOL}_data.{ext}`
//!
//! Every file has a leading `date` column. Missing values are empty CSV fields
//! or Parquet nulls. Writes are atomic: write to .tmp, then rename into place.

use super::macro_panel::MacroPanel;
use crate::domain::{BarSeries, PanelColumn};
use crate::indicators::IndicatorPanel;
use chrono::NaiveDate;
use polars::prelude::{Column, DataFrame, DataType};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv encoding failed for {}: {message}", path.display())]
    Csv { path: PathBuf, message: String },

    #[error("parquet write failed for {}: {message}", path.display())]
    Parquet { path: PathBuf, message: String },
}

/// On-disk format of written artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(format!("unknown output format '{other}' (expected csv or parquet)")),
        }
    }
}

/// Sink for pipeline outputs. Each method returns the path it wrote.
pub trait PersistenceWriter: Send + Sync {
    fn write_indicator_panel(
        &self,
        symbol: &str,
        panel: &IndicatorPanel,
    ) -> Result<PathBuf, WriteError>;

    fn write_macro_panel(&self, panel: &MacroPanel) -> Result<PathBuf, WriteError>;

    fn write_raw_bars(&self, series: &BarSeries) -> Result<PathBuf, WriteError>;
}

/// Build the writer for `format` rooted at `out_dir`.
pub fn writer_for(format: OutputFormat, out_dir: impl Into<PathBuf>) -> Box<dyn PersistenceWriter> {
    match format {
        OutputFormat::Csv => Box::new(CsvWriter::new(out_dir)),
        OutputFormat::Parquet => Box::new(ParquetWriter::new(out_dir)),
    }
}

/// Output paths shared by both writers.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    format: OutputFormat,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    pub fn indicator_path(&self, symbol: &str) -> PathBuf {
        self.root
            .join("indicators")
            .join(format!("{symbol}_indicators.{}", self.format.extension()))
    }

    pub fn macro_path(&self) -> PathBuf {
        self.root
            .join("macro")
            .join(format!("macro_indicators.{}", self.format.extension()))
    }

    pub fn raw_path(&self, symbol: &str) -> PathBuf {
        self.root
            .join("raw")
            .join(format!("{symbol}_data.{}", self.format.extension()))
    }
}

// ── CSV ─────────────────────────────────────────────────────────────

pub struct CsvWriter {
    layout: OutputLayout,
}

impl CsvWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            layout: OutputLayout::new(out_dir, OutputFormat::Csv),
        }
    }
}

impl PersistenceWriter for CsvWriter {
    fn write_indicator_panel(
        &self,
        symbol: &str,
        panel: &IndicatorPanel,
    ) -> Result<PathBuf, WriteError> {
        let path = self.layout.indicator_path(symbol);
        write_atomic(&path, |tmp| write_csv_table(tmp, panel.dates(), panel.columns()))?;
        Ok(path)
    }

    fn write_macro_panel(&self, panel: &MacroPanel) -> Result<PathBuf, WriteError> {
        let path = self.layout.macro_path();
        write_atomic(&path, |tmp| write_csv_table(tmp, panel.dates(), panel.columns()))?;
        Ok(path)
    }

    fn write_raw_bars(&self, series: &BarSeries) -> Result<PathBuf, WriteError> {
        let path = self.layout.raw_path(&series.symbol);
        let columns = bar_columns(series);
        write_atomic(&path, |tmp| write_csv_table(tmp, &series.dates(), &columns))?;
        Ok(path)
    }
}

fn write_csv_table(
    path: &Path,
    dates: &[NaiveDate],
    columns: &[PanelColumn],
) -> Result<(), WriteError> {
    let csv_err = |e: csv::Error| WriteError::Csv {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;

    let mut header = Vec::with_capacity(columns.len() + 1);
    header.push("date");
    header.extend(columns.iter().map(|c| c.name.as_str()));
    wtr.write_record(&header).map_err(csv_err)?;

    for (i, date) in dates.iter().enumerate() {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(date.format("%Y-%m-%d").to_string());
        // shortest round-trip formatting, so re-reading is bit-exact
        record.extend(
            columns
                .iter()
                .map(|c| c.values.get(i).copied().flatten().map_or(String::new(), |v| v.to_string())),
        );
        wtr.write_record(&record).map_err(csv_err)?;
    }

    wtr.flush().map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Parquet ─────────────────────────────────────────────────────────

pub struct ParquetWriter {
    layout: OutputLayout,
}

impl ParquetWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            layout: OutputLayout::new(out_dir, OutputFormat::Parquet),
        }
    }
}

impl PersistenceWriter for ParquetWriter {
    fn write_indicator_panel(
        &self,
        symbol: &str,
        panel: &IndicatorPanel,
    ) -> Result<PathBuf, WriteError> {
        let path = self.layout.indicator_path(symbol);
        write_atomic(&path, |tmp| write_parquet_table(tmp, panel.dates(), panel.columns()))?;
        Ok(path)
    }

    fn write_macro_panel(&self, panel: &MacroPanel) -> Result<PathBuf, WriteError> {
        let path = self.layout.macro_path();
        write_atomic(&path, |tmp| write_parquet_table(tmp, panel.dates(), panel.columns()))?;
        Ok(path)
    }

    fn write_raw_bars(&self, series: &BarSeries) -> Result<PathBuf, WriteError> {
        let path = self.layout.raw_path(&series.symbol);
        let columns = bar_columns(series);
        write_atomic(&path, |tmp| write_parquet_table(tmp, &series.dates(), &columns))?;
        Ok(path)
    }
}

fn write_parquet_table(
    path: &Path,
    dates: &[NaiveDate],
    columns: &[PanelColumn],
) -> Result<(), WriteError> {
    let pq_err = |message: String| WriteError::Parquet {
        path: path.to_path_buf(),
        message,
    };

    let mut df = to_dataframe(dates, columns).map_err(|e| pq_err(e.to_string()))?;
    let file = fs::File::create(path).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    polars::prelude::ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| pq_err(e.to_string()))?;
    Ok(())
}

fn to_dataframe(
    dates: &[NaiveDate],
    columns: &[PanelColumn],
) -> polars::prelude::PolarsResult<DataFrame> {
    let epoch_days: Vec<i32> = dates.iter().map(|d| days_since_epoch(*d)).collect();

    let mut cols = Vec::with_capacity(columns.len() + 1);
    cols.push(Column::new("date".into(), epoch_days).cast(&DataType::Date)?);
    for column in columns {
        cols.push(Column::new(column.name.as_str().into(), column.values.clone()));
    }
    DataFrame::new(cols)
}

// ── Helpers ──

fn days_since_epoch(date: NaiveDate) -> i32 {
    (date - NaiveDate::default()).num_days() as i32
}

fn bar_columns(series: &BarSeries) -> Vec<PanelColumn> {
    let column = |name: &str, f: fn(&crate::domain::Bar) -> f64| {
        PanelColumn::new(name, series.bars.iter().map(|b| Some(f(b))).collect())
    };
    vec![
        column("open", |b| b.open),
        column("high", |b| b.high),
        column("low", |b| b.low),
        column("close", |b| b.close),
        column("volume", |b| b.volume),
    ]
}

/// Run `write` against `{path}.tmp`, then rename over `path`.
fn write_atomic(
    path: &Path,
    write: impl FnOnce(&Path) -> Result<(), WriteError>,
) -> Result<(), WriteError> {
    let io_err = |source: std::io::Error| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    if let Err(e) = write(&tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        io_err(e)
    })?;

    debug!(path = %path.display(), "wrote artifact");
    Ok(())
}
