//! Serializable pipeline configuration.
//!
//! A `PipelineConfig` captures everything needed to reproduce a run: the asset
//! universe and its source, indicator windows, the macro reference and series
//! list, and where outputs go. Every section has defaults, so a TOML file only
//! needs the keys it changes.

use chrono::NaiveDate;
use featurelab_core::data::{AlignMode, OutputFormat};
use featurelab_core::indicators::IndicatorConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Full configuration of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub assets: AssetsConfig,
    pub indicators: IndicatorConfig,
    #[serde(rename = "macro")]
    pub macro_data: MacroConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("assets", self.assets.start, self.assets.end)?;
        check_range("macro", self.macro_data.start, self.macro_data.end)?;

        let mut tickers = HashSet::new();
        for ticker in &self.assets.tickers {
            if ticker.trim().is_empty() {
                return Err(ConfigError::Invalid("empty ticker in assets.tickers".into()));
            }
            if !tickers.insert(ticker.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate ticker '{ticker}'")));
            }
        }

        self.indicators
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        // The reference becomes the first panel column, so it shares the
        // namespace with the other series.
        let mut names = HashSet::new();
        for series in std::iter::once(&self.macro_data.reference).chain(&self.macro_data.series) {
            if series.name.trim().is_empty() {
                return Err(ConfigError::Invalid("macro series with an empty name".into()));
            }
            if !names.insert(series.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate macro series '{}'",
                    series.name
                )));
            }
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the configuration.
    ///
    /// Two runs with identical configs get the same hash, which the run
    /// summary records next to the panel fingerprints.
    pub fn config_hash(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    /// Replace every asset and macro source with the synthetic provider.
    pub fn use_synthetic_sources(&mut self) {
        self.assets.source = AssetSourceConfig::Synthetic;
        self.macro_data.reference.source = MacroSourceConfig::Synthetic;
        for series in &mut self.macro_data.series {
            series.source = MacroSourceConfig::Synthetic;
        }
    }
}

fn check_range(section: &str, start: NaiveDate, end: NaiveDate) -> Result<(), ConfigError> {
    if start > end {
        return Err(ConfigError::Invalid(format!(
            "{section}: start {start} is after end {end}"
        )));
    }
    Ok(())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

// ── Assets ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub tickers: Vec<String>,
    /// First day kept (inclusive).
    pub start: NaiveDate,
    /// Last day kept (inclusive).
    pub end: NaiveDate,
    pub source: AssetSourceConfig,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            tickers: ["SPY", "QQQ", "IWM", "EFA", "VWO", "VNQ", "TLT"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            start: date(2010, 1, 1),
            end: date(2024, 5, 1),
            source: AssetSourceConfig::Yahoo,
        }
    }
}

/// Where asset bars come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetSourceConfig {
    /// `{dir}/{SYMBOL}_data.csv` files, e.g. the raw output of a previous download.
    Csv { dir: PathBuf },

    /// Yahoo Finance chart API.
    Yahoo,

    /// Seeded random walk per symbol.
    Synthetic,
}

// ── Macro ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Series whose observation days define the trading calendar.
    pub reference: MacroSeriesConfig,
    pub series: Vec<MacroSeriesConfig>,
}

impl Default for MacroConfig {
    fn default() -> Self {
        Self {
            start: date(2010, 1, 1),
            end: date(2025, 5, 1),
            reference: MacroSeriesConfig::new(
                "VIX",
                MacroSourceConfig::Yahoo {
                    symbol: "^VIX".into(),
                },
            ),
            series: vec![
                MacroSeriesConfig::new(
                    "SKEW",
                    MacroSourceConfig::Csv {
                        path: PathBuf::from("macro/SKEW_History.csv"),
                        date_column: "DATE".into(),
                        value_column: "SKEW".into(),
                    },
                )
                .with_align(AlignMode::Direct),
                MacroSeriesConfig::new(
                    "GEPU",
                    MacroSourceConfig::CsvYearMonth {
                        path: PathBuf::from("macro/Global_Policy_Uncertainty_Data.csv"),
                        year_column: "Year".into(),
                        month_column: "Month".into(),
                        value_column: "GEPU_current".into(),
                    },
                ),
                MacroSeriesConfig::fred("DTB3", "DTB3"),
                MacroSeriesConfig::fred("GS10", "GS10"),
                MacroSeriesConfig::fred("HY_SPREAD", "BAMLH0A0HYM2"),
                MacroSeriesConfig::fred("INDPRO", "INDPRO"),
                MacroSeriesConfig::fred("CPI", "CPIAUCSL"),
                MacroSeriesConfig::fred("UNRATE", "UNRATE"),
            ],
        }
    }
}

/// One macro series: its panel column name, where it comes from, and how it
/// is mapped onto the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroSeriesConfig {
    pub name: String,
    pub source: MacroSourceConfig,
    #[serde(default)]
    pub align: AlignMode,
}

impl MacroSeriesConfig {
    pub fn new(name: impl Into<String>, source: MacroSourceConfig) -> Self {
        Self {
            name: name.into(),
            source,
            align: AlignMode::TwoStage,
        }
    }

    pub fn fred(name: &str, id: &str) -> Self {
        Self::new(name, MacroSourceConfig::Fred { id: id.into() })
    }

    pub fn with_align(mut self, align: AlignMode) -> Self {
        self.align = align;
        self
    }

    /// Identifier handed to the provider: the ticker or FRED id for remote
    /// sources, the column name otherwise.
    pub fn source_id(&self) -> &str {
        match &self.source {
            MacroSourceConfig::Yahoo { symbol } => symbol,
            MacroSourceConfig::Fred { id } => id,
            MacroSourceConfig::Csv { .. }
            | MacroSourceConfig::CsvYearMonth { .. }
            | MacroSourceConfig::Synthetic => &self.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MacroSourceConfig {
    /// Daily closes of a Yahoo symbol (e.g. `^VIX`).
    Yahoo { symbol: String },

    /// FRED series via the fredgraph CSV endpoint.
    Fred { id: String },

    /// Local CSV with a single date column.
    Csv {
        path: PathBuf,
        date_column: String,
        value_column: String,
    },

    /// Local CSV with separate year and month columns.
    CsvYearMonth {
        path: PathBuf,
        year_column: String,
        month_column: String,
        value_column: String,
    },

    /// Seeded random walk named after the series.
    Synthetic,
}

// ── Output ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub format: OutputFormat,
    /// Also write the cleaned bars under `raw/`.
    pub save_raw: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            format: OutputFormat::Csv,
            save_raw: true,
        }
    }
}
