//! Run summary: what each pipeline produced, what failed, and the
//! fingerprints needed to check a rerun, persisted as `run_summary.json`.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::assets::{AssetOutput, CleanSummary};
use crate::batch::{BatchOutcome, ItemFailure};
use crate::macro_pipeline::{MacroOutput, SeriesSummary};

/// Current schema version of `run_summary.json`.
pub const SCHEMA_VERSION: u32 = 1;

pub const SUMMARY_FILE: &str = "run_summary.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub symbol: String,
    pub clean: CleanSummary,
    pub columns: Vec<String>,
    pub fingerprint: String,
    pub raw_path: Option<PathBuf>,
    pub indicator_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroRecord {
    pub days: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub series: Vec<SeriesSummary>,
    pub fingerprint: String,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub generated_at: String,
    pub config_hash: String,
    pub assets: Vec<AssetRecord>,
    pub macro_panel: Option<MacroRecord>,
    pub failures: Vec<ItemFailure>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunSummary {
    pub fn new(config_hash: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            config_hash: config_hash.into(),
            assets: Vec::new(),
            macro_panel: None,
            failures: Vec::new(),
        }
    }

    pub fn record_assets(&mut self, outcome: &BatchOutcome<AssetOutput>) {
        for (symbol, output) in &outcome.succeeded {
            self.assets.push(AssetRecord {
                symbol: symbol.clone(),
                clean: output.summary.clone(),
                columns: output.panel.names().iter().map(|s| s.to_string()).collect(),
                fingerprint: output.fingerprint.clone(),
                raw_path: output.raw_path.clone(),
                indicator_path: output.indicator_path.clone(),
            });
        }
        self.failures.extend(outcome.failed.iter().cloned());
    }

    pub fn record_macro(&mut self, output: &MacroOutput) {
        self.macro_panel = Some(MacroRecord {
            days: output.panel.len(),
            first_date: output.panel.dates().first().copied(),
            last_date: output.panel.dates().last().copied(),
            series: output.series.clone(),
            fingerprint: output.fingerprint.clone(),
            path: output.path.clone(),
        });
        self.failures.extend(output.failed.iter().cloned());
    }

    pub fn record_failure(&mut self, failure: ItemFailure) {
        self.failures.push(failure);
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize run summary")
    }

    /// Parse a summary, rejecting schema versions newer than this build.
    pub fn from_json(json: &str) -> Result<Self> {
        let summary: RunSummary =
            serde_json::from_str(json).context("failed to deserialize run summary")?;
        if summary.schema_version > SCHEMA_VERSION {
            bail!(
                "unsupported schema version {} (max supported: {})",
                summary.schema_version,
                SCHEMA_VERSION
            );
        }
        Ok(summary)
    }

    /// Write `run_summary.json` under `output_dir` and return its path.
    pub fn save(&self, output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;
        let path = output_dir.join(SUMMARY_FILE);
        std::fs::write(&path, self.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunSummary {
        let mut summary = RunSummary::new("abc123");
        summary.record_failure(ItemFailure {
            name: "BAD".into(),
            reason: "provider error: symbol not found: BAD".into(),
        });
        summary
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let summary = sample();
        let path = summary.save(dir.path()).unwrap();
        assert_eq!(path, dir.path().join(SUMMARY_FILE));

        let loaded = RunSummary::load(&path).unwrap();
        assert_eq!(loaded, summary);
        assert!(!loaded.is_complete());
    }

    #[test]
    fn rejects_newer_schema() {
        let mut summary = sample();
        summary.schema_version = SCHEMA_VERSION + 1;
        let json = serde_json::to_string(&summary).unwrap();
        let err = RunSummary::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn missing_schema_version_defaults_to_current() {
        let json = r#"{"generated_at":"2024-01-01T00:00:00+00:00","config_hash":"x","assets":[],"macro_panel":null,"failures":[]}"#;
        let summary = RunSummary::from_json(json).unwrap();
        assert_eq!(summary.schema_version, SCHEMA_VERSION);
        assert!(summary.is_complete());
    }
}
