//! Per-asset pipeline: fetch, clean, clip, compute indicators, persist.
//!
//! Fetching is sequential and reports progress. Everything after the fetch is
//! a pure function of the raw frame, so it fans out over rayon and fans back
//! in input order.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use featurelab_core::data::{
    AnomalyReport, DataCleaner, FetchProgress, MarketDataProvider, PersistenceWriter,
    ProviderError,
};
use featurelab_core::domain::{BarSeries, RawFrame};
use featurelab_core::indicators::{IndicatorConfig, IndicatorEngine, IndicatorPanel};

use crate::batch::{BatchOutcome, PipelineError};
use crate::config::AssetsConfig;

/// What cleaning did to one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanSummary {
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub duplicates_removed: usize,
    /// Bars left after clipping to the configured range.
    pub rows_kept: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub anomalies: Vec<AnomalyReport>,
}

/// A cleaned asset, clipped to the configured range.
#[derive(Debug, Clone)]
pub struct CleanedAsset {
    pub series: BarSeries,
    pub summary: CleanSummary,
    /// Where the cleaned bars were written, if they were.
    pub raw_path: Option<PathBuf>,
}

/// Indicator output for one asset.
#[derive(Debug, Clone)]
pub struct AssetOutput {
    pub summary: CleanSummary,
    pub panel: IndicatorPanel,
    pub fingerprint: String,
    pub raw_path: Option<PathBuf>,
    pub indicator_path: Option<PathBuf>,
}

/// Fetch every ticker in order. Failures stay tagged with their ticker.
pub fn fetch_all(
    provider: &dyn MarketDataProvider,
    config: &AssetsConfig,
    progress: &dyn FetchProgress,
) -> Vec<(String, Result<RawFrame, ProviderError>)> {
    let total = config.tickers.len();
    config
        .tickers
        .iter()
        .enumerate()
        .map(|(i, ticker)| {
            progress.on_start(ticker, i, total);
            let result = provider.fetch(ticker, config.start, config.end);
            let error = result.as_ref().err().map(|e| e.to_string());
            progress.on_complete(ticker, i, total, error.as_deref());
            (ticker.clone(), result)
        })
        .collect()
}

/// Clean one raw frame and clip it to `[start, end]`.
///
/// An asset with no bars left in range is a failure for that asset.
pub fn clean_asset(
    raw: &RawFrame,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(BarSeries, CleanSummary), PipelineError> {
    let report = DataCleaner::clean_with_report(raw)?;
    let series = report.series.clip(start, end);
    if series.is_empty() {
        return Err(PipelineError::EmptyRange { start, end });
    }

    let summary = CleanSummary {
        rows_read: raw.height(),
        rows_dropped: report.dropped.len(),
        duplicates_removed: report.duplicates_removed,
        rows_kept: series.len(),
        first_date: series.first_date(),
        last_date: series.last_date(),
        anomalies: report.anomalies,
    };
    Ok((series, summary))
}

/// Fetch, clean and (optionally) persist the raw bars of every ticker.
pub fn download_assets(
    provider: &dyn MarketDataProvider,
    config: &AssetsConfig,
    writer: Option<&dyn PersistenceWriter>,
    progress: &dyn FetchProgress,
) -> BatchOutcome<CleanedAsset> {
    let fetched = fetch_all(provider, config, progress);

    let results: Vec<(String, Result<CleanedAsset, PipelineError>)> = fetched
        .into_par_iter()
        .map(|(ticker, raw)| {
            let result = raw.map_err(PipelineError::from).and_then(|raw| {
                let (series, summary) = clean_asset(&raw, config.start, config.end)?;
                let raw_path = writer.map(|w| w.write_raw_bars(&series)).transpose()?;
                Ok(CleanedAsset {
                    series,
                    summary,
                    raw_path,
                })
            });
            (ticker, result)
        })
        .collect();

    let outcome = BatchOutcome::from_results(results);
    log_outcome("download", &outcome);
    outcome
}

/// Fetch, clean and compute the indicator panel of every ticker.
///
/// `raw_writer` persists the cleaned bars, `writer` the indicator panels.
/// An invalid indicator config fails the whole batch before anything is
/// fetched.
pub fn compute_indicators(
    provider: &dyn MarketDataProvider,
    config: &AssetsConfig,
    indicators: &IndicatorConfig,
    writer: Option<&dyn PersistenceWriter>,
    raw_writer: Option<&dyn PersistenceWriter>,
    progress: &dyn FetchProgress,
) -> Result<BatchOutcome<AssetOutput>, PipelineError> {
    let engine = IndicatorEngine::new(indicators)?;
    let fetched = fetch_all(provider, config, progress);

    let results: Vec<(String, Result<AssetOutput, PipelineError>)> = fetched
        .into_par_iter()
        .map(|(ticker, raw)| {
            let result = raw
                .map_err(PipelineError::from)
                .and_then(|raw| indicators_for(&engine, &raw, config, writer, raw_writer));
            (ticker, result)
        })
        .collect();

    let outcome = BatchOutcome::from_results(results);
    log_outcome("indicators", &outcome);
    Ok(outcome)
}

fn indicators_for(
    engine: &IndicatorEngine,
    raw: &RawFrame,
    config: &AssetsConfig,
    writer: Option<&dyn PersistenceWriter>,
    raw_writer: Option<&dyn PersistenceWriter>,
) -> Result<AssetOutput, PipelineError> {
    let (series, summary) = clean_asset(raw, config.start, config.end)?;
    let raw_path = raw_writer.map(|w| w.write_raw_bars(&series)).transpose()?;

    let panel = engine.compute(&series)?;
    let indicator_path = writer
        .map(|w| w.write_indicator_panel(&series.symbol, &panel))
        .transpose()?;

    Ok(AssetOutput {
        summary,
        fingerprint: panel.fingerprint(),
        panel,
        raw_path,
        indicator_path,
    })
}

fn log_outcome<T>(stage: &str, outcome: &BatchOutcome<T>) {
    info!(
        stage,
        succeeded = outcome.succeeded.len(),
        failed = outcome.failed.len(),
        "asset batch finished"
    );
    for failure in &outcome.failed {
        warn!(stage, symbol = %failure.name, reason = %failure.reason, "asset failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use featurelab_core::data::{NoProgress, SyntheticProvider};
    use featurelab_core::domain::RawValue;
    use featurelab_core::indicators::WarmupPolicy;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn assets(tickers: &[&str], start: NaiveDate, end: NaiveDate) -> AssetsConfig {
        AssetsConfig {
            tickers: tickers.iter().map(|s| s.to_string()).collect(),
            start,
            end,
            ..AssetsConfig::default()
        }
    }

    /// Serves synthetic bars except for symbols it has been told to fail.
    struct FlakyProvider {
        missing: Vec<&'static str>,
    }

    impl MarketDataProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<RawFrame, ProviderError> {
            if self.missing.contains(&symbol) {
                return Err(ProviderError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }
            SyntheticProvider::new().fetch(symbol, start, end)
        }
    }

    #[test]
    fn clean_asset_clips_and_summarizes() {
        let mut raw = SyntheticProvider::new()
            .fetch("SPY", d(2024, 1, 1), d(2024, 1, 31))
            .unwrap();
        let mut bad = raw.rows[0].clone();
        bad[4] = RawValue::Text("n/a".into());
        raw.push_row(bad);

        let (series, summary) = clean_asset(&raw, d(2024, 1, 8), d(2024, 1, 12)).unwrap();
        assert_eq!(series.len(), 5);
        assert_eq!(summary.rows_read, 24);
        assert_eq!(summary.rows_dropped, 1);
        assert_eq!(summary.rows_kept, 5);
        assert_eq!(summary.first_date, Some(d(2024, 1, 8)));
        assert_eq!(summary.last_date, Some(d(2024, 1, 12)));
    }

    #[test]
    fn clean_asset_empty_range_fails() {
        let raw = SyntheticProvider::new()
            .fetch("SPY", d(2024, 1, 1), d(2024, 1, 31))
            .unwrap();
        let err = clean_asset(&raw, d(2025, 1, 1), d(2025, 12, 31)).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyRange { .. }));
    }

    #[test]
    fn failed_fetch_does_not_abort_batch() {
        let provider = FlakyProvider {
            missing: vec!["BAD"],
        };
        let config = assets(&["SPY", "BAD", "TLT"], d(2023, 1, 1), d(2023, 12, 31));
        let outcome = compute_indicators(
            &provider,
            &config,
            &IndicatorConfig::default(),
            None,
            None,
            &NoProgress,
        )
        .unwrap();

        assert_eq!(outcome.names(), vec!["SPY", "TLT"]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].name, "BAD");

        let spy = outcome.get("SPY").unwrap();
        assert_eq!(spy.panel.len(), spy.summary.rows_kept);
        assert_eq!(spy.panel.symbol, "SPY");
        assert!(spy.indicator_path.is_none());
    }

    #[test]
    fn strict_policy_fails_short_asset_only() {
        let provider = SyntheticProvider::new();
        let config = assets(&["SPY"], d(2024, 1, 1), d(2024, 1, 10));
        let indicators = IndicatorConfig {
            warmup_policy: WarmupPolicy::Strict,
            ..IndicatorConfig::default()
        };
        let outcome =
            compute_indicators(&provider, &config, &indicators, None, None, &NoProgress).unwrap();
        assert!(outcome.succeeded.is_empty());
        assert!(outcome.failed[0].reason.contains("needs at least"));
    }

    #[test]
    fn invalid_indicator_config_fails_batch() {
        let indicators = IndicatorConfig {
            rsi_window: 0,
            ..IndicatorConfig::default()
        };
        let result = compute_indicators(
            &SyntheticProvider::new(),
            &assets(&["SPY"], d(2024, 1, 1), d(2024, 3, 1)),
            &indicators,
            None,
            None,
            &NoProgress,
        );
        assert!(matches!(result, Err(PipelineError::Indicator(_))));
    }

    #[test]
    fn recomputation_is_deterministic() {
        let config = assets(&["QQQ", "IWM"], d(2022, 1, 1), d(2022, 12, 31));
        let run = || {
            compute_indicators(
                &SyntheticProvider::new(),
                &config,
                &IndicatorConfig::default(),
                None,
                None,
                &NoProgress,
            )
            .unwrap()
        };
        let a = run();
        let b = run();
        for ((name_a, out_a), (name_b, out_b)) in a.succeeded.iter().zip(&b.succeeded) {
            assert_eq!(name_a, name_b);
            assert_eq!(out_a.fingerprint, out_b.fingerprint);
        }
    }

    #[test]
    fn download_keeps_cleaned_series() {
        let provider = FlakyProvider {
            missing: vec!["VNQ"],
        };
        let config = assets(&["VNQ", "EFA"], d(2024, 2, 1), d(2024, 2, 29));
        let outcome = download_assets(&provider, &config, None, &NoProgress);
        assert_eq!(outcome.names(), vec!["EFA"]);
        let efa = outcome.get("EFA").unwrap();
        assert_eq!(efa.series.len(), 21);
        assert!(efa.series.is_well_formed());
        assert!(efa.raw_path.is_none());
    }
}
