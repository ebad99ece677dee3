//! Macro panel pipeline.
//!
//! The reference series defines the trading calendar and becomes the first
//! panel column. Every other series is fetched, clipped, aligned onto that
//! calendar with its configured mode, and zipped into the panel. A series
//! that cannot be fetched is left out and reported; a missing reference or a
//! panel-level failure fails the pipeline.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use featurelab_core::data::{
    AlignMode, CalendarAligner, FetchProgress, MacroDataProvider, MacroPanel, MacroPanelBuilder,
    PersistenceWriter, ProviderError,
};
use featurelab_core::domain::{AlignedSeries, ExternalSeries, TradingCalendar};

use crate::batch::{ItemFailure, PipelineError};
use crate::config::{MacroConfig, MacroSeriesConfig, MacroSourceConfig};
use crate::sources;

/// How one series landed on the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub name: String,
    pub align: AlignMode,
    /// Observations inside the configured range.
    pub observations: usize,
    /// Calendar days with no value (before the first observation).
    pub missing_days: usize,
}

#[derive(Debug, Clone)]
pub struct MacroOutput {
    pub panel: MacroPanel,
    pub fingerprint: String,
    pub series: Vec<SeriesSummary>,
    pub failed: Vec<ItemFailure>,
    pub path: Option<PathBuf>,
}

impl MacroOutput {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run the macro pipeline with providers built from each series' source.
pub fn build_macro_panel(
    config: &MacroConfig,
    writer: Option<&dyn PersistenceWriter>,
    progress: &dyn FetchProgress,
) -> Result<MacroOutput, PipelineError> {
    build_macro_panel_with(config, &sources::macro_provider, writer, progress)
}

/// Run the macro pipeline, resolving providers through `resolve`.
pub fn build_macro_panel_with<R>(
    config: &MacroConfig,
    resolve: &R,
    writer: Option<&dyn PersistenceWriter>,
    progress: &dyn FetchProgress,
) -> Result<MacroOutput, PipelineError>
where
    R: Fn(&MacroSourceConfig) -> Result<Box<dyn MacroDataProvider>, ProviderError>,
{
    let total = config.series.len() + 1;

    let reference = &config.reference;
    progress.on_start(&reference.name, 0, total);
    let fetched = fetch_series(reference, config, resolve);
    progress.on_complete(
        &reference.name,
        0,
        total,
        fetched.as_ref().err().map(|e| e.to_string()).as_deref(),
    );
    let reference_series = fetched.map_err(|e| PipelineError::Reference {
        name: reference.name.clone(),
        reason: e.to_string(),
    })?;

    let calendar = TradingCalendar::from_reference(&reference_series);
    if calendar.is_empty() {
        return Err(PipelineError::Reference {
            name: reference.name.clone(),
            reason: format!(
                "no observations between {} and {}",
                config.start, config.end
            ),
        });
    }
    info!(
        reference = %reference.name,
        days = calendar.len(),
        first = ?calendar.first(),
        last = ?calendar.last(),
        "built trading calendar"
    );

    let mut fetched = Vec::with_capacity(config.series.len());
    for (i, series) in config.series.iter().enumerate() {
        progress.on_start(&series.name, i + 1, total);
        let result = fetch_series(series, config, resolve);
        let error = result.as_ref().err().map(|e| e.to_string());
        progress.on_complete(&series.name, i + 1, total, error.as_deref());
        fetched.push((series, result));
    }

    let mut failed = Vec::new();
    let mut inputs = vec![(reference, reference_series)];
    for (series, result) in fetched {
        match result {
            Ok(observed) => inputs.push((series, observed)),
            Err(e) => {
                warn!(series = %series.name, error = %e, "macro series skipped");
                failed.push(ItemFailure::new(series.name.clone(), &e));
            }
        }
    }

    let aligned: Vec<(SeriesSummary, AlignedSeries)> = inputs
        .par_iter()
        .map(|(series, observed)| {
            let aligned = CalendarAligner::align_with(observed, &calendar, series.align);
            let summary = SeriesSummary {
                name: series.name.clone(),
                align: series.align,
                observations: observed.len(),
                missing_days: aligned.missing_count(),
            };
            (summary, aligned)
        })
        .collect();
    let (summaries, aligned): (Vec<_>, Vec<_>) = aligned.into_iter().unzip();

    let panel = MacroPanelBuilder::build(&calendar, &aligned)?;
    let path = writer.map(|w| w.write_macro_panel(&panel)).transpose()?;
    info!(
        days = panel.len(),
        columns = panel.num_columns(),
        failed = failed.len(),
        "macro panel assembled"
    );

    Ok(MacroOutput {
        fingerprint: panel.fingerprint(),
        panel,
        series: summaries,
        failed,
        path,
    })
}

/// Fetch one series, rename it to its panel column and clip it to the range.
fn fetch_series<R>(
    series: &MacroSeriesConfig,
    config: &MacroConfig,
    resolve: &R,
) -> Result<ExternalSeries, PipelineError>
where
    R: Fn(&MacroSourceConfig) -> Result<Box<dyn MacroDataProvider>, ProviderError>,
{
    let provider = resolve(&series.source)?;
    let mut observed = provider.fetch_series(series.source_id(), config.start, config.end)?;
    observed.name = series.name.clone();
    Ok(observed.clip(config.start, config.end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use featurelab_core::data::{NoProgress, SyntheticProvider};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Fixed monthly series for FRED ids, synthetic walks for everything else.
    struct FixtureProvider;

    impl MacroDataProvider for FixtureProvider {
        fn name(&self) -> &str {
            "fixture"
        }

        fn fetch_series(
            &self,
            id: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<ExternalSeries, ProviderError> {
            match id {
                "CPIAUCSL" => Ok(ExternalSeries::from_pairs(
                    id,
                    vec![
                        (d(2024, 1, 1), 308.4),
                        (d(2024, 2, 1), 310.3),
                        (d(2024, 3, 1), 312.2),
                    ],
                )),
                "MISSING" => Err(ProviderError::SymbolNotFound { symbol: id.into() }),
                _ => SyntheticProvider::new().fetch_series(id, start, end),
            }
        }
    }

    fn fixture(_: &MacroSourceConfig) -> Result<Box<dyn MacroDataProvider>, ProviderError> {
        Ok(Box::new(FixtureProvider))
    }

    fn config(series: Vec<MacroSeriesConfig>) -> MacroConfig {
        MacroConfig {
            start: d(2024, 1, 1),
            end: d(2024, 3, 31),
            reference: MacroSeriesConfig::new(
                "VIX",
                MacroSourceConfig::Yahoo {
                    symbol: "^VIX".into(),
                },
            ),
            series,
        }
    }

    #[test]
    fn reference_is_first_column_and_defines_calendar() {
        let config = config(vec![MacroSeriesConfig::fred("CPI", "CPIAUCSL")]);
        let out = build_macro_panel_with(&config, &fixture, None, &NoProgress).unwrap();

        assert!(out.is_complete());
        assert_eq!(out.panel.names(), vec!["VIX", "CPI"]);
        // Weekdays of Q1 2024.
        assert_eq!(out.panel.len(), 65);
        assert_eq!(out.panel.dates()[0], d(2024, 1, 1));

        let vix = out.panel.get("VIX").unwrap();
        assert!(vix.iter().all(Option::is_some));
        let cpi = out.panel.get("CPI").unwrap();
        assert_eq!(cpi[0], Some(308.4));
        let feb1 = out.panel.dates().iter().position(|&x| x == d(2024, 2, 1)).unwrap();
        assert_eq!(cpi[feb1 - 1], Some(308.4));
        assert_eq!(cpi[feb1], Some(310.3));
        assert_eq!(*cpi.last().unwrap(), Some(312.2));
        assert_eq!(out.series[1].observations, 3);
        assert_eq!(out.series[1].missing_days, 0);
    }

    #[test]
    fn failed_series_is_reported_not_fatal() {
        let config = config(vec![
            MacroSeriesConfig::fred("GONE", "MISSING"),
            MacroSeriesConfig::fred("CPI", "CPIAUCSL"),
        ]);
        let out = build_macro_panel_with(&config, &fixture, None, &NoProgress).unwrap();
        assert_eq!(out.panel.names(), vec!["VIX", "CPI"]);
        assert_eq!(out.failed.len(), 1);
        assert_eq!(out.failed[0].name, "GONE");
        assert!(!out.is_complete());
    }

    #[test]
    fn missing_reference_fails_pipeline() {
        let mut config = config(vec![MacroSeriesConfig::fred("CPI", "CPIAUCSL")]);
        config.reference = MacroSeriesConfig::fred("REF", "MISSING");
        let err = build_macro_panel_with(&config, &fixture, None, &NoProgress).unwrap_err();
        assert!(matches!(err, PipelineError::Reference { name, .. } if name == "REF"));
    }

    #[test]
    fn reference_outside_range_fails_pipeline() {
        let mut config = config(Vec::new());
        config.reference = MacroSeriesConfig::fred("CPI", "CPIAUCSL");
        config.start = d(2023, 1, 1);
        config.end = d(2023, 6, 30);
        let err = build_macro_panel_with(&config, &fixture, None, &NoProgress).unwrap_err();
        assert!(matches!(err, PipelineError::Reference { .. }));
    }

    #[test]
    fn series_are_renamed_to_config_names() {
        let config = config(vec![
            MacroSeriesConfig::new("SKEW", MacroSourceConfig::Synthetic)
                .with_align(AlignMode::Direct),
        ]);
        let out = build_macro_panel_with(&config, &fixture, None, &NoProgress).unwrap();
        assert_eq!(out.panel.names(), vec!["VIX", "SKEW"]);
        assert_eq!(out.series[1].align, AlignMode::Direct);
        // Same weekday calendar on both sides, so exact matches cover every day.
        assert_eq!(out.series[1].missing_days, 0);
    }
}
