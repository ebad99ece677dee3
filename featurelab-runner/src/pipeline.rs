//! Full run: asset indicators, macro panel, run summary.

use anyhow::{Context, Result};
use tracing::{error, info};

use featurelab_core::data::{
    writer_for, FetchProgress, MacroDataProvider, MarketDataProvider, ProviderError,
};

use crate::assets::compute_indicators;
use crate::batch::ItemFailure;
use crate::config::{MacroSourceConfig, PipelineConfig};
use crate::macro_pipeline::build_macro_panel_with;
use crate::report::RunSummary;
use crate::sources;

/// Name under which a failed macro pipeline is reported.
pub const MACRO_PANEL: &str = "macro_panel";

/// Run both pipelines with providers built from the config.
pub fn run_pipeline(config: &PipelineConfig, progress: &dyn FetchProgress) -> Result<RunSummary> {
    let market = sources::market_provider(&config.assets.source)
        .context("failed to set up asset provider")?;
    run_pipeline_with(config, market.as_ref(), &sources::macro_provider, progress)
}

/// Run both pipelines and write every output plus `run_summary.json` under
/// the configured output directory.
///
/// Per-asset and per-series failures end up in the summary; only config and
/// summary-writing problems are returned as errors.
pub fn run_pipeline_with<R>(
    config: &PipelineConfig,
    market: &dyn MarketDataProvider,
    resolve: &R,
    progress: &dyn FetchProgress,
) -> Result<RunSummary>
where
    R: Fn(&MacroSourceConfig) -> Result<Box<dyn MacroDataProvider>, ProviderError>,
{
    config.validate()?;
    let config_hash = config.config_hash().context("failed to hash config")?;
    let writer = writer_for(config.output.format, &config.output.dir);
    let raw_writer = config.output.save_raw.then_some(writer.as_ref());

    info!(
        tickers = config.assets.tickers.len(),
        macro_series = config.macro_data.series.len() + 1,
        out = %config.output.dir.display(),
        %config_hash,
        "starting run"
    );

    let mut summary = RunSummary::new(config_hash);

    let assets = compute_indicators(
        market,
        &config.assets,
        &config.indicators,
        Some(writer.as_ref()),
        raw_writer,
        progress,
    )?;
    summary.record_assets(&assets);

    match build_macro_panel_with(&config.macro_data, resolve, Some(writer.as_ref()), progress) {
        Ok(output) => summary.record_macro(&output),
        Err(e) => {
            error!(error = %e, "macro pipeline failed");
            summary.record_failure(ItemFailure::new(MACRO_PANEL, &e));
        }
    }

    let path = summary.save(&config.output.dir)?;
    info!(
        path = %path.display(),
        assets = summary.assets.len(),
        failures = summary.failures.len(),
        "run finished"
    );
    Ok(summary)
}
