//! featurelab runner: pipeline orchestration on top of `featurelab-core`.
//!
//! This crate provides:
//! - TOML pipeline configuration with defaults for the standard ETF/macro run
//! - Provider construction from config (CSV, Yahoo, FRED, synthetic)
//! - Per-asset clean and indicator fan-out with tagged per-item results
//! - Macro panel assembly against a reference calendar
//! - Run summaries with config hash and panel fingerprints

pub mod assets;
pub mod batch;
pub mod config;
pub mod macro_pipeline;
pub mod pipeline;
pub mod report;
pub mod sources;

pub use assets::{
    clean_asset, compute_indicators, download_assets, fetch_all, AssetOutput, CleanSummary,
    CleanedAsset,
};
pub use batch::{BatchOutcome, ItemFailure, PipelineError};
pub use config::{
    AssetSourceConfig, AssetsConfig, ConfigError, MacroConfig, MacroSeriesConfig,
    MacroSourceConfig, OutputConfig, PipelineConfig,
};
pub use macro_pipeline::{build_macro_panel, build_macro_panel_with, MacroOutput, SeriesSummary};
pub use pipeline::{run_pipeline, run_pipeline_with, MACRO_PANEL};
pub use report::{AssetRecord, MacroRecord, RunSummary, SCHEMA_VERSION, SUMMARY_FILE};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
        assert_send::<MacroSeriesConfig>();
        assert_sync::<MacroSeriesConfig>();
    }

    #[test]
    fn outputs_are_send_sync() {
        assert_send::<AssetOutput>();
        assert_sync::<AssetOutput>();
        assert_send::<MacroOutput>();
        assert_sync::<MacroOutput>();
        assert_send::<RunSummary>();
        assert_sync::<RunSummary>();
    }

    #[test]
    fn batch_types_are_send_sync() {
        assert_send::<BatchOutcome<AssetOutput>>();
        assert_sync::<BatchOutcome<AssetOutput>>();
        assert_send::<PipelineError>();
        assert_sync::<PipelineError>();
    }
}
