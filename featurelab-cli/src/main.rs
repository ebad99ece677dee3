//! featurelab CLI: download, indicators, macro and run commands.
//!
//! Commands:
//! - `download`: fetch and clean asset bars, write them under `raw/`
//! - `indicators`: compute per-asset indicator panels under `indicators/`
//! - `macro`: build the aligned macro panel under `macro/`
//! - `run`: both pipelines plus `run_summary.json`
//!
//! Every command reads an optional TOML config; flags override it.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use featurelab_core::data::{writer_for, OutputFormat, StdoutProgress};
use featurelab_runner::{
    build_macro_panel, compute_indicators, download_assets, run_pipeline, sources,
    AssetSourceConfig, ItemFailure, PipelineConfig,
};

#[derive(Parser)]
#[command(
    name = "featurelab",
    about = "featurelab CLI: cleaned bars, technical indicators and aligned macro panels"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and clean asset bars and write them under raw/.
    Download {
        /// Tickers to fetch (e.g. SPY QQQ). Defaults to the config's tickers.
        tickers: Vec<String>,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Compute per-asset indicator panels.
    Indicators {
        /// Tickers to process. Defaults to the config's tickers.
        tickers: Vec<String>,

        /// Read bars from {DIR}/{SYMBOL}_data.csv instead of the configured source.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Build the macro panel aligned to the reference series' calendar.
    Macro {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Run the asset and macro pipelines and write a run summary.
    Run {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Path to a TOML config file. Defaults to the built-in ETF/macro setup.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start date (YYYY-MM-DD) for assets and macro series.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD) for assets and macro series.
    #[arg(long)]
    end: Option<String>,

    /// Output directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output format: csv or parquet.
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Replace every source with the seeded synthetic provider (offline).
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "featurelab=info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Download { tickers, common } => run_download(tickers, &common),
        Commands::Indicators {
            tickers,
            data_dir,
            common,
        } => run_indicators(tickers, data_dir, &common),
        Commands::Macro { common } => run_macro(&common),
        Commands::Run { common } => run_all(&common),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

/// Load the config (or defaults) and apply command-line overrides.
fn load_config(common: &CommonArgs, tickers: Vec<String>) -> Result<PipelineConfig> {
    let mut config = match &common.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(start) = common.start.as_deref() {
        let start = parse_date(start)?;
        config.assets.start = start;
        config.macro_data.start = start;
    }
    if let Some(end) = common.end.as_deref() {
        let end = parse_date(end)?;
        config.assets.end = end;
        config.macro_data.end = end;
    }
    if let Some(out) = &common.out {
        config.output.dir = out.clone();
    }
    if let Some(format) = common.format {
        config.output.format = format;
    }
    if !tickers.is_empty() {
        config.assets.tickers = tickers;
    }
    if common.synthetic {
        config.use_synthetic_sources();
    }

    config.validate()?;
    Ok(config)
}

fn report_failures(failures: &[ItemFailure]) {
    for failure in failures {
        eprintln!("Error for {}: {}", failure.name, failure.reason);
    }
}

fn run_download(tickers: Vec<String>, common: &CommonArgs) -> Result<()> {
    let config = load_config(common, tickers)?;
    let provider = sources::market_provider(&config.assets.source)?;
    let writer = writer_for(config.output.format, &config.output.dir);

    let outcome = download_assets(
        provider.as_ref(),
        &config.assets,
        Some(writer.as_ref()),
        &StdoutProgress,
    );

    for (symbol, asset) in &outcome.succeeded {
        println!(
            "{symbol}: {} bars kept, {} rows dropped, {} duplicates removed",
            asset.summary.rows_kept, asset.summary.rows_dropped, asset.summary.duplicates_removed
        );
        if let Some(path) = &asset.raw_path {
            println!("  saved to {}", path.display());
        }
    }

    if !outcome.is_complete() {
        report_failures(&outcome.failed);
        std::process::exit(1);
    }
    Ok(())
}

fn run_indicators(
    tickers: Vec<String>,
    data_dir: Option<PathBuf>,
    common: &CommonArgs,
) -> Result<()> {
    let mut config = load_config(common, tickers)?;
    if let Some(dir) = data_dir {
        config.assets.source = AssetSourceConfig::Csv { dir };
    }
    let provider = sources::market_provider(&config.assets.source)?;
    let writer = writer_for(config.output.format, &config.output.dir);

    let outcome = compute_indicators(
        provider.as_ref(),
        &config.assets,
        &config.indicators,
        Some(writer.as_ref()),
        None,
        &StdoutProgress,
    )?;

    for (symbol, output) in &outcome.succeeded {
        println!(
            "{symbol}: {} rows x {} columns",
            output.panel.len(),
            output.panel.num_columns()
        );
        if let Some(path) = &output.indicator_path {
            println!("  saved to {}", path.display());
        }
    }

    if !outcome.is_complete() {
        report_failures(&outcome.failed);
        std::process::exit(1);
    }
    Ok(())
}

fn run_macro(common: &CommonArgs) -> Result<()> {
    let config = load_config(common, Vec::new())?;
    let writer = writer_for(config.output.format, &config.output.dir);

    let output = build_macro_panel(&config.macro_data, Some(writer.as_ref()), &StdoutProgress)
        .context("macro pipeline failed")?;

    println!(
        "Macro panel: {} days x {} series",
        output.panel.len(),
        output.panel.num_columns()
    );
    for series in &output.series {
        println!(
            "  {:<10} {:>6} observations, {:>5} days before first value",
            series.name, series.observations, series.missing_days
        );
    }
    if let Some(path) = &output.path {
        println!("Saved macroeconomic indicators to {}", path.display());
    }

    if !output.is_complete() {
        report_failures(&output.failed);
        std::process::exit(1);
    }
    Ok(())
}

fn run_all(common: &CommonArgs) -> Result<()> {
    let config = load_config(common, Vec::new())?;
    let summary = run_pipeline(&config, &StdoutProgress)?;

    println!();
    println!("Assets:      {}", summary.assets.len());
    match &summary.macro_panel {
        Some(record) => println!(
            "Macro panel: {} days x {} series",
            record.days,
            record.series.len()
        ),
        None => println!("Macro panel: not built"),
    }
    println!("Config hash: {}", summary.config_hash);
    println!("Outputs in:  {}", config.output.dir.display());

    if !summary.is_complete() {
        report_failures(&summary.failures);
        std::process::exit(1);
    }
    Ok(())
}
