//! Deterministic synthetic data for offline runs, demos and benchmarks.
//!
//! Each symbol gets its own random walk seeded from the BLAKE3 hash of its
//! name, so the same symbol always produces the same history.

use super::provider::{MacroDataProvider, MarketDataProvider, ProviderError};
use crate::domain::{Bar, BarSeries, ExternalSeries, RawFrame};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawFrame, ProviderError> {
        Ok(synthetic_bars(symbol, start, end).to_raw())
    }
}

impl MacroDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    /// Weekday closes of the walk, e.g. a stand-in for an index level.
    fn fetch_series(
        &self,
        id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ExternalSeries, ProviderError> {
        let series = synthetic_bars(id, start, end);
        Ok(ExternalSeries::from_pairs(
            id,
            series.bars.iter().map(|b| (b.date, b.close)),
        ))
    }
}

fn rng_for(symbol: &str) -> StdRng {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    StdRng::from_seed(seed)
}

/// Weekday OHLCV random walk from `start` to `end` inclusive, starting at 100.
pub fn synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> BarSeries {
    let mut rng = rng_for(symbol);
    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64) as f64;

        bars.push(Bar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    BarSeries::new(symbol, bars)
}
