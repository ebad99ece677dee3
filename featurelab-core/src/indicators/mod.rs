//! Technical indicators over cleaned bar series.
//!
//! Every indicator implements [`Indicator`] and returns a NaN-padded series of
//! the same length as its input. [`IndicatorEngine`] runs the configured set
//! and assembles an [`IndicatorPanel`], turning warm-up NaN into `None`.
//!
//! Multi-series indicators (MACD) are exposed as separate named instances per
//! output, keeping the single-series `Indicator` trait unchanged.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod engine;
pub mod indicator;
pub mod macd;
pub mod obv;
pub mod panel;
pub mod roc;
pub mod rsi;
pub mod sma;

pub use atr::Atr;
pub use bollinger::BollingerWidth;
pub use ema::Ema;
pub use engine::{IndicatorConfig, IndicatorEngine, IndicatorError, WarmupPolicy};
pub use indicator::Indicator;
pub use macd::{Macd, MacdOutput};
pub use obv::Obv;
pub use panel::IndicatorPanel;
pub use roc::Roc;
pub use rsi::Rsi;
pub use sma::Sma;

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Bars from explicit (open, high, low, close) tuples, volume 1000.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            date: base_date + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
