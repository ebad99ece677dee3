//! Indicator trait.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! Internally a warm-up slot is `f64::NAN`; the engine turns those into
//! explicit missing entries when it assembles the panel.

use crate::domain::Bar;

/// A windowed indicator over a cleaned bar series.
///
/// `compute` returns a `Vec<f64>` of the same length as `bars`, with
/// `f64::NAN` at every index before `lookback()`.
///
/// # Look-ahead guard
/// No value at bar t may depend on bar t+1 or later: computing on a prefix of
/// the series must reproduce the prefix of the full result.
pub trait Indicator: Send + Sync {
    /// Column name (e.g. "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Index of the first defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;

    /// Minimum series length for at least one defined value.
    fn required_bars(&self) -> usize {
        self.lookback() + 1
    }
}
