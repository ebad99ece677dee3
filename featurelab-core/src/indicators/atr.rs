//! Average True Range (ATR).
//!
//! TR[t] = max(high-low, |high-prev_close|, |low-prev_close|) for t >= 1.
//! The first bar has no previous close, so TR[0] is left undefined and the
//! Wilder seed is the mean of TR[1..=period].
//! Lookback: period.

use super::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        wilder_smooth(&true_range(bars), self.period)
    }
}

/// True range per bar. Index 0 is NaN.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = vec![f64::NAN; bars.len()];
    for (i, pair) in bars.windows(2).enumerate() {
        let prev_close = pair[0].close;
        let bar = &pair[1];
        tr[i + 1] = (bar.high - bar.low)
            .max((bar.high - prev_close).abs())
            .max((bar.low - prev_close).abs());
    }
    tr
}

/// Wilder smoothing (alpha = 1/period).
///
/// Seeds at the end of the first run of `period` consecutive defined values
/// with their mean. A NaN after the seed ends the recurrence.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    let mut run = 0usize;
    let mut seed_end = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            run = 0;
            continue;
        }
        run += 1;
        if run == period {
            seed_end = Some(i + 1);
            break;
        }
    }
    let Some(seed_end) = seed_end else {
        return result;
    };

    let seed = values[seed_end - period..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let alpha = 1.0 / period as f64;
    let mut prev = seed;
    for (i, &v) in values.iter().enumerate().skip(seed_end) {
        if v.is_nan() {
            break;
        }
        prev = alpha * v + (1.0 - alpha) * prev;
        result[i] = prev;
    }

    result
}
