//! Exponential Moving Average (EMA).
//!
//! Seed: SMA of the first `period` closes, placed at index period-1.
//! Then EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2/(period+1).

use super::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ema_of_series(&closes, self.period)
    }
}

/// EMA of an arbitrary series that may start with a NaN warm-up prefix.
///
/// The seed window starts at the first non-NaN value, which lets composed
/// indicators (the MACD signal line) smooth a series that has its own
/// warm-up. A NaN after the seed ends the recurrence.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return result;
    }

    let start = values.iter().position(|v| !v.is_nan()).unwrap_or(n);
    if n - start < period {
        return result;
    }

    let seed_end = start + period;
    let window = &values[start..seed_end];
    if window.iter().any(|v| v.is_nan()) {
        return result;
    }

    let seed = window.iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let alpha = 2.0 / (period as f64 + 1.0);
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
