//! Bollinger band width.
//!
//! middle = SMA(close, period), sd = population stddev over the same window,
//! upper/lower = middle +/- multiplier * sd, width = (upper - lower) / middle.
//! Lookback: period - 1. A zero middle band leaves the slot undefined.

use super::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct BollingerWidth {
    period: usize,
    multiplier: f64,
    name: String,
}

impl BollingerWidth {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            multiplier,
            name: format!("bb_width_{period}"),
        }
    }
}

impl Indicator for BollingerWidth {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = vec![f64::NAN; bars.len()];
        let p = self.period as f64;

        for (i, window) in bars.windows(self.period).enumerate() {
            let mean = window.iter().map(|b| b.close).sum::<f64>() / p;
            let variance = window
                .iter()
                .map(|b| (b.close - mean).powi(2))
                .sum::<f64>()
                / p;
            if mean == 0.0 {
                continue;
            }
            let sd = variance.sqrt();
            let upper = mean + self.multiplier * sd;
            let lower = mean - self.multiplier * sd;
            result[i + self.period - 1] = (upper - lower) / mean;
        }

        result
    }
}
