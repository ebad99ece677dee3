//! Relative Strength Index (RSI).
//!
//! Wilder-smoothed average gain and average loss of close-to-close changes.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Lookback: period.
//!
//! avg_loss == 0 maps to 100, including a perfectly flat series.

use super::atr::wilder_smooth;
use super::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut gains = vec![f64::NAN; n];
        let mut losses = vec![f64::NAN; n];

        for (i, pair) in bars.windows(2).enumerate() {
            let change = pair[1].close - pair[0].close;
            if change.is_nan() {
                continue;
            }
            gains[i + 1] = change.max(0.0);
            losses[i + 1] = (-change).max(0.0);
        }

        let avg_gain = wilder_smooth(&gains, self.period);
        let avg_loss = wilder_smooth(&losses, self.period);

        avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&g, &l)| rsi_from_averages(g, l))
            .collect()
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        f64::NAN
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
