//! Rate of Change (ROC).
//!
//! ROC[t] = (close[t] - close[t-period]) / close[t-period] * 100
//! Lookback: period. A zero base close leaves the slot undefined.

use super::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    name: String,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ROC period must be >= 1");
        Self {
            period,
            name: format!("roc_{period}"),
        }
    }
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = vec![f64::NAN; bars.len()];
        for (i, pair) in bars.windows(self.period + 1).enumerate() {
            let base = pair[0].close;
            let curr = pair[self.period].close;
            if base != 0.0 {
                result[i + self.period] = (curr - base) / base * 100.0;
            }
        }
        result
    }
}
