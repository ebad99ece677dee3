//! On-Balance Volume (OBV).
//!
//! OBV[0] = 0; each later bar adds its volume on an up close, subtracts it on
//! a down close, and carries the total on an unchanged close.
//! Lookback: 0.

use super::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct Obv;

impl Obv {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Obv {
    fn name(&self) -> &str {
        "obv"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = Vec::with_capacity(bars.len());
        let mut total = 0.0;
        for (i, bar) in bars.iter().enumerate() {
            if i > 0 {
                let prev = bars[i - 1].close;
                if bar.close > prev {
                    total += bar.volume;
                } else if bar.close < prev {
                    total -= bar.volume;
                }
            }
            result.push(total);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn obv_accumulates_signed_volume() {
        let mut bars = make_bars(&[10.0, 11.0, 11.0, 9.0, 12.0]);
        for (bar, vol) in bars.iter_mut().zip([500.0, 100.0, 200.0, 300.0, 50.0]) {
            bar.volume = vol;
        }
        let result = Obv::new().compute(&bars);
        assert_eq!(result, vec![0.0, 100.0, 100.0, -200.0, -150.0]);
    }

    #[test]
    fn obv_first_value_is_zero() {
        let result = Obv::new().compute(&make_bars(&[42.0]));
        assert_eq!(result, vec![0.0]);
    }

    #[test]
    fn obv_empty() {
        assert!(Obv::new().compute(&[]).is_empty());
    }
}
