//! Indicator engine: one cleaned bar series in, one indicator panel out.
//!
//! The indicator set is built once from an `IndicatorConfig` and applied to
//! each series independently. Column order is fixed:
//! close, sma, ema, macd line/signal/hist, rsi, roc, bb width, atr, obv.

use super::{Atr, BollingerWidth, Ema, Indicator, IndicatorPanel, Macd, Obv, Roc, Rsi, Sma};
use crate::domain::BarSeries;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// What to do when a series is too short for an indicator to produce any value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarmupPolicy {
    /// Emit an all-missing column.
    #[default]
    Lenient,
    /// Fail with `IndicatorError::InsufficientData`.
    Strict,
}

/// Indicator windows. Defaults match the standard daily feature set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub sma_window: usize,
    pub ema_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_window: usize,
    pub roc_window: usize,
    pub bollinger_window: usize,
    pub bollinger_multiplier: f64,
    pub atr_window: usize,
    pub warmup_policy: WarmupPolicy,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_window: 20,
            ema_window: 20,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_window: 14,
            roc_window: 12,
            bollinger_window: 20,
            bollinger_multiplier: 2.0,
            atr_window: 14,
            warmup_policy: WarmupPolicy::Lenient,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let windows = [
            ("sma_window", self.sma_window),
            ("ema_window", self.ema_window),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("rsi_window", self.rsi_window),
            ("roc_window", self.roc_window),
            ("bollinger_window", self.bollinger_window),
            ("atr_window", self.atr_window),
        ];
        for (field, value) in windows {
            if value == 0 {
                return Err(IndicatorError::InvalidConfig(format!(
                    "{field} must be >= 1"
                )));
            }
        }
        if !self.bollinger_multiplier.is_finite() || self.bollinger_multiplier < 0.0 {
            return Err(IndicatorError::InvalidConfig(format!(
                "bollinger_multiplier must be a non-negative number, got {}",
                self.bollinger_multiplier
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("{symbol}: {indicator} needs at least {required} bars, got {available}")]
    InsufficientData {
        symbol: String,
        indicator: String,
        required: usize,
        available: usize,
    },

    #[error("invalid indicator config: {0}")]
    InvalidConfig(String),
}

pub struct IndicatorEngine {
    indicators: Vec<Box<dyn Indicator>>,
    policy: WarmupPolicy,
}

impl IndicatorEngine {
    pub fn new(config: &IndicatorConfig) -> Result<Self, IndicatorError> {
        config.validate()?;
        let (f, s, sig) = (config.macd_fast, config.macd_slow, config.macd_signal);
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Sma::new(config.sma_window)),
            Box::new(Ema::new(config.ema_window)),
            Box::new(Macd::line(f, s, sig)),
            Box::new(Macd::signal(f, s, sig)),
            Box::new(Macd::histogram(f, s, sig)),
            Box::new(Rsi::new(config.rsi_window)),
            Box::new(Roc::new(config.roc_window)),
            Box::new(BollingerWidth::new(
                config.bollinger_window,
                config.bollinger_multiplier,
            )),
            Box::new(Atr::new(config.atr_window)),
            Box::new(Obv::new()),
        ];
        Ok(Self {
            indicators,
            policy: config.warmup_policy,
        })
    }

    pub fn indicators(&self) -> &[Box<dyn Indicator>] {
        &self.indicators
    }

    /// Column names in output order, `close` first.
    pub fn column_names(&self) -> Vec<String> {
        std::iter::once("close".to_string())
            .chain(self.indicators.iter().map(|i| i.name().to_string()))
            .collect()
    }

    /// Largest lookback across the indicator set.
    pub fn warmup(&self) -> usize {
        self.indicators.iter().map(|i| i.lookback()).max().unwrap_or(0)
    }

    pub fn compute(&self, series: &BarSeries) -> Result<IndicatorPanel, IndicatorError> {
        let n = series.len();
        let mut panel = IndicatorPanel::new(series.symbol.clone(), series.dates());
        panel.insert("close", &series.closes());

        for indicator in &self.indicators {
            let required = indicator.required_bars();
            if n < required {
                match self.policy {
                    WarmupPolicy::Strict => {
                        return Err(IndicatorError::InsufficientData {
                            symbol: series.symbol.clone(),
                            indicator: indicator.name().to_string(),
                            required,
                            available: n,
                        });
                    }
                    WarmupPolicy::Lenient => {
                        debug!(
                            symbol = %series.symbol,
                            indicator = indicator.name(),
                            required,
                            available = n,
                            "series shorter than warm-up, column left empty"
                        );
                    }
                }
            }

            let values = indicator.compute(&series.bars);
            debug_assert_eq!(
                values.len(),
                n,
                "indicator '{}' produced {} values for {} bars",
                indicator.name(),
                values.len(),
                n
            );
            panel.insert(indicator.name(), &values);
        }

        Ok(panel)
    }
}
