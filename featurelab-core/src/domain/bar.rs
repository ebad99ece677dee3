//! Bar and BarSeries: the cleaned per-asset market data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::raw::{RawFrame, RawValue};

/// OHLCV bar for a single symbol on a single trading day.
///
/// Volume is carried as `f64`: providers disagree on integer width and the
/// cleaner coerces every required field through the same numeric path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// True when all five numeric fields are finite.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }

    /// Basic OHLC consistency: high is the top of the range, low the bottom.
    pub fn is_consistent(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

/// Chronologically ordered bars for one symbol.
///
/// Produced by [`crate::data::clean::DataCleaner`]. After cleaning, dates are
/// strictly increasing and every numeric field is finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Bars with `start <= date <= end`.
    pub fn clip(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: self.symbol.clone(),
            bars: self
                .bars
                .iter()
                .copied()
                .filter(|b| b.date >= start && b.date <= end)
                .collect(),
        }
    }

    /// Check the post-clean invariant: strictly increasing dates, finite fields.
    pub fn is_well_formed(&self) -> bool {
        self.bars.iter().all(Bar::is_finite)
            && self.bars.windows(2).all(|w| w[0].date < w[1].date)
    }

    /// Convert back to a loosely-typed frame with the canonical column names.
    ///
    /// Feeding the result back through the cleaner yields the same series.
    pub fn to_raw(&self) -> RawFrame {
        let columns = ["date", "open", "high", "low", "close", "volume"]
            .iter()
            .map(|c| c.to_string())
            .collect();
        let rows = self
            .bars
            .iter()
            .map(|b| {
                vec![
                    RawValue::Text(b.date.format("%Y-%m-%d").to_string()),
                    RawValue::Number(b.open),
                    RawValue::Number(b.high),
                    RawValue::Number(b.low),
                    RawValue::Number(b.close),
                    RawValue::Number(b.volume),
                ]
            })
            .collect();
        RawFrame {
            symbol: self.symbol.clone(),
            columns,
            rows,
        }
    }
}
