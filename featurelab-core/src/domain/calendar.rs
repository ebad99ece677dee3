//! Trading calendar: the canonical date grid for macro alignment.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::bar::BarSeries;
use super::series::ExternalSeries;

/// Ordered set of distinct trading days.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TradingCalendar {
    dates: Vec<NaiveDate>,
}

impl TradingCalendar {
    /// Build from arbitrary dates; duplicates are collapsed and order sorted.
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let set: BTreeSet<NaiveDate> = dates.into_iter().collect();
        Self {
            dates: set.into_iter().collect(),
        }
    }

    /// Calendar of the days on which the reference series has a finite value.
    pub fn from_reference(reference: &ExternalSeries) -> Self {
        Self::from_dates(
            reference
                .observations
                .iter()
                .filter(|o| o.value.is_finite())
                .map(|o| o.date),
        )
    }

    /// Calendar of the days a cleaned bar series traded.
    pub fn from_bars(series: &BarSeries) -> Self {
        Self::from_dates(series.bars.iter().map(|b| b.date))
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}
