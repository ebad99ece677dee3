//! External (macro) series and their calendar-aligned form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One dated observation of an external series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

/// A named series at arbitrary frequency (daily, weekly, monthly, irregular).
///
/// Observations keep provider order. Duplicate dates are allowed; the later
/// entry wins when the series is aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalSeries {
    pub name: String,
    pub observations: Vec<Observation>,
}

impl ExternalSeries {
    pub fn new(name: impl Into<String>, observations: Vec<Observation>) -> Self {
        Self {
            name: name.into(),
            observations,
        }
    }

    /// Build from `(date, value)` pairs.
    pub fn from_pairs(
        name: impl Into<String>,
        pairs: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Self {
        Self::new(
            name,
            pairs
                .into_iter()
                .map(|(date, value)| Observation { date, value })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observations with a finite value, stably sorted by date.
    ///
    /// NaN/inf values are gaps in the source, not observations. The sort is
    /// stable, so among equal dates the original order is preserved and the
    /// last one is the latest.
    pub fn sorted_finite(&self) -> Vec<Observation> {
        let mut obs: Vec<Observation> = self
            .observations
            .iter()
            .copied()
            .filter(|o| o.value.is_finite())
            .collect();
        obs.sort_by_key(|o| o.date);
        obs
    }

    /// Keep only observations with `start <= date <= end`.
    pub fn clip(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            name: self.name.clone(),
            observations: self
                .observations
                .iter()
                .copied()
                .filter(|o| o.date >= start && o.date <= end)
                .collect(),
        }
    }
}

/// An external series reindexed onto a trading calendar.
///
/// `values[i]` belongs to calendar day `i`; `None` means no observation was
/// known yet on that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl AlignedSeries {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}
