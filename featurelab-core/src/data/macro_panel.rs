//! Macro panel assembly from already-aligned series.

use crate::domain::panel::fingerprint_columns;
use crate::domain::{AlignedSeries, PanelColumn, TradingCalendar};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    #[error("series {series} has {actual} values, calendar has {expected}")]
    AlignmentMismatch {
        series: String,
        expected: usize,
        actual: usize,
    },

    #[error("series {series} appears more than once")]
    DuplicateSeries { series: String },
}

/// Calendar dates plus one column per series, in caller order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroPanel {
    dates: Vec<NaiveDate>,
    columns: Vec<PanelColumn>,
}

impl MacroPanel {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[PanelColumn] {
        &self.columns
    }

    pub fn get(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn fingerprint(&self) -> String {
        fingerprint_columns(&self.dates, &self.columns)
    }
}

pub struct MacroPanelBuilder;

impl MacroPanelBuilder {
    /// Zip aligned series into one panel keyed by `calendar`.
    ///
    /// Every series must already have exactly one value per calendar day;
    /// nothing is truncated or padded here.
    pub fn build(
        calendar: &TradingCalendar,
        aligned: &[AlignedSeries],
    ) -> Result<MacroPanel, PanelError> {
        let expected = calendar.len();
        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(aligned.len());

        for series in aligned {
            if series.len() != expected {
                return Err(PanelError::AlignmentMismatch {
                    series: series.name.clone(),
                    expected,
                    actual: series.len(),
                });
            }
            if !seen.insert(series.name.as_str()) {
                return Err(PanelError::DuplicateSeries {
                    series: series.name.clone(),
                });
            }
            columns.push(PanelColumn::new(series.name.clone(), series.values.clone()));
        }

        Ok(MacroPanel {
            dates: calendar.dates().to_vec(),
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cal(n: usize) -> TradingCalendar {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        TradingCalendar::from_dates((0..n).map(|i| base + chrono::Duration::days(i as i64)))
    }

    #[test]
    fn build_keeps_caller_order() {
        let panel = MacroPanelBuilder::build(
            &cal(2),
            &[
                AlignedSeries::new("VIX", vec![Some(13.0), Some(14.0)]),
                AlignedSeries::new("CPI", vec![None, Some(310.0)]),
            ],
        )
        .unwrap();

        assert_eq!(panel.names(), vec!["VIX", "CPI"]);
        assert_eq!(panel.len(), 2);
        assert_eq!(panel.get("CPI").unwrap(), &[None, Some(310.0)]);
        assert_eq!(panel.dates(), cal(2).dates());
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = MacroPanelBuilder::build(
            &cal(3),
            &[
                AlignedSeries::new("VIX", vec![Some(1.0); 3]),
                AlignedSeries::new("GS10", vec![Some(4.0); 2]),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            PanelError::AlignmentMismatch {
                series: "GS10".into(),
                expected: 3,
                actual: 2,
            }
        );
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let err = MacroPanelBuilder::build(
            &cal(1),
            &[
                AlignedSeries::new("VIX", vec![Some(1.0)]),
                AlignedSeries::new("VIX", vec![Some(2.0)]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, PanelError::DuplicateSeries { series } if series == "VIX"));
    }

    #[test]
    fn empty_inputs() {
        let panel = MacroPanelBuilder::build(&cal(0), &[]).unwrap();
        assert!(panel.is_empty());
        assert_eq!(panel.num_columns(), 0);
    }
}
