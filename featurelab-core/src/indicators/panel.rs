//! IndicatorPanel: the per-asset output of the indicator engine.

use crate::domain::panel::fingerprint_columns;
use crate::domain::PanelColumn;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date index plus named columns, all of the same length as the source series.
///
/// The first column is the source `close`; indicator columns follow in the
/// order the engine computed them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPanel {
    pub symbol: String,
    dates: Vec<NaiveDate>,
    columns: Vec<PanelColumn>,
}

impl IndicatorPanel {
    pub fn new(symbol: impl Into<String>, dates: Vec<NaiveDate>) -> Self {
        Self {
            symbol: symbol.into(),
            dates,
            columns: Vec::new(),
        }
    }

    /// Append a column computed with NaN padding.
    ///
    /// Panics if the column length differs from the date index; the engine
    /// only ever inserts same-length indicator output.
    pub fn insert(&mut self, name: impl Into<String>, values: &[f64]) {
        assert_eq!(
            values.len(),
            self.dates.len(),
            "indicator column length must match the date index"
        );
        self.columns.push(PanelColumn::from_nan_padded(name, values));
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[PanelColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&PanelColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Values of a named column.
    pub fn get(&self, name: &str) -> Option<&[Option<f64>]> {
        self.column(name).map(|c| c.values.as_slice())
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

    /// BLAKE3 hex digest of dates, column names and value bit patterns.
    pub fn fingerprint(&self) -> String {
        fingerprint_columns(&self.dates, &self.columns)
    }
}
