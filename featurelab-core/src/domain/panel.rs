//! Named column shared by indicator and macro panels.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One named column of optional values; `None` marks a missing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl PanelColumn {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Build a column from a NaN-padded series; non-finite entries become `None`.
    pub fn from_nan_padded(name: impl Into<String>, values: &[f64]) -> Self {
        let values = values
            .iter()
            .map(|v| if v.is_finite() { Some(*v) } else { None })
            .collect();
        Self::new(name, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the first defined value, if any.
    pub fn first_valid_index(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }
}

/// BLAKE3 digest (hex) over a date index and its columns.
///
/// Values are hashed by bit pattern, so two panels share a fingerprint only if
/// they are bit-identical. Missing entries hash differently from any number.
pub(crate) fn fingerprint_columns(dates: &[NaiveDate], columns: &[PanelColumn]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(dates.len() as u64).to_le_bytes());
    for date in dates {
        hasher.update(&date.num_days_from_ce().to_le_bytes());
    }
    for column in columns {
        hasher.update(column.name.as_bytes());
        hasher.update(&[0]);
        for value in &column.values {
            match value {
                Some(v) => {
                    hasher.update(&[1]);
                    hasher.update(&v.to_bits().to_le_bytes());
                }
                None => {
                    hasher.update(&[0]);
                }
            }
        }
    }
    hasher.finalize().to_hex().to_string()
}
