//! Loosely-typed tabular input, as delivered by providers before cleaning.

use serde::{Deserialize, Serialize};

/// A single cell of provider output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    Missing,
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Short rendering for error messages.
    pub fn describe(&self) -> String {
        match self {
            RawValue::Missing => "<missing>".to_string(),
            RawValue::Number(v) => v.to_string(),
            RawValue::Text(s) => format!("{s:?}"),
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            RawValue::Missing
        } else {
            RawValue::Text(s.to_string())
        }
    }
}

impl From<Option<f64>> for RawValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(RawValue::Missing, RawValue::Number)
    }
}

/// Rows of raw cells for one symbol, with named columns.
///
/// Nothing about ordering, uniqueness or cell types is guaranteed, and extra
/// columns (e.g. `Adj Close`, `Ticker`) are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    pub symbol: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

impl RawFrame {
    pub fn new(symbol: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            symbol: symbol.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<RawValue>) {
        self.rows.push(row);
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Cell at (row, column); short rows read as missing.
    pub fn cell(&self, row: usize, column: usize) -> &RawValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&RawValue::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_missing() {
        assert_eq!(RawValue::from(""), RawValue::Missing);
        assert_eq!(RawValue::from("1.5"), RawValue::Text("1.5".into()));
    }

    #[test]
    fn short_rows_read_as_missing() {
        let mut frame = RawFrame::new("SPY", vec!["date".into(), "close".into()]);
        frame.push_row(vec![RawValue::from("2024-01-02")]);
        assert_eq!(frame.cell(0, 1), &RawValue::Missing);
        assert_eq!(frame.cell(5, 0), &RawValue::Missing);
    }
}
