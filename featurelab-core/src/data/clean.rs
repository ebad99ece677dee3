//! DataCleaner: the schema boundary between providers and the indicator engine.
//!
//! Resolves the required columns, coerces every required cell to a number
//! (or date), drops rows that fail coercion as a whole, sorts by date and
//! resolves duplicate dates by keeping the last occurrence.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Bar, BarSeries, RawFrame, RawValue};

/// Numeric columns every bar source must provide.
pub const REQUIRED_FIELDS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Accepted names for the date column, in order of preference.
const DATE_FIELDS: [&str; 3] = ["date", "timestamp", "datetime"];

/// Fatal cleaning failure for one asset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CleanError {
    #[error("{symbol}: missing required field '{field}'")]
    MissingField { symbol: String, field: String },
}

/// A row dropped because one of its required cells is not numeric.
///
/// Non-fatal: the row is removed and the report keeps this as a diagnostic.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("row {row}: field '{field}' could not be coerced from {value}")]
pub struct CoercionError {
    pub row: usize,
    pub field: String,
    pub value: String,
}

/// Result of cleaning one asset.
#[derive(Debug, Clone)]
pub struct CleanReport {
    pub series: BarSeries,
    pub dropped: Vec<CoercionError>,
    pub duplicates_removed: usize,
    pub anomalies: Vec<AnomalyReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub anomaly_type: AnomalyType,
    pub count: usize,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyType {
    ZeroVolume,
    InconsistentRange,
    NonPositivePrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
}

/// Cleaner for raw bar frames.
pub struct DataCleaner;

impl DataCleaner {
    /// Clean a raw frame into a well-formed series.
    pub fn clean(raw: &RawFrame) -> Result<BarSeries, CleanError> {
        Self::clean_with_report(raw).map(|report| report.series)
    }

    /// Clean a raw frame and keep the diagnostics.
    pub fn clean_with_report(raw: &RawFrame) -> Result<CleanReport, CleanError> {
        let date_idx = resolve_date_column(&raw.columns).ok_or_else(|| CleanError::MissingField {
            symbol: raw.symbol.clone(),
            field: "date".into(),
        })?;

        let mut field_idx = [0usize; 5];
        for (slot, field) in field_idx.iter_mut().zip(REQUIRED_FIELDS) {
            *slot = resolve_column(&raw.columns, field).ok_or_else(|| CleanError::MissingField {
                symbol: raw.symbol.clone(),
                field: field.into(),
            })?;
        }

        let mut dropped = Vec::new();
        let mut rows: Vec<Bar> = Vec::with_capacity(raw.height());

        'rows: for row in 0..raw.height() {
            let date_cell = raw.cell(row, date_idx);
            let Some(date) = coerce_date(date_cell) else {
                dropped.push(CoercionError {
                    row,
                    field: "date".into(),
                    value: date_cell.describe(),
                });
                continue;
            };

            let mut values = [0.0f64; 5];
            for ((value, &idx), field) in values.iter_mut().zip(&field_idx).zip(REQUIRED_FIELDS) {
                let cell = raw.cell(row, idx);
                match coerce_number(cell) {
                    Some(v) => *value = v,
                    None => {
                        dropped.push(CoercionError {
                            row,
                            field: field.into(),
                            value: cell.describe(),
                        });
                        continue 'rows;
                    }
                }
            }

            let [open, high, low, close, volume] = values;
            rows.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        // Stable sort: equal dates stay in original order, so the last one wins below.
        rows.sort_by_key(|b| b.date);

        let mut bars: Vec<Bar> = Vec::with_capacity(rows.len());
        let mut duplicates_removed = 0;
        for bar in rows {
            match bars.last_mut() {
                Some(prev) if prev.date == bar.date => {
                    *prev = bar;
                    duplicates_removed += 1;
                }
                _ => bars.push(bar),
            }
        }

        for err in &dropped {
            debug!(symbol = %raw.symbol, "dropped {err}");
        }
        if !dropped.is_empty() {
            warn!(
                symbol = %raw.symbol,
                dropped = dropped.len(),
                kept = bars.len(),
                "rows dropped during coercion"
            );
        }

        let series = BarSeries::new(raw.symbol.clone(), bars);
        let anomalies = Self::detect_anomalies(&series);
        for anomaly in &anomalies {
            warn!(
                symbol = %series.symbol,
                kind = ?anomaly.anomaly_type,
                count = anomaly.count,
                "data anomaly"
            );
        }

        Ok(CleanReport {
            series,
            dropped,
            duplicates_removed,
            anomalies,
        })
    }

    /// Detect suspicious but well-formed bars. Reported only; never used to drop rows.
    pub fn detect_anomalies(series: &BarSeries) -> Vec<AnomalyReport> {
        let mut anomalies = Vec::new();

        let zero_volume = series.bars.iter().filter(|b| b.volume == 0.0).count();
        if zero_volume > 0 {
            anomalies.push(AnomalyReport {
                anomaly_type: AnomalyType::ZeroVolume,
                count: zero_volume,
                severity: Severity::Info,
            });
        }

        let inconsistent = series.bars.iter().filter(|b| !b.is_consistent()).count();
        if inconsistent > 0 {
            anomalies.push(AnomalyReport {
                anomaly_type: AnomalyType::InconsistentRange,
                count: inconsistent,
                severity: Severity::Warning,
            });
        }

        let non_positive = series
            .bars
            .iter()
            .filter(|b| b.open <= 0.0 || b.high <= 0.0 || b.low <= 0.0 || b.close <= 0.0)
            .count();
        if non_positive > 0 {
            anomalies.push(AnomalyReport {
                anomaly_type: AnomalyType::NonPositivePrice,
                count: non_positive,
                severity: Severity::Warning,
            });
        }

        anomalies
    }
}

/// Find a column by name: exact (case-insensitive) match first, then a
/// flattened multi-level header such as `Close_SPY`.
fn resolve_column(columns: &[String], field: &str) -> Option<usize> {
    let normalized: Vec<String> = columns
        .iter()
        .map(|c| c.trim().to_ascii_lowercase())
        .collect();
    normalized.iter().position(|c| c == field).or_else(|| {
        normalized.iter().position(|c| {
            c.strip_prefix(field)
                .is_some_and(|rest| rest.starts_with('_'))
        })
    })
}

fn resolve_date_column(columns: &[String]) -> Option<usize> {
    DATE_FIELDS
        .iter()
        .find_map(|field| resolve_column(columns, field))
}

fn coerce_number(cell: &RawValue) -> Option<f64> {
    let v = match cell {
        RawValue::Number(v) => *v,
        RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        RawValue::Missing => return None,
    };
    v.is_finite().then_some(v)
}

pub(crate) fn coerce_date(cell: &RawValue) -> Option<NaiveDate> {
    let RawValue::Text(s) = cell else {
        return None;
    };
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z").map(|dt| dt.date_naive()))
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(columns: &[&str], rows: Vec<Vec<RawValue>>) -> RawFrame {
        RawFrame {
            symbol: "SPY".into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    fn row(date: &str, close: f64) -> Vec<RawValue> {
        vec![
            date.into(),
            (close - 1.0).into(),
            (close + 1.0).into(),
            (close - 2.0).into(),
            close.into(),
            1000.0.into(),
        ]
    }

    const COLS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

    #[test]
    fn clean_sorts_by_date() {
        let raw = frame(
            &COLS,
            vec![row("2024-01-04", 3.0), row("2024-01-02", 1.0), row("2024-01-03", 2.0)],
        );
        let series = DataCleaner::clean(&raw).unwrap();
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
        assert!(series.is_well_formed());
    }

    #[test]
    fn duplicate_dates_keep_last_occurrence() {
        let raw = frame(
            &COLS,
            vec![row("2024-01-02", 1.0), row("2024-01-03", 2.0), row("2024-01-02", 9.0)],
        );
        let report = DataCleaner::clean_with_report(&raw).unwrap();
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.series.closes(), vec![9.0, 2.0]);
    }

    #[test]
    fn missing_field_is_fatal() {
        let raw = frame(&["Date", "Open", "High", "Low", "Close"], vec![]);
        let err = DataCleaner::clean(&raw).unwrap_err();
        assert_eq!(
            err,
            CleanError::MissingField {
                symbol: "SPY".into(),
                field: "volume".into()
            }
        );
        assert!(err.to_string().contains("SPY"));
    }

    #[test]
    fn missing_date_column_is_fatal() {
        let raw = frame(&["Open", "High", "Low", "Close", "Volume"], vec![]);
        assert!(matches!(
            DataCleaner::clean(&raw),
            Err(CleanError::MissingField { field, .. }) if field == "date"
        ));
    }

    #[test]
    fn uncoercible_row_is_dropped_whole() {
        let mut bad = row("2024-01-03", 2.0);
        bad[2] = "n/a".into();
        let raw = frame(&COLS, vec![row("2024-01-02", 1.0), bad, row("2024-01-04", 3.0)]);
        let report = DataCleaner::clean_with_report(&raw).unwrap();
        assert_eq!(report.series.len(), 2);
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(report.dropped[0].row, 1);
        assert_eq!(report.dropped[0].field, "high");
    }

    #[test]
    fn non_finite_and_missing_cells_drop_row() {
        let mut inf = row("2024-01-03", 2.0);
        inf[4] = RawValue::Number(f64::INFINITY);
        let mut missing = row("2024-01-04", 3.0);
        missing[5] = RawValue::Missing;
        let mut bad_date = row("Jan 5", 4.0);
        bad_date[0] = "not a date".into();
        let raw = frame(&COLS, vec![row("2024-01-02", 1.0), inf, missing, bad_date]);
        let series = DataCleaner::clean(&raw).unwrap();
        assert_eq!(series.closes(), vec![1.0]);
    }

    #[test]
    fn text_numbers_are_coerced() {
        let raw = frame(
            &COLS,
            vec![vec![
                "2024-01-02".into(),
                " 100.5 ".into(),
                "101".into(),
                "99".into(),
                "100".into(),
                "12345".into(),
            ]],
        );
        let series = DataCleaner::clean(&raw).unwrap();
        assert_eq!(series.bars[0].open, 100.5);
        assert_eq!(series.bars[0].volume, 12345.0);
    }

    #[test]
    fn extraneous_and_flattened_columns() {
        let raw = frame(
            &[
                "Date",
                "Close_SPY",
                "High_SPY",
                "Low_SPY",
                "Open_SPY",
                "Volume_SPY",
                "Ticker",
            ],
            vec![vec![
                "2024-01-02 00:00:00".into(),
                100.0.into(),
                101.0.into(),
                99.0.into(),
                99.5.into(),
                500.0.into(),
                "SPY".into(),
            ]],
        );
        let series = DataCleaner::clean(&raw).unwrap();
        assert_eq!(series.bars[0].close, 100.0);
        assert_eq!(series.bars[0].open, 99.5);
    }

    #[test]
    fn exact_column_preferred_over_flattened() {
        let raw = frame(
            &["date", "close_prev", "open", "high", "low", "close", "volume"],
            vec![vec![
                "2024-01-02".into(),
                1.0.into(),
                99.0.into(),
                101.0.into(),
                98.0.into(),
                100.0.into(),
                10.0.into(),
            ]],
        );
        let series = DataCleaner::clean(&raw).unwrap();
        assert_eq!(series.bars[0].close, 100.0);
    }

    #[test]
    fn accepts_common_date_formats() {
        for s in [
            "2024-01-02",
            "2024/01/02",
            "2024-01-02 00:00:00",
            "2024-01-02 00:00:00-05:00",
            "2024-01-02T14:30:00Z",
        ] {
            assert_eq!(
                coerce_date(&RawValue::from(s)),
                NaiveDate::from_ymd_opt(2024, 1, 2),
                "format {s}"
            );
        }
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let raw = frame(&COLS, vec![]);
        let series = DataCleaner::clean(&raw).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn clean_is_idempotent() {
        let raw = frame(
            &COLS,
            vec![row("2024-01-03", 2.0), row("2024-01-02", 1.0), row("2024-01-03", 5.0)],
        );
        let once = DataCleaner::clean(&raw).unwrap();
        let twice = DataCleaner::clean(&once.to_raw()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn detect_anomalies_flags_zero_volume() {
        let mut zero = row("2024-01-03", 101.0);
        zero[5] = 0.0.into();
        let raw = frame(&COLS, vec![row("2024-01-02", 100.0), zero]);
        let report = DataCleaner::clean_with_report(&raw).unwrap();
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].anomaly_type, AnomalyType::ZeroVolume);
        assert_eq!(report.anomalies[0].count, 1);
        // Reported only, not dropped
        assert_eq!(report.series.len(), 2);
    }
}
