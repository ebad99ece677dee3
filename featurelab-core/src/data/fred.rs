//! FRED provider (St. Louis Fed) via the public `fredgraph.csv` endpoint.
//!
//! No API key is needed. The CSV has a date column followed by one value
//! column named after the series; `.` marks a missing observation.

use super::provider::{MacroDataProvider, ProviderError};
use crate::domain::ExternalSeries;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, info};

pub struct FredProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl FredProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url("https://fred.stlouisfed.org")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn graph_url(&self, id: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/graph/fredgraph.csv?id={id}&cosd={}&coed={}",
            self.base_url,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        )
    }
}

impl MacroDataProvider for FredProvider {
    fn name(&self) -> &str {
        "fred"
    }

    fn fetch_series(
        &self,
        id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ExternalSeries, ProviderError> {
        let url = self.graph_url(id, start, end);
        debug!(series = %id, %url, "requesting fredgraph");

        let resp = self.client.get(&url).send()?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::SymbolNotFound {
                symbol: id.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Network(format!("HTTP {status} for {id}")));
        }

        let series = parse_fredgraph(id, &resp.text()?)?;
        info!(series = %id, observations = series.len(), "fetched from fred");
        Ok(series)
    }
}

/// Parse a fredgraph CSV body. Missing (`.`) and blank values are skipped.
pub fn parse_fredgraph(id: &str, body: &str) -> Result<ExternalSeries, ProviderError> {
    let mut reader = csv::Reader::from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ProviderError::ResponseFormat(format!("{id}: {e}")))?;
    if headers.len() < 2 {
        return Err(ProviderError::ResponseFormat(format!(
            "{id}: expected a date and a value column, got {} column(s)",
            headers.len()
        )));
    }

    let mut pairs = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ProviderError::Parse(format!("{id}: {e}")))?;
        let (Some(date), Some(value)) = (record.get(0), record.get(1)) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() || value == "." {
            continue;
        }
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| {
            ProviderError::Parse(format!("{id} row {}: bad date {date:?}: {e}", line + 1))
        })?;
        let value: f64 = value.parse().map_err(|e| {
            ProviderError::Parse(format!("{id} row {}: bad value {value:?}: {e}", line + 1))
        })?;
        pairs.push((date, value));
    }

    Ok(ExternalSeries::from_pairs(id, pairs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_dot_values() {
        let body = "observation_date,DTB3\n2024-01-02,5.24\n2024-01-03,.\n2024-01-04,5.22\n";
        let series = parse_fredgraph("DTB3", body).unwrap();
        assert_eq!(series.name, "DTB3");
        assert_eq!(series.len(), 2);
        assert_eq!(series.observations[1].value, 5.22);
    }

    #[test]
    fn parse_legacy_date_header() {
        let body = "DATE,CPIAUCSL\n2024-01-01,308.417\n2024-02-01,310.326\n";
        let series = parse_fredgraph("CPIAUCSL", body).unwrap();
        assert_eq!(
            series.observations[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn parse_rejects_single_column() {
        let err = parse_fredgraph("X", "DATE\n2024-01-01\n").unwrap_err();
        assert!(matches!(err, ProviderError::ResponseFormat(_)));
    }

    #[test]
    fn parse_rejects_bad_value() {
        let err = parse_fredgraph("X", "DATE,X\n2024-01-01,abc\n").unwrap_err();
        assert!(matches!(err, ProviderError::Parse(_)));
    }

    #[test]
    fn graph_url_carries_range() {
        let provider = FredProvider::with_base_url("http://localhost").unwrap();
        let url = provider.graph_url(
            "GS10",
            NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
        );
        assert_eq!(
            url,
            "http://localhost/graph/fredgraph.csv?id=GS10&cosd=2010-01-01&coed=2025-05-01"
        );
    }
}
