//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV from Yahoo's v8 chart API with a single request per
//! symbol. Serves both asset bars and macro index levels (close only, e.g.
//! `^VIX`, `^SKEW`).
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. The CSV providers are the fallback when Yahoo is unavailable.

use super::provider::{MacroDataProvider, MarketDataProvider, ProviderError};
use crate::domain::{ExternalSeries, RawFrame, RawValue};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Column layout of frames produced by this provider.
const FRAME_COLUMNS: [&str; 7] = ["date", "open", "high", "low", "close", "volume", "adj_close"];

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url("https://query2.finance.yahoo.com")
    }

    /// Point the provider at a different host (mirrors, local fixtures).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Build the chart API URL for a symbol and date range.
    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive; include the whole end day
        let end_ts = (end + chrono::Duration::days(1))
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        let encoded = symbol.replace('^', "%5E");
        format!(
            "{}/v8/finance/chart/{encoded}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true",
            self.base_url
        )
    }

    fn request(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawFrame, ProviderError> {
        let url = self.chart_url(symbol, start, end);
        debug!(%symbol, %url, "requesting chart");

        let resp = self.client.get(&url).send()?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Network(format!("HTTP {status} for {symbol}")));
        }

        let body = resp.text()?;
        let frame = parse_chart(symbol, &body)?;
        info!(%symbol, rows = frame.height(), "fetched from yahoo");
        Ok(frame)
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawFrame, ProviderError> {
        self.request(symbol, start, end)
    }
}

impl MacroDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_series(
        &self,
        id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ExternalSeries, ProviderError> {
        let frame = self.request(id, start, end)?;
        Ok(close_series(&frame))
    }
}

/// Parse a chart API body into a raw frame.
///
/// Rows where every quote field is null (holidays, halted days) are skipped;
/// partially-null rows are kept with `Missing` cells for the cleaner to judge.
fn parse_chart(symbol: &str, body: &str) -> Result<RawFrame, ProviderError> {
    let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::ResponseFormat(format!("failed to parse response for {symbol}: {e}"))
    })?;

    let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
        Some(err) if err.code == "Not Found" => ProviderError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(err) => ProviderError::ResponseFormat(format!("{}: {}", err.code, err.description)),
        None => ProviderError::ResponseFormat("empty result with no error".into()),
    })?;

    let data = result
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::ResponseFormat("result array is empty".into()))?;

    // A valid symbol with no trading days in range has no timestamp array.
    let timestamps = data.timestamp.unwrap_or_default();

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::ResponseFormat("no quote data".into()))?;

    let adj_closes = data
        .indicators
        .adjclose
        .and_then(|v| v.into_iter().next())
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let at = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();

    let mut frame = RawFrame::new(
        symbol,
        FRAME_COLUMNS.iter().map(|c| c.to_string()).collect(),
    );
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| ProviderError::ResponseFormat(format!("invalid timestamp: {ts}")))?;

        let quote_row = [
            at(&quote.open, i),
            at(&quote.high, i),
            at(&quote.low, i),
            at(&quote.close, i),
            at(&quote.volume, i),
        ];
        if quote_row.iter().all(Option::is_none) {
            continue;
        }

        let mut row = Vec::with_capacity(FRAME_COLUMNS.len());
        row.push(RawValue::Text(date.format("%Y-%m-%d").to_string()));
        row.extend(quote_row.into_iter().map(RawValue::from));
        row.push(RawValue::from(at(&adj_closes, i)));
        frame.push_row(row);
    }

    Ok(frame)
}

/// Close column of a chart frame as an external series named after the symbol.
fn close_series(frame: &RawFrame) -> ExternalSeries {
    let pairs = (0..frame.height()).filter_map(|row| {
        let date = match frame.cell(row, 0) {
            RawValue::Text(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?,
            _ => return None,
        };
        match frame.cell(row, 4) {
            RawValue::Number(v) => Some((date, *v)),
            _ => None,
        }
    });
    ExternalSeries::from_pairs(frame.symbol.clone(), pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-02 and 2024-01-03 at 14:30 UTC, plus an all-null holiday row.
    const BODY: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open":   [470.0, 468.0, null],
                        "high":   [472.0, 469.5, null],
                        "low":    [467.5, 466.0, null],
                        "close":  [471.0, null,  null],
                        "volume": [1000000, 900000, null]
                    }],
                    "adjclose": [{ "adjclose": [465.0, null, null] }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parse_chart_rows() {
        let frame = parse_chart("SPY", BODY).unwrap();
        assert_eq!(frame.columns, FRAME_COLUMNS.map(String::from).to_vec());
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.cell(0, 0), &RawValue::Text("2024-01-02".into()));
        assert_eq!(frame.cell(0, 4), &RawValue::Number(471.0));
        assert_eq!(frame.cell(0, 5), &RawValue::Number(1_000_000.0));
        assert_eq!(frame.cell(1, 4), &RawValue::Missing);
    }

    #[test]
    fn parse_chart_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let err = parse_chart("NOPE", body).unwrap_err();
        assert!(matches!(err, ProviderError::SymbolNotFound { symbol } if symbol == "NOPE"));
    }

    #[test]
    fn parse_chart_garbage_is_format_error() {
        let err = parse_chart("SPY", "<html>").unwrap_err();
        assert!(matches!(err, ProviderError::ResponseFormat(_)));
    }

    #[test]
    fn close_series_skips_missing_closes() {
        let frame = parse_chart("^VIX", BODY).unwrap();
        let series = close_series(&frame);
        assert_eq!(series.name, "^VIX");
        assert_eq!(series.len(), 1);
        assert_eq!(series.observations[0].value, 471.0);
    }

    #[test]
    fn chart_url_encodes_caret_and_covers_end_day() {
        let provider = YahooProvider::with_base_url("http://localhost").unwrap();
        let url = provider.chart_url(
            "^VIX",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        );
        assert!(url.starts_with("http://localhost/v8/finance/chart/%5EVIX?"));
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1704240000"));
    }
}
