//! Yahoo Finance v8 chart endpoint
//!
//! The endpoint returns one nested document per ticker: a `timestamp` array
//! plus parallel per-field arrays under `indicators.quote[0]`. Entries for
//! non-trading rows come back as `null` and are skipped when the document is
//! flattened into [`DailyOhlcv`] records.

use crate::{DailyOhlcv, FetchRequest, MarketDataError, MarketDataProvider, OhlcvData, Result};
use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

/// Blocking client for the Yahoo Finance chart API
#[derive(Debug, Clone)]
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_USER_AGENT, Duration::from_secs(10))
            .unwrap_or_else(|_| Self {
                client: reqwest::blocking::Client::new(),
                base_url: DEFAULT_BASE_URL.to_string(),
            })
    }
}

impl YahooProvider {
    /// Create a provider against `base_url` with the given user agent and request timeout
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Chart URL for a ticker
    pub fn chart_url(&self, ticker: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, ticker)
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    fn fetch_daily(&self, request: &FetchRequest) -> Result<Vec<DailyOhlcv>> {
        let period1 = midnight_utc_timestamp(request.start);
        let period2 = midnight_utc_timestamp(request.end);

        let response = self
            .client
            .get(self.chart_url(&request.ticker))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        debug!(%status, bytes = body.len(), "chart response for {}", request.ticker);

        // Unknown tickers come back as 404 with a populated `chart.error`,
        // so the body is parsed before the status is judged.
        match parse_chart_response(&body) {
            Ok(bars) => Ok(bars
                .into_iter()
                .filter(|bar| bar.date >= request.start && bar.date < request.end)
                .collect()),
            Err(err) if !status.is_success() => {
                warn!(%status, "chart request failed: {}", err);
                Err(MarketDataError::Provider(format!(
                    "Yahoo Finance returned {} for {}: {}",
                    status, request.ticker, err
                )))
            }
            Err(err) => Err(err),
        }
    }
}

fn midnight_utc_timestamp(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
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

/// Flatten a chart API document into daily bars.
///
/// Dates are the exchange-local calendar dates of each bar. Rows with any
/// missing price are skipped; a missing volume becomes zero.
pub fn parse_chart_response(body: &str) -> Result<Vec<DailyOhlcv>> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.chart.error {
        return Err(MarketDataError::Provider(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| MarketDataError::Provider("chart response has no result".to_string()))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = result.meta.gmtoffset;

    let mut bars = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let field = |column: &[Option<f64>]| column.get(i).copied().flatten();

        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        ) else {
            skipped += 1;
            continue;
        };

        let date = DateTime::from_timestamp(ts + offset, 0)
            .ok_or_else(|| MarketDataError::InvalidData(format!("timestamp {} out of range", ts)))?
            .date_naive();

        let volume = field(&quote.volume).unwrap_or(0.0).max(0.0).round() as u64;

        bars.push(DailyOhlcv {
            date,
            data: OhlcvData {
                open,
                high,
                low,
                close,
                volume,
            },
        });
    }

    if skipped > 0 {
        debug!(
            symbol = result.meta.symbol.as_deref().unwrap_or("?"),
            skipped, "skipped rows with missing prices"
        );
    }

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"currency": "USD", "symbol": "AAPL", "gmtoffset": -18000},
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open": [187.15, 184.22, null],
                        "high": [188.44, 185.88, 183.09],
                        "low": [183.89, 183.43, 180.88],
                        "close": [185.64, 184.25, 181.91],
                        "volume": [82488700, 58414500, 71983600]
                    }],
                    "adjclose": [{"adjclose": [184.94, 183.55, 181.22]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_flattens_nested_columns() {
        let bars = parse_chart_response(SAMPLE).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].data.open, 187.15);
        assert_eq!(bars[0].data.volume, 82_488_700);
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[test]
    fn test_parse_reports_provider_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart_response(body).unwrap_err();

        match err {
            MarketDataError::Provider(msg) => assert!(msg.contains("Not Found")),
            other => panic!("Expected Provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_chart_response("<html>rate limited</html>"),
            Err(MarketDataError::Json(_))
        ));
    }

    #[test]
    fn test_parse_empty_result() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":0},"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse_chart_response(body).unwrap().is_empty());
    }

    #[test]
    fn test_chart_url() {
        let provider = YahooProvider::new("https://example.test/", "agent", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.chart_url("MSFT"), "https://example.test/v8/finance/chart/MSFT");
    }
}
