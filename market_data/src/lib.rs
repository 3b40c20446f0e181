//! # Market Data
//!
//! `market_data` acquires daily OHLCV (Open, High, Low, Close, Volume) bars
//! for a ticker over a date range.
//!
//! Every provider implements [`MarketDataProvider`]. Results pass through
//! [`acquire`], which validates the request and normalizes the bars (sorted,
//! one bar per date, non-empty). [`CachedProvider`] memoizes successful
//! acquisitions per `(ticker, start, end)`.
//!
//! ## Usage Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use market_data::{CachedProvider, FetchRequest, YahooProvider};
//!
//! let provider = YahooProvider::default();
//! let mut cache = CachedProvider::new(provider, 16);
//!
//! let request = FetchRequest::new(
//!     "AAPL",
//!     NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
//! );
//! let bars = cache.fetch(&request).unwrap();
//! println!("{} bars", bars.len());
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

pub mod cache;
pub mod csv_source;
pub mod synthetic;
pub mod yahoo;

pub use cache::CachedProvider;
pub use csv_source::CsvProvider;
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;

/// Errors that can occur while acquiring market data
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Invalid ticker: {0:?}")]
    InvalidTicker(String),

    #[error("Invalid date range: start {start} is not before end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("No data returned for {ticker} between {start} and {end}")]
    EmptyResult {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for market data operations
pub type Result<T> = std::result::Result<T, MarketDataError>;

/// Represents OHLCV (Open, High, Low, Close, Volume) data for a specific time period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvData {
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Volume
    pub volume: u64,
}

/// Daily OHLCV data with a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyOhlcv {
    /// Date of the data point
    pub date: NaiveDate,
    /// OHLCV data
    pub data: OhlcvData,
}

/// A request for daily bars of one ticker over `[start, end)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchRequest {
    pub ticker: String,
    pub start: NaiveDate,
    /// Exclusive upper bound
    pub end: NaiveDate,
}

impl FetchRequest {
    /// Build a request, normalizing the ticker to trimmed upper case
    pub fn new(ticker: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            start,
            end,
        }
    }

    /// Reject empty tickers and empty or inverted date ranges
    pub fn validate(&self) -> Result<()> {
        if self.ticker.is_empty()
            || !self
                .ticker
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=' | '_'))
        {
            return Err(MarketDataError::InvalidTicker(self.ticker.clone()));
        }

        if self.start >= self.end {
            return Err(MarketDataError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }

        Ok(())
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {})", self.ticker, self.start, self.end)
    }
}

/// A source of daily OHLCV bars
pub trait MarketDataProvider {
    /// Short provider name used in logs and reports
    fn name(&self) -> &str;

    /// Fetch raw daily bars for the request.
    ///
    /// Implementations may return bars unsorted or with duplicate dates;
    /// [`acquire`] normalizes them.
    fn fetch_daily(&self, request: &FetchRequest) -> Result<Vec<DailyOhlcv>>;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_daily(&self, request: &FetchRequest) -> Result<Vec<DailyOhlcv>> {
        (**self).fetch_daily(request)
    }
}

/// Validate the request, call the provider and normalize its bars
pub fn acquire<P: MarketDataProvider + ?Sized>(
    provider: &P,
    request: &FetchRequest,
) -> Result<Vec<DailyOhlcv>> {
    request.validate()?;
    let raw = provider.fetch_daily(request)?;
    debug!(
        provider = provider.name(),
        rows = raw.len(),
        "raw bars received for {}",
        request
    );

    let bars = normalize_bars(raw);
    if bars.is_empty() {
        return Err(MarketDataError::EmptyResult {
            ticker: request.ticker.clone(),
            start: request.start,
            end: request.end,
        });
    }

    Ok(bars)
}

/// Sort bars by date and keep the last bar seen for each date.
///
/// Bars with non-finite prices are dropped.
pub fn normalize_bars(mut bars: Vec<DailyOhlcv>) -> Vec<DailyOhlcv> {
    let before = bars.len();
    bars.retain(|bar| {
        let d = &bar.data;
        d.open.is_finite() && d.high.is_finite() && d.low.is_finite() && d.close.is_finite()
    });

    // Stable sort keeps provider order within a date, so the last one wins below.
    bars.sort_by_key(|bar| bar.date);

    let mut normalized: Vec<DailyOhlcv> = Vec::with_capacity(bars.len());
    for bar in bars {
        match normalized.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => normalized.push(bar),
        }
    }

    if normalized.len() != before {
        debug!(
            dropped = before - normalized.len(),
            "removed invalid or duplicate bars"
        );
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(y: i32, m: u32, d: u32, close: f64) -> DailyOhlcv {
        DailyOhlcv {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            data: OhlcvData {
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            },
        }
    }

    #[test]
    fn test_request_normalizes_ticker() {
        let request = FetchRequest::new("  aapl ", bar(2024, 1, 1, 0.0).date, bar(2024, 2, 1, 0.0).date);
        assert_eq!(request.ticker, "AAPL");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_rejects_inverted_range() {
        let request = FetchRequest::new("AAPL", bar(2024, 2, 1, 0.0).date, bar(2024, 1, 1, 0.0).date);
        assert!(matches!(
            request.validate(),
            Err(MarketDataError::InvalidRange { .. })
        ));

        let same_day = FetchRequest::new("AAPL", bar(2024, 1, 1, 0.0).date, bar(2024, 1, 1, 0.0).date);
        assert!(same_day.validate().is_err());
    }

    #[test]
    fn test_request_rejects_empty_ticker() {
        let request = FetchRequest::new("   ", bar(2024, 1, 1, 0.0).date, bar(2024, 2, 1, 0.0).date);
        assert!(matches!(
            request.validate(),
            Err(MarketDataError::InvalidTicker(_))
        ));
    }

    #[test]
    fn test_normalize_sorts_and_deduplicates() {
        let bars = vec![
            bar(2024, 1, 3, 3.0),
            bar(2024, 1, 1, 1.0),
            bar(2024, 1, 2, 2.0),
            bar(2024, 1, 2, 2.5),
        ];

        let normalized = normalize_bars(bars);

        assert_eq!(normalized.len(), 3);
        assert!(normalized.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(normalized[1].data.close, 2.5);
    }

    #[test]
    fn test_normalize_drops_non_finite() {
        let mut broken = bar(2024, 1, 2, 2.0);
        broken.data.close = f64::NAN;
        let normalized = normalize_bars(vec![bar(2024, 1, 1, 1.0), broken]);
        assert_eq!(normalized.len(), 1);
    }
}
