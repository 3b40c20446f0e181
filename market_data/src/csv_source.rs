//! Local CSV files as a market-data source
//!
//! Each ticker lives in `{dir}/{TICKER}.csv` with a header row naming the
//! columns Date, Open, High, Low, Close and Volume (any case). Extra columns
//! such as `Adj Close` are ignored.

use crate::{DailyOhlcv, FetchRequest, MarketDataError, MarketDataProvider, OhlcvData, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads daily bars from per-ticker CSV files
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

/// One row; headers are lowercased before matching
#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
}

impl CsvProvider {
    /// Serve tickers from files in `dir`
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the file holding `ticker`
    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker))
    }
}

/// Load every bar from a CSV file, skipping rows with missing prices
pub fn load_bars<P: AsRef<Path>>(path: P) -> Result<Vec<DailyOhlcv>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MarketDataError::Provider(format!(
            "No data file found at {}",
            path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let headers: csv::StringRecord = reader
        .headers()?
        .iter()
        .map(|name| name.to_lowercase())
        .collect();
    reader.set_headers(headers);

    let mut bars = Vec::new();
    for record in reader.deserialize::<CsvBar>() {
        let record = record?;
        let (Some(open), Some(high), Some(low), Some(close)) =
            (record.open, record.high, record.low, record.close)
        else {
            continue;
        };

        bars.push(DailyOhlcv {
            date: record.date,
            data: OhlcvData {
                open,
                high,
                low,
                close,
                volume: record.volume.unwrap_or(0.0).max(0.0).round() as u64,
            },
        });
    }

    debug!(rows = bars.len(), "loaded {}", path.display());
    Ok(bars)
}

impl MarketDataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_daily(&self, request: &FetchRequest) -> Result<Vec<DailyOhlcv>> {
        let bars = load_bars(self.path_for(&request.ticker))?;
        Ok(bars
            .into_iter()
            .filter(|bar| bar.date >= request.start && bar.date < request.end)
            .collect())
    }
}
