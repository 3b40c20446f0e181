//! User-facing inputs of a dashboard run

use crate::error::{DashboardError, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use market_data::FetchRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Price field plotted in the metric chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Open,
    Close,
    High,
    Low,
    Volume,
}

impl Metric {
    /// Column name in the price table
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Open => "Open",
            Metric::Close => "Close",
            Metric::High => "High",
            Metric::Low => "Low",
            Metric::Volume => "Volume",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Which groups of sections a run produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Historical,
    Forecast,
    Both,
}

impl ViewMode {
    pub fn shows_historical(&self) -> bool {
        matches!(self, ViewMode::Historical | ViewMode::Both)
    }

    pub fn shows_forecast(&self) -> bool {
        matches!(self, ViewMode::Forecast | ViewMode::Both)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewMode::Historical => "Historical",
            ViewMode::Forecast => "Forecast",
            ViewMode::Both => "Both",
        };
        f.write_str(name)
    }
}

/// Immutable snapshot of the dashboard controls
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputParams {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub metric: Metric,
    pub view: ViewMode,
}

impl Default for InputParams {
    fn default() -> Self {
        Self {
            ticker: "AAPL".to_string(),
            start: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            metric: Metric::Close,
            view: ViewMode::Both,
        }
    }
}

impl InputParams {
    /// The acquisition request these inputs describe
    pub fn fetch_request(&self) -> FetchRequest {
        FetchRequest::new(&self.ticker, self.start, self.end)
    }

    /// Update one control by name, as typed at the interactive prompt
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "ticker" => self.ticker = value.to_string(),
            "start" => self.start = parse_date(value)?,
            "end" => self.end = parse_date(value)?,
            "metric" => {
                self.metric = Metric::from_str(value, true).map_err(DashboardError::InvalidParameter)?
            }
            "view" => {
                self.view = ViewMode::from_str(value, true).map_err(DashboardError::InvalidParameter)?
            }
            other => {
                return Err(DashboardError::InvalidParameter(format!(
                    "unknown control {:?} (expected ticker, start, end, metric or view)",
                    other
                )))
            }
        }
        Ok(())
    }

    /// Names of the controls that differ from `previous`
    pub fn changed_fields(&self, previous: &InputParams) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.ticker != previous.ticker {
            changed.push("ticker");
        }
        if self.start != previous.start {
            changed.push("start");
        }
        if self.end != previous.end {
            changed.push("end");
        }
        if self.metric != previous.metric {
            changed.push("metric");
        }
        if self.view != previous.view {
            changed.push("view");
        }
        changed
    }
}

impl fmt::Display for InputParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ticker={} start={} end={} metric={} view={}",
            self.ticker, self.start, self.end, self.metric, self.view
        )
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        DashboardError::InvalidParameter(format!("invalid date {:?}: {}", value, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_controls() {
        let mut params = InputParams::default();
        params.set("ticker", " msft ").unwrap();
        params.set("START", "2023-03-01").unwrap();
        params.set("metric", "volume").unwrap();
        params.set("view", "Forecast").unwrap();

        assert_eq!(params.ticker, "msft");
        assert_eq!(params.fetch_request().ticker, "MSFT");
        assert_eq!(params.start, NaiveDate::from_ymd_opt(2023, 3, 1).unwrap());
        assert_eq!(params.metric, Metric::Volume);
        assert_eq!(params.view, ViewMode::Forecast);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut params = InputParams::default();
        assert!(params.set("end", "31/12/2024").is_err());
        assert!(params.set("metric", "adjclose").is_err());
        assert!(params.set("colour", "red").is_err());
        assert_eq!(params, InputParams::default());
    }

    #[test]
    fn test_changed_fields() {
        let previous = InputParams::default();
        let mut current = previous.clone();
        assert!(current.changed_fields(&previous).is_empty());

        current.metric = Metric::High;
        current.end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(current.changed_fields(&previous), vec!["end", "metric"]);
    }

    #[test]
    fn test_view_gating() {
        assert!(ViewMode::Both.shows_historical() && ViewMode::Both.shows_forecast());
        assert!(!ViewMode::Historical.shows_forecast());
        assert!(!ViewMode::Forecast.shows_historical());
    }
}
