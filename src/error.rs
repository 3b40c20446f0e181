//! Error types for the dashboard

use thiserror::Error;

/// Errors that can occur while building a dashboard report
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Market data error: {0}")]
    MarketData(#[from] market_data::MarketDataError),

    #[error("Series error: {0}")]
    Math(#[from] series_math::MathError),

    #[error("Forecast error: {0}")]
    Forecast(#[from] price_forecast::ForecastError),

    #[error("Table error: {0}")]
    Table(#[from] polars::prelude::PolarsError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;
