//! # Series Math
//!
//! Numerical building blocks for daily price series.
//! This crate provides the trailing moving averages, additive seasonal
//! decomposition, column summary statistics and business-day calendar
//! arithmetic used by the dashboard pipeline.

use thiserror::Error;

pub mod calendar;
pub mod decomposition;
pub mod moving_averages;
pub mod statistics;

pub use calendar::{business_days_after, business_days_between, is_business_day, next_business_day};
pub use decomposition::{seasonal_decompose, DecompositionModel, SeasonalDecomposition};
pub use moving_averages::{rolling_mean, SimpleMovingAverage};
pub use statistics::{describe, quantile_linear, SummaryStats};

/// Errors that can occur in series calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for series math operations
pub type Result<T> = std::result::Result<T, MathError>;
