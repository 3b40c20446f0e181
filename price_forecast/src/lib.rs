//! # Price Forecast
//!
//! Seasonal ARIMA forecasting for daily price series.
//!
//! - `SarimaModel`: SARIMA(p,d,q)(P,D,Q,s) estimated by conditional sum of squares
//! - Holdout evaluation with MAE/MSE on the test window
//! - Dated out-of-sample forecasts on the business-day calendar
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use price_forecast::{run_holdout, HoldoutConfig, SarimaModel};
//!
//! # fn main() -> price_forecast::Result<()> {
//! let dates: Vec<NaiveDate> = Vec::new();
//! let closes: Vec<f64> = Vec::new();
//! let model = SarimaModel::from_orders([1, 1, 1], [1, 1, 1, 12])?;
//! let outcome = run_holdout(&model, &dates, &closes, &HoldoutConfig::default())?;
//! println!("{}", outcome.metrics);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod holdout;
pub mod metrics;
pub mod models;
pub mod optimize;
pub mod utils;

pub use crate::error::{ForecastError, Result};
pub use crate::holdout::{run_holdout, HoldoutConfig, HoldoutForecast};
pub use crate::metrics::{evaluate_forecast, ForecastMetrics};
pub use crate::models::{
    FitSummary, ForecastModel, ForecastResult, Order, SarimaModel, SeasonalOrder,
    TrainedForecastModel, TrainedSarima,
};
pub use crate::utils::{split_index, train_test_split};
