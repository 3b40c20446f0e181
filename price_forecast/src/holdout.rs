//! Train/test holdout evaluation followed by a dated out-of-sample forecast

use crate::error::{ForecastError, Result};
use crate::metrics::{evaluate_forecast, ForecastMetrics};
use crate::models::{FitSummary, ForecastModel, ForecastResult, TrainedForecastModel};
use crate::utils::split_index;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use series_math::business_days_after;
use tracing::info;

/// How the series is partitioned and how far past it to forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldoutConfig {
    pub train_ratio: f64,
    /// Business days forecast beyond the last observation
    pub future_steps: usize,
}

impl Default for HoldoutConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.8,
            future_steps: 365,
        }
    }
}

/// Outcome of a holdout run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldoutForecast {
    pub model_name: String,
    pub train_dates: Vec<NaiveDate>,
    pub train: Vec<f64>,
    pub test_dates: Vec<NaiveDate>,
    pub test: Vec<f64>,
    /// Forecast over the test window, aligned with `test_dates`
    pub test_forecast: ForecastResult,
    pub future_dates: Vec<NaiveDate>,
    /// Forecast over `future_dates`
    pub future_forecast: ForecastResult,
    pub metrics: ForecastMetrics,
    pub fit: Option<FitSummary>,
}

/// Fit `model` on the leading `train_ratio` of `values`, score it on the
/// rest, and extend the same forecast `future_steps` business days past
/// the last observed date.
pub fn run_holdout<M: ForecastModel>(
    model: &M,
    dates: &[NaiveDate],
    values: &[f64],
    config: &HoldoutConfig,
) -> Result<HoldoutForecast> {
    if dates.len() != values.len() {
        return Err(ForecastError::DataError(format!(
            "{} dates for {} values",
            dates.len(),
            values.len()
        )));
    }

    let split = split_index(values.len(), config.train_ratio)?;
    if split == 0 || split == values.len() {
        return Err(ForecastError::InsufficientData {
            required: 2,
            actual: values.len(),
        });
    }
    let (train, test) = values.split_at(split);
    let (train_dates, test_dates) = dates.split_at(split);

    let trained = model.train(train)?;
    let forecast = trained.forecast(test.len() + config.future_steps)?;
    let (test_forecast, future_forecast) = forecast.split_at(test.len())?;
    let metrics = evaluate_forecast(test_forecast.values(), test)?;

    let last_date = dates[dates.len() - 1];
    let future_dates = business_days_after(last_date, config.future_steps);
    if future_dates.len() != future_forecast.horizons() {
        return Err(ForecastError::ForecastingError(format!(
            "Could not date {} future steps after {}",
            config.future_steps, last_date
        )));
    }

    info!(
        model = trained.name(),
        train = train.len(),
        test = test.len(),
        mae = metrics.mae,
        mse = metrics.mse,
        "holdout evaluation complete"
    );

    Ok(HoldoutForecast {
        model_name: trained.name().to_string(),
        train_dates: train_dates.to_vec(),
        train: train.to_vec(),
        test_dates: test_dates.to_vec(),
        test: test.to_vec(),
        test_forecast,
        future_dates,
        future_forecast,
        metrics,
        fit: trained.fit_summary().cloned(),
    })
}
