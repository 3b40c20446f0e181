//! Metrics for evaluating forecast accuracy

use crate::error::{ForecastError, Result};
use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean absolute error. NaN when the inputs are empty or differ in length.
pub fn mean_absolute_error<T: Float>(actual: &[T], predicted: &[T]) -> T {
    mean_of(actual, predicted, |a, p| (a - p).abs())
}

/// Mean squared error. NaN when the inputs are empty or differ in length.
pub fn mean_squared_error<T: Float>(actual: &[T], predicted: &[T]) -> T {
    mean_of(actual, predicted, |a, p| (a - p) * (a - p))
}

pub fn root_mean_squared_error<T: Float>(actual: &[T], predicted: &[T]) -> T {
    mean_squared_error(actual, predicted).sqrt()
}

/// Mean absolute percentage error as a fraction; zero actuals are skipped
pub fn mean_absolute_percentage_error<T: Float>(actual: &[T], predicted: &[T]) -> T {
    if actual.len() != predicted.len() || actual.is_empty() {
        return T::nan();
    }

    let (sum, count) = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| !a.is_zero())
        .fold((T::zero(), 0usize), |(sum, count), (&a, &p)| {
            (sum + ((a - p) / a).abs(), count + 1)
        });

    match T::from(count) {
        Some(n) if count > 0 => sum / n,
        _ => T::nan(),
    }
}

fn mean_of<T: Float>(actual: &[T], predicted: &[T], f: impl Fn(T, T) -> T) -> T {
    if actual.len() != predicted.len() || actual.is_empty() {
        return T::nan();
    }

    let sum = actual
        .iter()
        .zip(predicted)
        .fold(T::zero(), |acc, (&a, &p)| acc + f(a, p));

    match T::from(actual.len()) {
        Some(n) => sum / n,
        None => T::nan(),
    }
}

/// Accuracy of a point forecast over a holdout window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    /// Fraction, not percent
    pub mape: f64,
}

/// Evaluate forecast accuracy against actual values
pub fn evaluate_forecast(forecast: &[f64], actual: &[f64]) -> Result<ForecastMetrics> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(ForecastError::ValidationError(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    Ok(ForecastMetrics {
        mae: mean_absolute_error(actual, forecast),
        mse: mean_squared_error(actual, forecast),
        rmse: root_mean_squared_error(actual, forecast),
        mape: mean_absolute_percentage_error(actual, forecast),
    })
}

impl fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Mean Absolute Error (MAE): {:.4}", self.mae)?;
        writeln!(f, "Mean Squared Error (MSE): {:.4}", self.mse)?;
        writeln!(f, "Root Mean Squared Error (RMSE): {:.4}", self.rmse)?;
        write!(f, "Mean Absolute Percentage Error (MAPE): {:.2}%", self.mape * 100.0)
    }
}
