//! Forecasting models for price series

use crate::error::{ForecastError, Result};
use crate::metrics;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod sarima;

pub use sarima::{FitSummary, Order, SarimaModel, SeasonalOrder, TrainedSarima};

/// Forecast result containing predicted values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Point forecasts, one per step ahead
    values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
    /// Prediction intervals (optional)
    intervals: Option<Vec<(f64, f64)>>,
    /// Coverage of the prediction intervals
    confidence_level: Option<f64>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        Ok(Self {
            values,
            horizons,
            intervals: None,
            confidence_level: None,
        })
    }

    /// Create a new forecast result with prediction intervals
    pub fn new_with_intervals(
        values: Vec<f64>,
        horizons: usize,
        intervals: Vec<(f64, f64)>,
        confidence_level: f64,
    ) -> Result<Self> {
        let mut result = Self::new(values, horizons)?;

        if result.values.len() != intervals.len() {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match intervals length ({})",
                result.values.len(),
                intervals.len()
            )));
        }

        result.intervals = Some(intervals);
        result.confidence_level = Some(confidence_level);
        Ok(result)
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Get the prediction intervals, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }

    /// Coverage of the prediction intervals, if available
    pub fn confidence_level(&self) -> Option<f64> {
        self.confidence_level
    }

    /// Split into the first `mid` steps and the remainder
    pub fn split_at(&self, mid: usize) -> Result<(Self, Self)> {
        if mid > self.horizons {
            return Err(ForecastError::ValidationError(format!(
                "Cannot split a {}-step forecast at {}",
                self.horizons, mid
            )));
        }

        let (head, tail) = self.values.split_at(mid);
        let (head_intervals, tail_intervals) = match &self.intervals {
            Some(intervals) => {
                let (h, t) = intervals.split_at(mid);
                (Some(h.to_vec()), Some(t.to_vec()))
            }
            None => (None, None),
        };

        Ok((
            Self {
                values: head.to_vec(),
                horizons: head.len(),
                intervals: head_intervals,
                confidence_level: self.confidence_level,
            },
            Self {
                values: tail.to_vec(),
                horizons: tail.len(),
                intervals: tail_intervals,
                confidence_level: self.confidence_level,
            },
        ))
    }

    /// Calculate mean absolute error between forecast and actual values
    pub fn mean_absolute_error(&self, actual: &[f64]) -> Result<f64> {
        self.check_length(actual)?;
        Ok(metrics::mean_absolute_error(actual, &self.values))
    }

    /// Calculate mean squared error between forecast and actual values
    pub fn mean_squared_error(&self, actual: &[f64]) -> Result<f64> {
        self.check_length(actual)?;
        Ok(metrics::mean_squared_error(actual, &self.values))
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn check_length(&self, actual: &[f64]) -> Result<()> {
        if self.values.len() != actual.len() || actual.is_empty() {
            return Err(ForecastError::ValidationError(format!(
                "Forecast length ({}) doesn't match actual length ({})",
                self.values.len(),
                actual.len()
            )));
        }
        Ok(())
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Generate forecast for future periods
    fn forecast(&self, horizons: usize) -> Result<ForecastResult>;

    /// One-step-ahead residuals over the training data
    fn residuals(&self) -> &[f64];

    /// Estimation summary, for models that produce one
    fn fit_summary(&self) -> Option<&FitSummary> {
        None
    }

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a series of observations
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on a series
    fn train(&self, data: &[f64]) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(ForecastResult::new(vec![1.0, 2.0], 3).is_err());
        assert!(ForecastResult::new_with_intervals(vec![1.0], 1, vec![], 0.95).is_err());
    }

    #[test]
    fn test_split_at_keeps_intervals_aligned() {
        let result = ForecastResult::new_with_intervals(
            vec![1.0, 2.0, 3.0],
            3,
            vec![(0.5, 1.5), (1.0, 3.0), (1.5, 4.5)],
            0.9,
        )
        .unwrap();

        let (head, tail) = result.split_at(1).unwrap();
        assert_eq!(head.values(), &[1.0]);
        assert_eq!(tail.values(), &[2.0, 3.0]);
        assert_eq!(tail.intervals().unwrap()[0], (1.0, 3.0));
        assert_eq!(tail.confidence_level(), Some(0.9));
        assert!(result.split_at(4).is_err());
    }

    #[test]
    fn test_errors_against_actual() {
        let forecast = ForecastResult::new(vec![105.0, 106.0, 107.0], 3).unwrap();
        let actual = [106.0, 107.0, 108.0];

        assert_approx_eq!(forecast.mean_absolute_error(&actual).unwrap(), 1.0);
        assert_approx_eq!(forecast.mean_squared_error(&actual).unwrap(), 1.0);
        assert!(forecast.mean_absolute_error(&actual[..2]).is_err());
    }
}
