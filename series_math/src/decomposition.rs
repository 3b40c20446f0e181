//! Classical seasonal decomposition by moving averages
//!
//! The trend is a centred moving average over one full period (a 2×period
//! filter with half weights at both ends when the period is even), so the
//! first and last `period / 2` rows have no trend or residual. The seasonal
//! component is the per-phase mean of the detrended series, normalised to
//! zero mean (additive) or unit mean (multiplicative), and tiled over the
//! whole index.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// How the components combine into the observed series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecompositionModel {
    /// observed = trend + seasonal + residual
    Additive,
    /// observed = trend * seasonal * residual
    Multiplicative,
}

/// Trend, seasonal and residual components aligned with the input series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalDecomposition {
    pub period: usize,
    pub model: DecompositionModel,
    pub trend: Vec<Option<f64>>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<Option<f64>>,
}

impl SeasonalDecomposition {
    /// Number of rows in each component
    pub fn len(&self) -> usize {
        self.seasonal.len()
    }

    /// Whether the decomposition covers no rows
    pub fn is_empty(&self) -> bool {
        self.seasonal.is_empty()
    }
}

/// Decompose `values` into trend, seasonal and residual components.
///
/// Fails when the period is smaller than 2, when the series contains
/// non-finite values, or when it holds fewer than two complete cycles.
pub fn seasonal_decompose(
    values: &[f64],
    period: usize,
    model: DecompositionModel,
) -> Result<SeasonalDecomposition> {
    if period < 2 {
        return Err(MathError::InvalidInput(format!(
            "Decomposition period must be at least 2, got {}",
            period
        )));
    }

    if values.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Series contains missing or non-finite values".to_string(),
        ));
    }

    let n = values.len();
    if n < 2 * period {
        return Err(MathError::InsufficientData(format!(
            "Series must have 2 complete cycles, which requires {} observations; got {}",
            2 * period,
            n
        )));
    }

    if model == DecompositionModel::Multiplicative && values.iter().any(|&v| v <= 0.0) {
        return Err(MathError::InvalidInput(
            "Multiplicative decomposition requires strictly positive values".to_string(),
        ));
    }

    let trend = centred_moving_average(values, period);

    let detrended: Vec<Option<f64>> = values
        .iter()
        .zip(&trend)
        .map(|(&v, t)| {
            t.map(|t| match model {
                DecompositionModel::Additive => v - t,
                DecompositionModel::Multiplicative => v / t,
            })
        })
        .collect();

    let mut period_averages = Vec::with_capacity(period);
    for phase in 0..period {
        let phase_values: Vec<f64> = detrended
            .iter()
            .skip(phase)
            .step_by(period)
            .flatten()
            .copied()
            .collect();

        if phase_values.is_empty() {
            return Err(MathError::CalculationError(format!(
                "No detrended observations for seasonal phase {}",
                phase
            )));
        }

        period_averages.push(phase_values.iter().sum::<f64>() / phase_values.len() as f64);
    }

    let overall = period_averages.iter().sum::<f64>() / period as f64;
    for average in period_averages.iter_mut() {
        match model {
            DecompositionModel::Additive => *average -= overall,
            DecompositionModel::Multiplicative => *average /= overall,
        }
    }

    let seasonal: Vec<f64> = (0..n).map(|i| period_averages[i % period]).collect();

    let residual = values
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((&v, t), &s)| {
            t.map(|t| match model {
                DecompositionModel::Additive => v - t - s,
                DecompositionModel::Multiplicative => v / (t * s),
            })
        })
        .collect();

    Ok(SeasonalDecomposition {
        period,
        model,
        trend,
        seasonal,
        residual,
    })
}

/// Symmetric moving average spanning one full period
fn centred_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] = 0.5 / period as f64;
        w[period] = 0.5 / period as f64;
        w
    } else {
        vec![1.0 / period as f64; period]
    };

    let half = weights.len() / 2;
    let n = values.len();

    (0..n)
        .map(|i| {
            if i < half || i + half >= n {
                return None;
            }
            Some(
                weights
                    .iter()
                    .enumerate()
                    .map(|(j, w)| w * values[i + j - half])
                    .sum(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn pattern(period: usize) -> Vec<f64> {
        // zero-mean seasonal shape
        let raw: Vec<f64> = (0..period).map(|i| ((i * 7) % period) as f64).collect();
        let mean = raw.iter().sum::<f64>() / period as f64;
        raw.into_iter().map(|v| v - mean).collect()
    }

    #[test]
    fn test_recovers_linear_trend_and_even_period_pattern() {
        let period = 12;
        let shape = pattern(period);
        let values: Vec<f64> = (0..60)
            .map(|i| 100.0 + 0.5 * i as f64 + shape[i % period])
            .collect();

        let result = seasonal_decompose(&values, period, DecompositionModel::Additive).unwrap();

        assert_eq!(result.len(), values.len());
        for i in 0..values.len() {
            assert_approx_eq!(result.seasonal[i], shape[i % period], 1e-9);
            match result.trend[i] {
                Some(t) => {
                    assert_approx_eq!(t, 100.0 + 0.5 * i as f64, 1e-9);
                    assert_approx_eq!(result.residual[i].unwrap(), 0.0, 1e-9);
                }
                None => assert!(result.residual[i].is_none()),
            }
        }
    }

    #[test]
    fn test_edges_undefined_for_period_30() {
        let values: Vec<f64> = (0..90).map(|i| (i as f64 * 0.3).sin() + 50.0).collect();
        let result = seasonal_decompose(&values, 30, DecompositionModel::Additive).unwrap();

        assert!(result.trend[..15].iter().all(Option::is_none));
        assert!(result.trend[75..].iter().all(Option::is_none));
        assert!(result.trend[15..75].iter().all(Option::is_some));
        assert_approx_eq!(result.seasonal.iter().take(30).sum::<f64>(), 0.0, 1e-9);
    }

    #[test]
    fn test_odd_period_trend_window() {
        let values: Vec<f64> = (0..21).map(|i| i as f64).collect();
        let result = seasonal_decompose(&values, 7, DecompositionModel::Additive).unwrap();

        assert!(result.trend[2].is_none());
        assert_approx_eq!(result.trend[3].unwrap(), 3.0, 1e-12);
        assert_approx_eq!(result.trend[17].unwrap(), 17.0, 1e-12);
        assert!(result.trend[18].is_none());
    }

    #[test]
    fn test_too_short_series_fails() {
        let values = vec![1.0; 59];
        let err = seasonal_decompose(&values, 30, DecompositionModel::Additive).unwrap_err();
        assert!(matches!(err, MathError::InsufficientData(_)));
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let mut values = vec![1.0; 40];
        values[10] = f64::NAN;
        assert!(seasonal_decompose(&values, 4, DecompositionModel::Additive).is_err());
    }

    #[test]
    fn test_multiplicative_seasonal_has_unit_mean() {
        let values: Vec<f64> = (0..48)
            .map(|i| (10.0 + i as f64) * if i % 4 == 0 { 1.2 } else { 0.9333333333333333 })
            .collect();
        let result =
            seasonal_decompose(&values, 4, DecompositionModel::Multiplicative).unwrap();

        let mean = result.seasonal[..4].iter().sum::<f64>() / 4.0;
        assert_approx_eq!(mean, 1.0, 1e-12);
        assert!(result.seasonal[0] > 1.0);
    }

    #[test]
    fn test_multiplicative_rejects_non_positive() {
        let mut values = vec![5.0; 20];
        values[3] = 0.0;
        assert!(seasonal_decompose(&values, 4, DecompositionModel::Multiplicative).is_err());
    }
}
