//! Trailing moving averages over price columns
//!
//! `SimpleMovingAverage` is the streaming form; `rolling_mean` applies it to a
//! whole column and keeps row alignment, leaving the first `window - 1` rows
//! undefined.

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Simple Moving Average (SMA) implementation
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl SimpleMovingAverage {
    /// Create a new Simple Moving Average with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period + 1),
            sum: 0.0,
        })
    }

    /// Push a new observation, dropping the oldest one once the window is full
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.period {
            if let Some(old_value) = self.values.pop_front() {
                self.sum -= old_value;
            }
        }
    }

    /// Current average, or `None` until `period` values have been seen
    pub fn value(&self) -> Option<f64> {
        if self.values.len() < self.period {
            return None;
        }

        Some(self.sum / self.period as f64)
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the SMA, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
        self.sum = 0.0;
    }
}

/// Trailing mean of `values` over `window` rows, aligned with the input.
///
/// Row `i` holds the mean of `values[i + 1 - window..=i]`; rows with
/// fewer than `window` observations behind them are `None`.
pub fn rolling_mean(values: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    let mut sma = SimpleMovingAverage::new(window)?;

    Ok(values
        .iter()
        .map(|&value| {
            sma.update(value);
            sma.value()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_calculation() {
        let mut sma = SimpleMovingAverage::new(3).unwrap();

        assert!(sma.value().is_none());

        sma.update(2.0);
        sma.update(4.0);
        assert!(sma.value().is_none());

        sma.update(6.0);
        assert_eq!(sma.value(), Some(4.0)); // (2 + 4 + 6) / 3

        sma.update(8.0);
        assert_eq!(sma.value(), Some(6.0)); // window slides: (4 + 6 + 8) / 3
    }

    #[test]
    fn test_sma_reset() {
        let mut sma = SimpleMovingAverage::new(2).unwrap();
        sma.update(1.0);
        sma.update(3.0);
        assert_eq!(sma.value(), Some(2.0));

        sma.reset();
        assert!(sma.value().is_none());
        assert_eq!(sma.period(), 2);
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(SimpleMovingAverage::new(0).is_err());
        assert!(rolling_mean(&[1.0, 2.0], 0).is_err());
    }

    #[test]
    fn test_rolling_mean_alignment() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ma = rolling_mean(&values, 3).unwrap();

        assert_eq!(ma, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_rolling_mean_longer_window_than_data() {
        let ma = rolling_mean(&[10.0, 11.0], 30).unwrap();
        assert_eq!(ma, vec![None, None]);
    }
}
