//! Utility functions for the price_forecast crate

use crate::error::{ForecastError, Result};

/// Index of the first test observation: `floor(len * train_ratio)`
pub fn split_index(len: usize, train_ratio: f64) -> Result<usize> {
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Train ratio must be in (0, 1), got {}",
            train_ratio
        )));
    }
    Ok((len as f64 * train_ratio).floor() as usize)
}

/// Split a series positionally into training and test parts
pub fn train_test_split<T>(data: &[T], train_ratio: f64) -> Result<(&[T], &[T])> {
    let index = split_index(data.len(), train_ratio)?;
    Ok(data.split_at(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_floors_training_length() {
        let data: Vec<f64> = (0..11).map(f64::from).collect();
        let (train, test) = train_test_split(&data, 0.8).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 3);
        assert_eq!(test[0], 8.0);
    }

    #[test]
    fn test_split_rejects_bad_ratio() {
        let data = [1.0, 2.0];
        assert!(train_test_split(&data, 0.0).is_err());
        assert!(train_test_split(&data, 1.0).is_err());
        assert!(train_test_split(&data, f64::NAN).is_err());
    }
}
