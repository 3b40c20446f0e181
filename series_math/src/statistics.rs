//! Column summary statistics

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution, Max, Min};

/// Descriptive statistics of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Number of non-missing observations
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two observations
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summarise the present values of a column, ignoring missing entries.
///
/// Returns `None` when the column has no present values.
pub fn describe<I>(values: I) -> Option<SummaryStats>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    if present.is_empty() {
        return None;
    }

    let count = present.len();
    let mut sorted = present.clone();
    sorted.sort_by(f64::total_cmp);
    let data = Data::new(present);

    let mean = data.mean()?;
    let std = if count > 1 { data.std_dev() } else { None };
    let min = data.min();
    let max = data.max();
    let q25 = quantile_linear(&sorted, 0.25);
    let median = quantile_linear(&sorted, 0.5);
    let q75 = quantile_linear(&sorted, 0.75);

    Some(SummaryStats {
        count,
        mean,
        std,
        min,
        q25,
        median,
        q75,
        max,
    })
}

/// Quantile of ascending `sorted` values, interpolating linearly between
/// the two closest ranks at position `q * (n - 1)`.
///
/// Returns NaN for an empty slice.
pub fn quantile_linear(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    let position = q.clamp(0.0, 1.0) * (n - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_describe_basic() {
        let stats = describe([1.0, 2.0, 3.0, 4.0, 5.0].map(Some)).unwrap();

        assert_eq!(stats.count, 5);
        assert_approx_eq!(stats.mean, 3.0);
        assert_approx_eq!(stats.std.unwrap(), 2.5_f64.sqrt());
        assert_approx_eq!(stats.min, 1.0);
        assert_approx_eq!(stats.median, 3.0);
        assert_approx_eq!(stats.max, 5.0);
        assert!(stats.q25 <= stats.median && stats.median <= stats.q75);
    }

    #[test]
    fn test_describe_quartiles_interpolate_linearly() {
        let stats = describe([4.0, 1.0, 3.0, 2.0].map(Some)).unwrap();

        assert_approx_eq!(stats.q25, 1.75);
        assert_approx_eq!(stats.median, 2.5);
        assert_approx_eq!(stats.q75, 3.25);
    }

    #[test]
    fn test_quantile_linear_endpoints() {
        let sorted = [10.0, 20.0, 30.0];
        assert_approx_eq!(quantile_linear(&sorted, 0.0), 10.0);
        assert_approx_eq!(quantile_linear(&sorted, 1.0), 30.0);
        assert_approx_eq!(quantile_linear(&sorted, 0.5), 20.0);
        assert!(quantile_linear(&[], 0.5).is_nan());
    }

    #[test]
    fn test_describe_skips_missing() {
        let stats = describe(vec![None, None, Some(4.0), Some(6.0)]).unwrap();
        assert_eq!(stats.count, 2);
        assert_approx_eq!(stats.mean, 5.0);
    }

    #[test]
    fn test_describe_single_value_has_no_std() {
        let stats = describe(vec![Some(7.0)]).unwrap();
        assert_eq!(stats.count, 1);
        assert!(stats.std.is_none());
    }

    #[test]
    fn test_describe_empty() {
        assert!(describe(Vec::<Option<f64>>::new()).is_none());
        assert!(describe(vec![None, None]).is_none());
    }
}
