use approx::assert_relative_eq;
use assert_approx_eq::assert_approx_eq;
use price_forecast::{ForecastError, ForecastModel, SarimaModel, TrainedForecastModel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn ar1_random_walk(phi: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let mut level = 100.0;
    let mut change = 0.0;
    (0..n)
        .map(|_| {
            change = phi * change + noise.sample(&mut rng);
            level += change;
            level
        })
        .collect()
}

#[test]
fn test_random_walk_forecast_is_flat() {
    let data: Vec<f64> = (0..50).map(|t| 10.0 + 2.0 * t as f64).collect();
    let model = SarimaModel::from_orders([0, 1, 0], [0, 0, 0, 0]).unwrap();
    let trained = model.train(&data).unwrap();

    let forecast = trained.forecast(3).unwrap();
    for value in forecast.values() {
        assert_approx_eq!(*value, 108.0);
    }

    // sigma2 = mean squared difference = 4, so the interval grows with sqrt(h)
    assert_relative_eq!(trained.sigma2(), 4.0, epsilon = 1e-12);
    let intervals = forecast.intervals().unwrap();
    let z = 1.959964;
    assert_approx_eq!(intervals[0].1 - 108.0, z * 2.0, 1e-4);
    assert_approx_eq!(intervals[2].1 - 108.0, z * 2.0 * 3f64.sqrt(), 1e-4);
}

#[test]
fn test_seasonal_difference_repeats_pattern() {
    let pattern = [5.0, 7.0, 4.0, 9.0];
    let data: Vec<f64> = pattern.iter().cycle().take(40).copied().collect();
    let model = SarimaModel::from_orders([0, 0, 0], [0, 1, 0, 4]).unwrap();
    let trained = model.train(&data).unwrap();

    let forecast = trained.forecast(8).unwrap();
    for (i, value) in forecast.values().iter().enumerate() {
        assert_approx_eq!(*value, pattern[i % 4]);
    }
    assert_eq!(trained.fit_summary().unwrap().log_likelihood, None);
}

#[test]
fn test_recovers_ar_coefficient() {
    let data = ar1_random_walk(0.6, 1000, 7);
    let model = SarimaModel::from_orders([1, 1, 0], [0, 0, 0, 0]).unwrap();
    let trained = model.train(&data).unwrap();

    let summary = trained.fit_summary().unwrap();
    let phi = summary.coefficient("ar.L1").unwrap();
    assert!((phi - 0.6).abs() < 0.1, "estimated phi = {}", phi);
    assert!(summary.converged);
    assert!(summary.aic.is_some());
    assert_approx_eq!(trained.sigma2(), 1.0, 0.15);
}

fn ma1_random_walk(theta: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let mut level = 100.0;
    let mut previous = 0.0;
    (0..n)
        .map(|_| {
            let shock = noise.sample(&mut rng);
            level += shock + theta * previous;
            previous = shock;
            level
        })
        .collect()
}

#[test]
fn test_recovers_ma_coefficient_with_sign() {
    let data = ma1_random_walk(0.5, 1000, 3);
    let model = SarimaModel::from_orders([0, 1, 1], [0, 0, 0, 0]).unwrap();
    let trained = model.train(&data).unwrap();

    let theta = trained.fit_summary().unwrap().coefficient("ma.L1").unwrap();
    assert!((theta - 0.5).abs() < 0.1, "estimated theta = {}", theta);
    assert_approx_eq!(trained.sigma2(), 1.0, 0.15);
}

#[test]
fn test_default_seasonal_model_forecasts() {
    let data = ar1_random_walk(0.3, 300, 11);
    let model = SarimaModel::from_orders([1, 1, 1], [1, 1, 1, 12])
        .unwrap()
        .with_max_iterations(400);
    assert_eq!(model.name(), "SARIMA(1,1,1)(1,1,1,12)");

    let trained = model.train(&data).unwrap();
    let forecast = trained.forecast(30).unwrap();
    assert_eq!(forecast.horizons(), 30);
    assert_eq!(trained.residuals().len(), data.len() - 13);

    let intervals = forecast.intervals().unwrap();
    for (value, (lower, upper)) in forecast.values().iter().zip(intervals) {
        assert!(value.is_finite());
        assert!(lower <= value && value <= upper);
    }
    // Uncertainty grows with the horizon
    assert!(intervals[29].1 - intervals[29].0 > intervals[0].1 - intervals[0].0);

    let summary = trained.fit_summary().unwrap();
    for name in ["ar.L1", "ma.L1", "ar.S.L12", "ma.S.L12"] {
        let value = summary.coefficient(name).unwrap();
        assert!(value.abs() < 1.0, "{} = {}", name, value);
    }
}

#[test]
fn test_insufficient_data() {
    let model = SarimaModel::from_orders([1, 1, 1], [1, 1, 1, 12]).unwrap();
    let data = ar1_random_walk(0.0, 30, 1);

    match model.train(&data) {
        Err(ForecastError::InsufficientData { required, actual }) => {
            assert_eq!(required, 44);
            assert_eq!(actual, 30);
        }
        other => panic!("expected InsufficientData, got {:?}", other),
    }
}

#[test]
fn test_non_finite_input_rejected() {
    let model = SarimaModel::from_orders([1, 1, 0], [0, 0, 0, 0]).unwrap();
    let mut data = ar1_random_walk(0.0, 30, 1);
    data[10] = f64::NAN;
    assert!(matches!(model.train(&data), Err(ForecastError::DataError(_))));
}

#[test]
fn test_confidence_level_validation() {
    let model = SarimaModel::from_orders([0, 1, 0], [0, 0, 0, 0]).unwrap();
    assert!(model.clone().with_confidence_level(1.0).is_err());

    let narrow = model.with_confidence_level(0.5).unwrap();
    let data: Vec<f64> = (0..20).map(|t| (t * t) as f64).collect();
    let forecast = narrow.train(&data).unwrap().forecast(1).unwrap();
    assert_eq!(forecast.confidence_level(), Some(0.5));
}
