use assert_approx_eq::assert_approx_eq;
use price_forecast::metrics::{
    evaluate_forecast, mean_absolute_error, mean_absolute_percentage_error, mean_squared_error,
    root_mean_squared_error,
};

#[test]
fn test_regression_metrics() {
    let actual: Vec<f64> = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted: Vec<f64> = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    assert_approx_eq!(mean_absolute_error(&actual, &predicted), 2.4, 0.01);
    assert_approx_eq!(mean_squared_error(&actual, &predicted), 6.0, 0.01);
    assert_approx_eq!(root_mean_squared_error(&actual, &predicted), 2.45, 0.01);

    let mape = mean_absolute_percentage_error(&actual, &predicted);
    assert!(mape > 0.0 && mape < 0.15);
}

#[test]
fn test_generic_over_f32() {
    let actual: Vec<f32> = vec![1.0, 2.0];
    let predicted: Vec<f32> = vec![2.0, 4.0];
    assert_approx_eq!(mean_squared_error(&actual, &predicted), 2.5f32);
}

#[test]
fn test_error_handling() {
    let empty: Vec<f64> = vec![];
    assert!(mean_absolute_error(&empty, &empty).is_nan());
    assert!(mean_squared_error(&[1.0f64, 2.0], &[1.0]).is_nan());
    assert!(mean_absolute_percentage_error(&[0.0f64, 0.0], &[1.0, 1.0]).is_nan());

    assert!(evaluate_forecast(&[], &[]).is_err());
    assert!(evaluate_forecast(&[1.0], &[1.0, 2.0]).is_err());
}

#[test]
fn test_evaluate_forecast() {
    let metrics = evaluate_forecast(&[101.0, 99.0], &[100.0, 100.0]).unwrap();
    assert_approx_eq!(metrics.mae, 1.0);
    assert_approx_eq!(metrics.mse, 1.0);
    assert_approx_eq!(metrics.rmse, 1.0);
    assert_approx_eq!(metrics.mape, 0.01);

    let text = metrics.to_string();
    assert!(text.contains("MAE"));
    assert!(text.contains("1.00%"));
}
