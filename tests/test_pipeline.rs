use chrono::{Datelike, NaiveDate, Weekday};
use market_data::{CachedProvider, DailyOhlcv, FetchRequest, MarketDataProvider, SyntheticProvider};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use ticker_scope::{
    run_pipeline, InputParams, Metric, PipelineSettings, SectionOutcome, Severity, ViewMode,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn params(start: NaiveDate, end: NaiveDate, view: ViewMode) -> InputParams {
    InputParams {
        ticker: "AAPL".to_string(),
        start,
        end,
        metric: Metric::Close,
        view,
    }
}

/// Synthetic provider that counts how often it is asked for data
struct CountingProvider {
    inner: SyntheticProvider,
    calls: Cell<usize>,
}

impl MarketDataProvider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    fn fetch_daily(&self, request: &FetchRequest) -> market_data::Result<Vec<DailyOhlcv>> {
        self.calls.set(self.calls.get() + 1);
        self.inner.fetch_daily(request)
    }
}

#[test]
fn test_full_range_both_views() {
    let mut cache = CachedProvider::new(SyntheticProvider::default(), 16);
    let report = run_pipeline(
        &params(date(2022, 1, 1), date(2024, 12, 31), ViewMode::Both),
        &mut cache,
        &PipelineSettings::default(),
    );

    let table = report.data.rendered().expect("data section");
    assert!(!table.is_empty());
    assert!(table.dates.windows(2).all(|w| w[0] < w[1]));
    assert!(table.first_date().unwrap() >= date(2022, 1, 1));
    assert!(table.last_date().unwrap() < date(2024, 12, 31));

    assert!(report.statistics.is_rendered());
    assert!(report.metric_chart.is_rendered());
    assert!(report.candlestick_chart.is_rendered());
    assert!(report.moving_average_chart.is_rendered());
    assert_eq!(report.decomposition.rendered().map(Vec::len), Some(3));

    let forecast = report.forecast.rendered().expect("forecast section");
    let holdout = &forecast.holdout;
    let n = table.len();
    assert_eq!(holdout.train.len(), (n as f64 * 0.8).floor() as usize);
    assert_eq!(holdout.train.len() + holdout.test.len(), n);
    assert_eq!(holdout.test_dates[0], table.dates[holdout.train.len()]);

    assert!(holdout.metrics.mae.is_finite() && holdout.metrics.mae >= 0.0);
    assert!(holdout.metrics.mse.is_finite() && holdout.metrics.mse >= 0.0);

    assert_eq!(holdout.future_dates.len(), 365);
    assert!(holdout.future_dates[0] > table.last_date().unwrap());
    assert!(holdout
        .future_dates
        .iter()
        .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));

    assert!(report.failures().is_empty());
    assert_eq!(report.charts().len(), 3 + 3 + 2);
}

#[test]
fn test_short_range_warns_on_decomposition() {
    let mut cache = CachedProvider::new(SyntheticProvider::default(), 16);
    let report = run_pipeline(
        &params(date(2024, 1, 1), date(2024, 2, 1), ViewMode::Both),
        &mut cache,
        &PipelineSettings::default(),
    );

    assert!(report.data.rendered().unwrap().len() < 30);
    assert!(report.metric_chart.is_rendered());
    assert!(report.candlestick_chart.is_rendered());
    assert!(report.moving_average_chart.is_rendered());

    let warning = report.decomposition.failure().expect("decomposition warning");
    assert_eq!(warning.severity, Severity::Warning);

    // Too short for the seasonal model as well
    let error = report.forecast.failure().expect("forecast failure");
    assert_eq!(error.severity, Severity::Error);
}

#[test]
fn test_inverted_range_skips_everything() {
    let provider = CountingProvider {
        inner: SyntheticProvider::default(),
        calls: Cell::new(0),
    };
    let mut cache = CachedProvider::new(provider, 16);
    let report = run_pipeline(
        &params(date(2024, 12, 31), date(2024, 1, 1), ViewMode::Both),
        &mut cache,
        &PipelineSettings::default(),
    );

    assert_eq!(cache.inner().calls.get(), 0);
    assert_eq!(report.data.failure().unwrap().severity, Severity::Error);
    assert!(report.statistics.is_skipped());
    assert!(report.metric_chart.is_skipped());
    assert!(report.candlestick_chart.is_skipped());
    assert!(report.moving_average_chart.is_skipped());
    assert!(report.decomposition.is_skipped());
    assert!(report.forecast.is_skipped());
    assert_eq!(report.failures().len(), 1);
    assert!(report.charts().is_empty());
}

#[test]
fn test_view_mode_gates_sections() {
    let mut cache = CachedProvider::new(SyntheticProvider::default(), 16);
    let settings = PipelineSettings::default();

    let historical = run_pipeline(
        &params(date(2023, 1, 1), date(2024, 1, 1), ViewMode::Historical),
        &mut cache,
        &settings,
    );
    assert!(historical.metric_chart.is_rendered());
    assert!(matches!(historical.forecast, SectionOutcome::Skipped));

    let forecast = run_pipeline(
        &params(date(2023, 1, 1), date(2024, 1, 1), ViewMode::Forecast),
        &mut cache,
        &settings,
    );
    assert!(forecast.metric_chart.is_skipped());
    assert!(forecast.candlestick_chart.is_rendered());
    assert!(forecast.forecast.is_rendered());
    assert!(forecast.from_cache);
}

#[test]
fn test_identical_request_uses_cache() {
    let provider = CountingProvider {
        inner: SyntheticProvider::default(),
        calls: Cell::new(0),
    };
    let mut cache = CachedProvider::new(provider, 16);
    let mut settings = PipelineSettings::default();
    settings.forecast.future_steps = 5;
    let inputs = params(date(2023, 6, 1), date(2024, 6, 1), ViewMode::Historical);

    let first = run_pipeline(&inputs, &mut cache, &settings);
    let second = run_pipeline(&inputs, &mut cache, &settings);

    assert_eq!(cache.inner().calls.get(), 1);
    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.data.rendered(), second.data.rendered());
}

#[test]
fn test_metric_chart_follows_metric() {
    let mut cache = CachedProvider::new(SyntheticProvider::default(), 16);
    let mut inputs = params(date(2024, 1, 1), date(2024, 4, 1), ViewMode::Historical);
    inputs.metric = Metric::Volume;

    let report = run_pipeline(&inputs, &mut cache, &PipelineSettings::default());
    let chart = report.metric_chart.rendered().unwrap();
    let table = report.data.rendered().unwrap();

    assert_eq!(chart.y_label, "Volume");
    assert_eq!(chart.primary_values(), table.column(Metric::Volume));
}
