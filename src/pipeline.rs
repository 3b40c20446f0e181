//! One complete dashboard run
//!
//! [`run_pipeline`] turns an [`InputParams`] snapshot into a
//! [`DashboardReport`]. Every section carries its own [`SectionOutcome`], so
//! a failure in one place never hides the sections that could still be
//! produced:
//!
//! - acquisition failure fails the data section and skips everything after it
//! - decomposition failure is a warning
//! - forecasting failure is an error confined to the forecast section

use crate::charts::{
    candlestick_chart, decomposition_charts, future_forecast_chart, metric_chart,
    moving_average_chart, test_forecast_chart, ChartSpec,
};
use crate::config::{AnalysisSettings, DashboardConfig, ForecastSettings};
use crate::error::Result;
use crate::features::derive_features;
use crate::params::InputParams;
use crate::table::PriceTable;
use market_data::{CachedProvider, MarketDataProvider};
use price_forecast::{run_holdout, HoldoutForecast};
use serde::{Deserialize, Serialize};
use series_math::{seasonal_decompose, DecompositionModel, SummaryStats};
use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionFailure {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for SectionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}", label, self.message)
    }
}

/// Result of one report section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "content", rename_all = "lowercase")]
pub enum SectionOutcome<T> {
    Rendered(T),
    Failed(SectionFailure),
    /// Not produced, either because of the view mode or an earlier failure
    Skipped,
}

impl<T> SectionOutcome<T> {
    fn warning(message: impl ToString) -> Self {
        SectionOutcome::Failed(SectionFailure {
            severity: Severity::Warning,
            message: message.to_string(),
        })
    }

    fn error(message: impl ToString) -> Self {
        SectionOutcome::Failed(SectionFailure {
            severity: Severity::Error,
            message: message.to_string(),
        })
    }

    pub fn rendered(&self) -> Option<&T> {
        match self {
            SectionOutcome::Rendered(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&SectionFailure> {
        match self {
            SectionOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, SectionOutcome::Rendered(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, SectionOutcome::Skipped)
    }
}

/// Descriptive tables of the derived price table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStatistics {
    pub summary: Vec<(String, SummaryStats)>,
    pub missing: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSection {
    pub holdout: HoldoutForecast,
    pub test_chart: ChartSpec,
    pub future_chart: ChartSpec,
}

/// Everything one run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub params: InputParams,
    /// Acquired bars with derived features
    pub data: SectionOutcome<PriceTable>,
    /// Whether the bars came from the session cache
    pub from_cache: bool,
    pub head_rows: usize,
    pub statistics: SectionOutcome<TableStatistics>,
    pub metric_chart: SectionOutcome<ChartSpec>,
    pub candlestick_chart: SectionOutcome<ChartSpec>,
    pub moving_average_chart: SectionOutcome<ChartSpec>,
    pub decomposition: SectionOutcome<Vec<ChartSpec>>,
    pub forecast: SectionOutcome<ForecastSection>,
}

impl DashboardReport {
    fn skipped(params: &InputParams, head_rows: usize) -> Self {
        Self {
            params: params.clone(),
            data: SectionOutcome::Skipped,
            from_cache: false,
            head_rows,
            statistics: SectionOutcome::Skipped,
            metric_chart: SectionOutcome::Skipped,
            candlestick_chart: SectionOutcome::Skipped,
            moving_average_chart: SectionOutcome::Skipped,
            decomposition: SectionOutcome::Skipped,
            forecast: SectionOutcome::Skipped,
        }
    }

    /// Every chart that was rendered, in display order
    pub fn charts(&self) -> Vec<&ChartSpec> {
        let mut charts: Vec<&ChartSpec> = [
            &self.metric_chart,
            &self.candlestick_chart,
            &self.moving_average_chart,
        ]
        .into_iter()
        .filter_map(SectionOutcome::rendered)
        .collect();

        if let Some(decomposition) = self.decomposition.rendered() {
            charts.extend(decomposition.iter());
        }
        if let Some(forecast) = self.forecast.rendered() {
            charts.push(&forecast.test_chart);
            charts.push(&forecast.future_chart);
        }
        charts
    }

    /// Every failed section as `(section, failure)`
    pub fn failures(&self) -> Vec<(&'static str, &SectionFailure)> {
        [
            ("data", self.data.failure()),
            ("statistics", self.statistics.failure()),
            ("metric chart", self.metric_chart.failure()),
            ("candlestick chart", self.candlestick_chart.failure()),
            ("moving averages", self.moving_average_chart.failure()),
            ("decomposition", self.decomposition.failure()),
            ("forecast", self.forecast.failure()),
        ]
        .into_iter()
        .filter_map(|(name, failure)| failure.map(|f| (name, f)))
        .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Settings a run reads besides the inputs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineSettings {
    pub analysis: AnalysisSettings,
    pub forecast: ForecastSettings,
}

impl From<&DashboardConfig> for PipelineSettings {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            analysis: config.analysis.clone(),
            forecast: config.forecast.clone(),
        }
    }
}

/// Run every section for `params`
pub fn run_pipeline<P: MarketDataProvider>(
    params: &InputParams,
    cache: &mut CachedProvider<P>,
    settings: &PipelineSettings,
) -> DashboardReport {
    let mut report = DashboardReport::skipped(params, settings.analysis.head_rows);
    info!("running dashboard for {}", params);

    let request = params.fetch_request();
    let hits_before = cache.stats().hits;
    let bars = match cache.fetch(&request) {
        Ok(bars) => bars,
        Err(e) => {
            error!("acquisition failed for {}: {}", request, e);
            report.data = SectionOutcome::error(e);
            return report;
        }
    };
    report.from_cache = cache.stats().hits > hits_before;

    let table = match derive_features(
        &request.ticker,
        &bars,
        &settings.analysis.moving_average_windows,
    ) {
        Ok(table) => table,
        Err(e) => {
            error!("feature derivation failed: {}", e);
            report.data = SectionOutcome::error(e);
            return report;
        }
    };

    report.statistics = match table.missing_values() {
        Ok(missing) => SectionOutcome::Rendered(TableStatistics {
            summary: table.summary(),
            missing,
        }),
        Err(e) => SectionOutcome::error(e),
    };

    if params.view.shows_historical() {
        report.metric_chart = SectionOutcome::Rendered(metric_chart(&table, params.metric));
    }
    report.candlestick_chart = SectionOutcome::Rendered(candlestick_chart(&table));
    report.moving_average_chart = SectionOutcome::Rendered(moving_average_chart(&table));
    report.decomposition = decomposition_section(&table, settings.analysis.decomposition_period);

    if params.view.shows_forecast() {
        report.forecast = match forecast_section(&table, &settings.forecast) {
            Ok(section) => SectionOutcome::Rendered(section),
            Err(e) => {
                error!("forecast failed: {}", e);
                SectionOutcome::error(e)
            }
        };
    }

    report.data = SectionOutcome::Rendered(table);
    info!(
        charts = report.charts().len(),
        failures = report.failures().len(),
        "dashboard run complete"
    );
    report
}

fn decomposition_section(table: &PriceTable, period: usize) -> SectionOutcome<Vec<ChartSpec>> {
    match seasonal_decompose(&table.close, period, DecompositionModel::Additive) {
        Ok(decomposition) => SectionOutcome::Rendered(decomposition_charts(&table.dates, &decomposition)),
        Err(e) => {
            warn!("seasonal decomposition unavailable: {}", e);
            SectionOutcome::warning(format!("Seasonal decomposition unavailable: {}", e))
        }
    }
}

fn forecast_section(table: &PriceTable, settings: &ForecastSettings) -> Result<ForecastSection> {
    let model = settings.model()?;
    let holdout = run_holdout(&model, &table.dates, &table.close, &settings.holdout())?;

    Ok(ForecastSection {
        test_chart: test_forecast_chart(&table.ticker, &holdout),
        future_chart: future_forecast_chart(&table.ticker, &holdout),
        holdout,
    })
}
