//! Chart descriptions rendered as Plotly figures or terminal sparklines
//!
//! A [`ChartSpec`] is plain data. [`ChartSpec::to_plotly`] turns it into a
//! Plotly figure (`{"data": [...], "layout": {...}}`) that the HTML report
//! embeds as-is.

use crate::params::{Metric, DATE_FORMAT};
use crate::table::PriceTable;
use chrono::NaiveDate;
use price_forecast::{ForecastResult, HoldoutForecast};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use series_math::SeasonalDecomposition;

/// A line series; `None` points leave gaps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineTrace {
    pub name: String,
    pub x: Vec<NaiveDate>,
    pub y: Vec<Option<f64>>,
    pub spline: bool,
    pub dashed: bool,
}

/// A shaded region between two curves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTrace {
    pub name: String,
    pub x: Vec<NaiveDate>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandlestickTrace {
    pub name: String,
    pub x: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Trace {
    Line(LineTrace),
    Band(BandTrace),
    Candlestick(CandlestickTrace),
}

impl Trace {
    pub fn name(&self) -> &str {
        match self {
            Trace::Line(t) => &t.name,
            Trace::Band(t) => &t.name,
            Trace::Candlestick(t) => &t.name,
        }
    }

    fn to_plotly(&self) -> Vec<Value> {
        match self {
            Trace::Line(t) => {
                let mut style = json!({});
                if t.spline {
                    style["shape"] = json!("spline");
                }
                if t.dashed {
                    style["dash"] = json!("dash");
                }
                vec![json!({
                    "type": "scatter",
                    "mode": "lines",
                    "name": t.name,
                    "x": format_dates(&t.x),
                    "y": t.y,
                    "line": style,
                })]
            }
            // Plotly fills down to the previous trace, so upper goes first
            Trace::Band(t) => vec![
                json!({
                    "type": "scatter",
                    "mode": "lines",
                    "name": format!("{} (upper)", t.name),
                    "x": format_dates(&t.x),
                    "y": t.upper,
                    "line": {"width": 0},
                    "showlegend": false,
                }),
                json!({
                    "type": "scatter",
                    "mode": "lines",
                    "name": t.name,
                    "x": format_dates(&t.x),
                    "y": t.lower,
                    "line": {"width": 0},
                    "fill": "tonexty",
                    "fillcolor": "rgba(99, 110, 250, 0.2)",
                }),
            ],
            Trace::Candlestick(t) => vec![json!({
                "type": "candlestick",
                "name": t.name,
                "x": format_dates(&t.x),
                "open": t.open,
                "high": t.high,
                "low": t.low,
                "close": t.close,
            })],
        }
    }
}

/// A titled chart with labelled axes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Stable identifier, used as the HTML element id
    pub id: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub traces: Vec<Trace>,
}

impl ChartSpec {
    pub fn new(id: &str, title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            traces: Vec::new(),
        }
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.traces.push(trace);
        self
    }

    /// Plotly figure JSON
    pub fn to_plotly(&self) -> Value {
        let data: Vec<Value> = self.traces.iter().flat_map(Trace::to_plotly).collect();
        json!({
            "data": data,
            "layout": {
                "title": {"text": self.title},
                "xaxis": {"title": {"text": self.x_label}},
                "yaxis": {"title": {"text": self.y_label}},
                "hovermode": "x unified",
            },
        })
    }

    /// Present values of the first trace, for compact previews
    pub fn primary_values(&self) -> Vec<f64> {
        match self.traces.first() {
            Some(Trace::Line(t)) => t.y.iter().flatten().copied().collect(),
            Some(Trace::Band(t)) => t
                .lower
                .iter()
                .zip(&t.upper)
                .map(|(l, u)| (l + u) / 2.0)
                .collect(),
            Some(Trace::Candlestick(t)) => t.close.clone(),
            None => Vec::new(),
        }
    }
}

fn format_dates(dates: &[NaiveDate]) -> Vec<String> {
    dates
        .iter()
        .map(|d| d.format(DATE_FORMAT).to_string())
        .collect()
}

fn line(name: &str, x: &[NaiveDate], y: Vec<Option<f64>>) -> Trace {
    Trace::Line(LineTrace {
        name: name.to_string(),
        x: x.to_vec(),
        y,
        spline: false,
        dashed: false,
    })
}

fn solid(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|v| Some(*v)).collect()
}

/// Selected metric over time, drawn as a spline
pub fn metric_chart(table: &PriceTable, metric: Metric) -> ChartSpec {
    let trace = Trace::Line(LineTrace {
        name: metric.column().to_string(),
        x: table.dates.clone(),
        y: solid(&table.column(metric)),
        spline: true,
        dashed: false,
    });

    ChartSpec::new(
        "metric",
        &format!("{} {} over time", table.ticker, metric),
        "Date",
        metric.column(),
    )
    .with_trace(trace)
}

pub fn candlestick_chart(table: &PriceTable) -> ChartSpec {
    ChartSpec::new(
        "candlestick",
        &format!("{} candlestick", table.ticker),
        "Date",
        "Price",
    )
    .with_trace(Trace::Candlestick(CandlestickTrace {
        name: table.ticker.clone(),
        x: table.dates.clone(),
        open: table.open.clone(),
        high: table.high.clone(),
        low: table.low.clone(),
        close: table.close.clone(),
    }))
}

/// Close with every moving average column overlaid
pub fn moving_average_chart(table: &PriceTable) -> ChartSpec {
    let mut chart = ChartSpec::new(
        "moving-averages",
        &format!("{} close and moving averages", table.ticker),
        "Date",
        "Price",
    )
    .with_trace(line("Close", &table.dates, solid(&table.close)));

    for ma in &table.moving_averages {
        chart = chart.with_trace(line(&ma.name(), &table.dates, ma.values.clone()));
    }
    chart
}

/// Trend, seasonal and residual charts
pub fn decomposition_charts(
    dates: &[NaiveDate],
    decomposition: &SeasonalDecomposition,
) -> Vec<ChartSpec> {
    let seasonal: Vec<Option<f64>> = decomposition.seasonal.iter().map(|v| Some(*v)).collect();
    let components = [
        ("trend", "Trend", decomposition.trend.clone()),
        ("seasonal", "Seasonal", seasonal),
        ("residual", "Residual", decomposition.residual.clone()),
    ];

    components
        .into_iter()
        .map(|(id, label, values)| {
            ChartSpec::new(
                &format!("decomposition-{}", id),
                &format!("{} (period {})", label, decomposition.period),
                "Date",
                label,
            )
            .with_trace(line(label, dates, values))
        })
        .collect()
}

fn forecast_traces(name: &str, dates: &[NaiveDate], forecast: &ForecastResult) -> Vec<Trace> {
    let mut traces = Vec::with_capacity(2);
    if let Some(intervals) = forecast.intervals() {
        let level = forecast.confidence_level().unwrap_or(0.95);
        traces.push(Trace::Band(BandTrace {
            name: format!("{:.0}% interval", level * 100.0),
            x: dates.to_vec(),
            lower: intervals.iter().map(|(l, _)| *l).collect(),
            upper: intervals.iter().map(|(_, u)| *u).collect(),
        }));
    }
    traces.push(Trace::Line(LineTrace {
        name: name.to_string(),
        x: dates.to_vec(),
        y: solid(forecast.values()),
        spline: false,
        dashed: true,
    }));
    traces
}

/// Train and test actuals with the forecast over the test window
pub fn test_forecast_chart(ticker: &str, holdout: &HoldoutForecast) -> ChartSpec {
    let mut chart = ChartSpec::new(
        "forecast-test",
        &format!("{} {} on the test window", ticker, holdout.model_name),
        "Date",
        "Close",
    )
    .with_trace(line("Train", &holdout.train_dates, solid(&holdout.train)))
    .with_trace(line("Test", &holdout.test_dates, solid(&holdout.test)));

    for trace in forecast_traces("Forecast", &holdout.test_dates, &holdout.test_forecast) {
        chart = chart.with_trace(trace);
    }
    chart
}

/// Forecast for the business days after the last observation
pub fn future_forecast_chart(ticker: &str, holdout: &HoldoutForecast) -> ChartSpec {
    let mut chart = ChartSpec::new(
        "forecast-future",
        &format!(
            "{} forecast for the next {} business days",
            ticker,
            holdout.future_dates.len()
        ),
        "Date",
        "Close",
    );

    // Forecast line first so previews show the forecast itself
    let mut traces = forecast_traces("Forecast", &holdout.future_dates, &holdout.future_forecast);
    traces.rotate_right(1);
    for trace in traces {
        chart = chart.with_trace(trace);
    }
    chart
}
