//! Report renderers: terminal text and a standalone HTML page

use crate::error::Result;
use crate::pipeline::{DashboardReport, SectionOutcome, Severity, TableStatistics};
use crate::table::PriceTable;
use price_forecast::HoldoutForecast;
use std::fmt::{self, Write};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARKLINE_WIDTH: usize = 60;

/// Compact one-line rendering of a series.
///
/// Longer series are averaged down to `width` characters.
pub fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let sampled = downsample(values, width);
    let min = sampled.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = sampled.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    sampled
        .iter()
        .map(|&v| {
            let normalized = if range > 0.0 {
                ((v - min) / range).clamp(0.0, 1.0)
            } else {
                0.5
            };
            SPARKLINE_CHARS[((normalized * 7.0).round() as usize).min(7)]
        })
        .collect()
}

fn downsample(values: &[f64], target_len: usize) -> Vec<f64> {
    if values.len() <= target_len {
        return values.to_vec();
    }

    let chunk = values.len() as f64 / target_len as f64;
    (0..target_len)
        .filter_map(|i| {
            let start = (i as f64 * chunk).floor() as usize;
            let end = (((i + 1) as f64 * chunk).ceil() as usize).min(values.len());
            (start < end).then(|| values[start..end].iter().sum::<f64>() / (end - start) as f64)
        })
        .collect()
}

/// Plain-text report for the terminal
pub fn render_text(report: &DashboardReport) -> Result<String> {
    let mut out = String::new();
    let p = &report.params;
    writeln!(
        out,
        "== {} {} .. {} | metric {} | view {} ==",
        p.ticker.trim().to_uppercase(),
        p.start,
        p.end,
        p.metric,
        p.view
    )?;

    match &report.data {
        SectionOutcome::Rendered(table) => {
            writeln!(
                out,
                "{} rows{}\n",
                table.len(),
                if report.from_cache { " (cached)" } else { "" }
            )?;
            writeln!(out, "Raw data (first {} rows)", report.head_rows)?;
            writeln!(out, "{}\n", table.head(report.head_rows)?)?;
        }
        SectionOutcome::Failed(failure) => {
            writeln!(out, "Data unavailable: {}", failure.message)?;
            return Ok(out);
        }
        SectionOutcome::Skipped => return Ok(out),
    }

    if let Some(statistics) = report.statistics.rendered() {
        write_statistics(&mut out, statistics)?;
    }

    writeln!(out, "Charts")?;
    for chart in report.charts() {
        writeln!(
            out,
            "  {:<48} {}",
            chart.title,
            sparkline(&chart.primary_values(), SPARKLINE_WIDTH)
        )?;
    }
    out.push('\n');

    if let Some(forecast) = report.forecast.rendered() {
        write_forecast(&mut out, &forecast.holdout)?;
    }

    for (section, failure) in report.failures() {
        writeln!(out, "[{}] {}", section, failure)?;
    }

    Ok(out)
}

fn write_statistics(out: &mut String, statistics: &TableStatistics) -> fmt::Result {
    writeln!(out, "Summary statistics")?;
    writeln!(
        out,
        "  {:<8} {:>6} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14}",
        "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    )?;
    for (name, s) in &statistics.summary {
        let std = s.std.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "NaN".to_string());
        writeln!(
            out,
            "  {:<8} {:>6} {:>14.4} {:>14} {:>14.4} {:>14.4} {:>14.4} {:>14.4} {:>14.4}",
            name, s.count, s.mean, std, s.min, s.q25, s.median, s.q75, s.max
        )?;
    }
    out.push('\n');

    writeln!(out, "Missing values")?;
    for (name, count) in &statistics.missing {
        writeln!(out, "  {:<8} {:>6}", name, count)?;
    }
    out.push('\n');
    Ok(())
}

fn write_forecast(out: &mut String, holdout: &HoldoutForecast) -> fmt::Result {
    writeln!(
        out,
        "Forecast ({}; {} train / {} test rows)",
        holdout.model_name,
        holdout.train.len(),
        holdout.test.len()
    )?;
    writeln!(out, "{}", holdout.metrics)?;
    if let (Some(first), Some(last)) = (holdout.future_dates.first(), holdout.future_dates.last()) {
        writeln!(
            out,
            "Future horizon: {} business days, {} .. {}",
            holdout.future_dates.len(),
            first,
            last
        )?;
    }
    if let Some(fit) = &holdout.fit {
        writeln!(out, "{}", fit)?;
    }
    out.push('\n');
    Ok(())
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn head_table_html(table: &PriceTable, rows: usize) -> Result<String> {
    let mut html = String::from("<table>\n<tr><th>Date</th><th>Open</th><th>High</th><th>Low</th><th>Close</th><th>Volume</th>");
    for ma in &table.moving_averages {
        write!(html, "<th>{}</th>", ma.name())?;
    }
    html.push_str("</tr>\n");

    for i in 0..rows.min(table.len()) {
        write!(
            html,
            "<tr><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{}</td>",
            table.dates[i], table.open[i], table.high[i], table.low[i], table.close[i], table.volume[i]
        )?;
        for ma in &table.moving_averages {
            match ma.values[i] {
                Some(v) => {
                    write!(html, "<td>{:.2}</td>", v)?;
                }
                None => html.push_str("<td></td>"),
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
    Ok(html)
}

fn statistics_html(statistics: &TableStatistics) -> Result<String> {
    let mut html = String::from(
        "<table>\n<tr><th></th><th>count</th><th>mean</th><th>std</th><th>min</th><th>25%</th><th>50%</th><th>75%</th><th>max</th></tr>\n",
    );
    for (name, s) in &statistics.summary {
        let std = s.std.map(|v| format!("{:.4}", v)).unwrap_or_default();
        writeln!(
            html,
            "<tr><th>{}</th><td>{}</td><td>{:.4}</td><td>{}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td><td>{:.4}</td></tr>",
            escape_html(name), s.count, s.mean, std, s.min, s.q25, s.median, s.q75, s.max
        )?;
    }
    html.push_str("</table>\n<h3>Missing values</h3>\n<table>\n");
    for (name, count) in &statistics.missing {
        writeln!(html, "<tr><th>{}</th><td>{}</td></tr>", escape_html(name), count)?;
    }
    html.push_str("</table>\n");
    Ok(html)
}

/// Standalone HTML page with Plotly charts loaded from the CDN
pub fn render_html(report: &DashboardReport) -> Result<String> {
    let p = &report.params;
    let title = format!("{} | {} to {}", p.ticker.trim().to_uppercase(), p.start, p.end);

    let mut body = String::new();
    writeln!(body, "<h1>{}</h1>", escape_html(&title))?;

    for (section, failure) in report.failures() {
        let class = match failure.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        writeln!(
            body,
            "<div class=\"{}\"><strong>{}</strong>: {}</div>",
            class,
            escape_html(section),
            escape_html(&failure.message)
        )?;
    }

    if let Some(table) = report.data.rendered() {
        writeln!(body, "<h2>Raw data</h2>")?;
        body.push_str(&head_table_html(table, report.head_rows)?);
    }
    if let Some(statistics) = report.statistics.rendered() {
        writeln!(body, "<h2>Summary statistics</h2>")?;
        body.push_str(&statistics_html(statistics)?);
    }

    if let Some(forecast) = report.forecast.rendered() {
        let metrics = &forecast.holdout.metrics;
        writeln!(
            body,
            "<div class=\"cards\"><div class=\"card\"><span>MAE</span><b>{:.4}</b></div><div class=\"card\"><span>MSE</span><b>{:.4}</b></div><div class=\"card\"><span>RMSE</span><b>{:.4}</b></div><div class=\"card\"><span>MAPE</span><b>{:.2}%</b></div></div>",
            metrics.mae,
            metrics.mse,
            metrics.rmse,
            metrics.mape * 100.0
        )?;
    }

    for chart in report.charts() {
        let element = format!("chart-{}", chart.id);
        // JSON inside a script element must not close it
        let figure = chart.to_plotly().to_string().replace("</", "<\\/");
        writeln!(
            body,
            "<div id=\"{id}\" class=\"chart\"></div>\n<script>(function () {{ var fig = {fig}; Plotly.newPlot(\"{id}\", fig.data, fig.layout); }})();</script>",
            id = escape_html(&element),
            fig = figure
        )?;
    }

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{cdn}"></script>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
table {{ border-collapse: collapse; margin-bottom: 1em; }}
td, th {{ border: 1px solid #ccc; padding: 2px 8px; text-align: right; }}
.chart {{ height: 420px; }}
.warning {{ background: #fff4ce; padding: 0.5em; margin: 0.5em 0; }}
.error {{ background: #fde7e9; padding: 0.5em; margin: 0.5em 0; }}
.cards {{ display: flex; gap: 1em; }}
.card {{ border: 1px solid #ccc; padding: 0.5em 1em; display: flex; flex-direction: column; }}
</style>
</head>
<body>
{body}</body>
</html>
"#,
        title = escape_html(&title),
        cdn = PLOTLY_CDN,
        body = body
    ))
}
