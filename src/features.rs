//! Calendar fields and moving averages derived from acquired bars

use crate::error::Result;
use crate::table::{MovingAverageColumn, PriceTable};
use chrono::Datelike;
use market_data::DailyOhlcv;
use series_math::rolling_mean;
use tracing::debug;

/// Build the price table from normalized bars.
///
/// Each window in `windows` adds an `MA_{window}` column: the trailing mean
/// of Close over that many rows, `None` while fewer rows are available.
pub fn derive_features(ticker: &str, bars: &[DailyOhlcv], windows: &[usize]) -> Result<PriceTable> {
    let n = bars.len();
    let mut table = PriceTable {
        ticker: ticker.to_string(),
        dates: Vec::with_capacity(n),
        open: Vec::with_capacity(n),
        high: Vec::with_capacity(n),
        low: Vec::with_capacity(n),
        close: Vec::with_capacity(n),
        volume: Vec::with_capacity(n),
        year: Vec::with_capacity(n),
        month: Vec::with_capacity(n),
        day: Vec::with_capacity(n),
        moving_averages: Vec::with_capacity(windows.len()),
    };

    for bar in bars {
        table.dates.push(bar.date);
        table.open.push(bar.data.open);
        table.high.push(bar.data.high);
        table.low.push(bar.data.low);
        table.close.push(bar.data.close);
        table.volume.push(bar.data.volume);
        table.year.push(bar.date.year());
        table.month.push(bar.date.month());
        table.day.push(bar.date.day());
    }

    for &window in windows {
        let values = rolling_mean(&table.close, window)?;
        table
            .moving_averages
            .push(MovingAverageColumn { window, values });
    }

    debug!(rows = n, windows = ?windows, "derived features for {}", ticker);
    Ok(table)
}
