//! The derived price table and its tabular views

use crate::error::Result;
use crate::params::{Metric, DATE_FORMAT};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use series_math::{describe, SummaryStats};
use std::fs::File;
use std::path::Path;

/// Trailing mean of Close over `window` rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageColumn {
    pub window: usize,
    /// `None` for the first `window - 1` rows
    pub values: Vec<Option<f64>>,
}

impl MovingAverageColumn {
    pub fn name(&self) -> String {
        format!("MA_{}", self.window)
    }
}

/// Date-ordered bars with calendar fields and moving averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    pub ticker: String,
    pub dates: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<u64>,
    pub year: Vec<i32>,
    pub month: Vec<u32>,
    pub day: Vec<u32>,
    pub moving_averages: Vec<MovingAverageColumn>,
}

impl PriceTable {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Values of a price field as floats
    pub fn column(&self, metric: Metric) -> Vec<f64> {
        match metric {
            Metric::Open => self.open.clone(),
            Metric::High => self.high.clone(),
            Metric::Low => self.low.clone(),
            Metric::Close => self.close.clone(),
            Metric::Volume => self.volume.iter().map(|v| *v as f64).collect(),
        }
    }

    pub fn moving_average(&self, window: usize) -> Option<&MovingAverageColumn> {
        self.moving_averages.iter().find(|ma| ma.window == window)
    }

    /// All columns as a polars frame; dates are `YYYY-MM-DD` strings
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<String> = self
            .dates
            .iter()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .collect();

        let mut columns = vec![
            Series::new("Date", dates),
            Series::new("Open", self.open.clone()),
            Series::new("High", self.high.clone()),
            Series::new("Low", self.low.clone()),
            Series::new("Close", self.close.clone()),
            Series::new("Volume", self.volume.clone()),
            Series::new("Year", self.year.clone()),
            Series::new("Month", self.month.clone()),
            Series::new("Day", self.day.clone()),
        ];
        for ma in &self.moving_averages {
            columns.push(Series::new(&ma.name(), ma.values.clone()));
        }

        Ok(DataFrame::new(columns)?)
    }

    /// First `rows` rows of the table
    pub fn head(&self, rows: usize) -> Result<DataFrame> {
        Ok(self.to_dataframe()?.head(Some(rows)))
    }

    /// Missing entries per column, in column order
    pub fn missing_values(&self) -> Result<Vec<(String, usize)>> {
        let frame = self.to_dataframe()?;
        Ok(frame
            .get_columns()
            .iter()
            .map(|s| (s.name().to_string(), s.null_count()))
            .collect())
    }

    /// Summary statistics of every numeric column
    pub fn summary(&self) -> Vec<(String, SummaryStats)> {
        let mut columns: Vec<(String, Vec<Option<f64>>)> = vec![
            ("Open".to_string(), present(&self.open)),
            ("High".to_string(), present(&self.high)),
            ("Low".to_string(), present(&self.low)),
            ("Close".to_string(), present(&self.close)),
            (
                "Volume".to_string(),
                self.volume.iter().map(|v| Some(*v as f64)).collect(),
            ),
            (
                "Year".to_string(),
                self.year.iter().map(|v| Some(f64::from(*v))).collect(),
            ),
            (
                "Month".to_string(),
                self.month.iter().map(|v| Some(f64::from(*v))).collect(),
            ),
            (
                "Day".to_string(),
                self.day.iter().map(|v| Some(f64::from(*v))).collect(),
            ),
        ];
        for ma in &self.moving_averages {
            columns.push((ma.name(), ma.values.clone()));
        }

        columns
            .into_iter()
            .filter_map(|(name, values)| describe(values).map(|stats| (name, stats)))
            .collect()
    }

    /// Write the full table as CSV with a header row
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut frame = self.to_dataframe()?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .has_header(true)
            .finish(&mut frame)?;
        Ok(())
    }
}

fn present(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|v| Some(*v)).collect()
}
