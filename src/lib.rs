//! # Ticker Scope
//!
//! A stock dashboard: daily OHLCV bars for one ticker and date range,
//! descriptive statistics, charts and a seasonal ARIMA forecast.
//!
//! A run is a pure function of its inputs plus the session's acquisition
//! cache:
//!
//! ```no_run
//! use market_data::{CachedProvider, SyntheticProvider};
//! use ticker_scope::{run_pipeline, InputParams, PipelineSettings};
//!
//! let mut cache = CachedProvider::new(SyntheticProvider::default(), 16);
//! let report = run_pipeline(&InputParams::default(), &mut cache, &PipelineSettings::default());
//! println!("{}", ticker_scope::report::render_text(&report).unwrap());
//! ```

pub mod charts;
pub mod config;
pub mod error;
pub mod features;
pub mod params;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod table;

pub use crate::config::DashboardConfig;
pub use crate::error::{DashboardError, Result};
pub use crate::params::{InputParams, Metric, ViewMode};
pub use crate::pipeline::{
    run_pipeline, DashboardReport, PipelineSettings, SectionFailure, SectionOutcome, Severity,
};
pub use crate::session::Dashboard;
pub use crate::table::PriceTable;
