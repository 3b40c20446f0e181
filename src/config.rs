//! Configuration file support.
//!
//! Every key is optional; a missing file section falls back to the built-in
//! defaults. Command-line flags override the `[defaults]` section.

use crate::error::{DashboardError, Result};
use crate::params::{parse_date, InputParams, Metric, ViewMode};
use market_data::{
    yahoo::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT},
    CsvProvider, MarketDataProvider, SyntheticProvider, YahooProvider,
};
use price_forecast::{HoldoutConfig, SarimaModel};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Complete dashboard configuration loaded from a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub forecast: ForecastSettings,
    #[serde(default)]
    pub defaults: DefaultInputs,
}

/// Where bars come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Yahoo,
    Csv,
    Synthetic,
}

/// Market data settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub provider: ProviderKind,
    /// Directory holding `{TICKER}.csv` files for the csv provider
    pub csv_dir: PathBuf,
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Distinct requests kept in the session cache
    pub cache_capacity: usize,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Yahoo,
            csv_dir: PathBuf::from("data"),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            cache_capacity: 16,
        }
    }
}

impl DataSettings {
    /// Build the configured provider
    pub fn provider(&self) -> Result<Box<dyn MarketDataProvider>> {
        let provider: Box<dyn MarketDataProvider> = match self.provider {
            ProviderKind::Yahoo => Box::new(YahooProvider::new(
                &self.base_url,
                &self.user_agent,
                Duration::from_secs(self.timeout_secs),
            )?),
            ProviderKind::Csv => Box::new(CsvProvider::new(&self.csv_dir)),
            ProviderKind::Synthetic => Box::new(SyntheticProvider::default()),
        };
        Ok(provider)
    }
}

/// Settings for the historical sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Trailing windows for the moving averages of Close
    pub moving_average_windows: Vec<usize>,
    pub decomposition_period: usize,
    /// Rows shown in the raw data preview
    pub head_rows: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            moving_average_windows: vec![30, 50],
            decomposition_period: 30,
            head_rows: 5,
        }
    }
}

/// Settings for the forecast sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    pub train_ratio: f64,
    /// Business days forecast past the last observation
    pub future_steps: usize,
    pub order: [usize; 3],
    pub seasonal_order: [usize; 4],
    pub max_iterations: usize,
    pub confidence_level: f64,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            train_ratio: 0.8,
            future_steps: 365,
            order: [1, 1, 1],
            seasonal_order: [1, 1, 1, 12],
            max_iterations: 800,
            confidence_level: 0.95,
        }
    }
}

impl ForecastSettings {
    /// The configured, not yet trained, model
    pub fn model(&self) -> Result<SarimaModel> {
        Ok(SarimaModel::from_orders(self.order, self.seasonal_order)?
            .with_max_iterations(self.max_iterations)
            .with_confidence_level(self.confidence_level)?)
    }

    pub fn holdout(&self) -> HoldoutConfig {
        HoldoutConfig {
            train_ratio: self.train_ratio,
            future_steps: self.future_steps,
        }
    }
}

/// Initial values of the dashboard controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultInputs {
    pub ticker: String,
    /// YYYY-MM-DD
    pub start: String,
    /// YYYY-MM-DD, exclusive
    pub end: String,
    pub metric: Metric,
    pub view: ViewMode,
}

impl Default for DefaultInputs {
    fn default() -> Self {
        Self {
            ticker: "AAPL".to_string(),
            start: "2022-01-01".to_string(),
            end: "2024-12-31".to_string(),
            metric: Metric::Close,
            view: ViewMode::Both,
        }
    }
}

impl DefaultInputs {
    pub fn to_params(&self) -> Result<InputParams> {
        Ok(InputParams {
            ticker: self.ticker.clone(),
            start: parse_date(&self.start)?,
            end: parse_date(&self.end)?,
            metric: self.metric,
            view: self.view,
        })
    }
}

impl DashboardConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from {:?}", path);

        let content = fs::read_to_string(path)?;
        let config: DashboardConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject values no run could use.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(DashboardError::Config(msg));

        if self.data.timeout_secs == 0 {
            return invalid("data.timeout_secs must be positive".to_string());
        }
        if self.analysis.moving_average_windows.contains(&0) {
            return invalid("analysis.moving_average_windows must be positive".to_string());
        }
        if self.analysis.decomposition_period < 2 {
            return invalid(format!(
                "analysis.decomposition_period must be at least 2, got {}",
                self.analysis.decomposition_period
            ));
        }
        let ratio = self.forecast.train_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return invalid(format!("forecast.train_ratio must be in (0, 1), got {}", ratio));
        }
        self.forecast
            .model()
            .map_err(|e| DashboardError::Config(format!("forecast: {}", e)))?;
        self.defaults.to_params()?;
        Ok(())
    }
}
