//! Interactive session state

use crate::params::InputParams;
use crate::pipeline::{run_pipeline, DashboardReport, PipelineSettings};
use market_data::cache::CacheStats;
use market_data::{CachedProvider, MarketDataProvider};
use tracing::debug;

/// What a refresh did
#[derive(Debug)]
pub struct Refresh<'a> {
    /// Controls that differ from the previous run
    pub changed: Vec<&'static str>,
    /// False when the previous report was reused as-is
    pub recomputed: bool,
    pub report: &'a DashboardReport,
}

/// Owns the acquisition cache and the most recent report.
///
/// The pipeline only runs again when the controls change; an unchanged
/// refresh hands back the previous report.
#[derive(Debug)]
pub struct Dashboard<P> {
    cache: CachedProvider<P>,
    settings: PipelineSettings,
    current: Option<DashboardReport>,
    runs: usize,
}

impl<P: MarketDataProvider> Dashboard<P> {
    pub fn new(provider: P, cache_capacity: usize, settings: PipelineSettings) -> Self {
        Self {
            cache: CachedProvider::new(provider, cache_capacity),
            settings,
            current: None,
            runs: 0,
        }
    }

    /// Bring the report up to date with `params`
    pub fn refresh(&mut self, params: &InputParams) -> Refresh<'_> {
        let changed = match &self.current {
            Some(report) => params.changed_fields(&report.params),
            None => vec!["ticker", "start", "end", "metric", "view"],
        };
        if !changed.is_empty() {
            self.current = None;
        }
        self.update(params, changed)
    }

    /// Run the pipeline again for the current controls, or `params` if none ran yet
    pub fn rerun(&mut self, params: &InputParams) -> Refresh<'_> {
        let params = self
            .current
            .take()
            .map(|report| report.params)
            .unwrap_or_else(|| params.clone());
        self.update(&params, Vec::new())
    }

    fn update(&mut self, params: &InputParams, changed: Vec<&'static str>) -> Refresh<'_> {
        let (recomputed, report) = match self.current.take() {
            Some(report) => {
                debug!("controls unchanged; reusing report");
                (false, report)
            }
            None => {
                self.runs += 1;
                (true, run_pipeline(params, &mut self.cache, &self.settings))
            }
        };

        Refresh {
            changed,
            recomputed,
            report: self.current.insert(report),
        }
    }

    pub fn report(&self) -> Option<&DashboardReport> {
        self.current.as_ref()
    }

    /// Number of pipeline runs so far
    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
