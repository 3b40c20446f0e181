//! Session-lifetime memoization of acquisitions
//!
//! Entries are keyed by the full request `(ticker, start, end)` and are never
//! invalidated; the least recently used entry is evicted once `capacity` is
//! exceeded. Failed acquisitions are not stored.

use crate::{acquire, DailyOhlcv, FetchRequest, MarketDataProvider, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

/// Counters describing cache effectiveness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// A provider wrapper that memoizes successful acquisitions
#[derive(Debug)]
pub struct CachedProvider<P> {
    inner: P,
    capacity: usize,
    entries: HashMap<FetchRequest, Arc<Vec<DailyOhlcv>>>,
    /// Least recently used at the front
    recency: VecDeque<FetchRequest>,
    stats: CacheStats,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    /// Wrap `inner`, keeping at most `capacity` results (minimum 1)
    pub fn new(inner: P, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner,
            capacity,
            entries: HashMap::with_capacity(capacity),
            recency: VecDeque::with_capacity(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Acquire bars for `request`, reusing a previous result for the same request
    pub fn fetch(&mut self, request: &FetchRequest) -> Result<Arc<Vec<DailyOhlcv>>> {
        if let Some(bars) = self.entries.get(request).cloned() {
            self.stats.hits += 1;
            self.touch(request);
            debug!("cache hit for {}", request);
            return Ok(bars);
        }

        self.stats.misses += 1;
        info!(provider = self.inner.name(), "fetching {}", request);
        let bars = Arc::new(acquire(&self.inner, request)?);
        info!(rows = bars.len(), "acquired {}", request);

        self.entries.insert(request.clone(), Arc::clone(&bars));
        self.recency.push_back(request.clone());
        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.recency.pop_front() {
                self.entries.remove(&oldest);
                self.stats.evictions += 1;
                debug!("evicted {}", oldest);
            }
        }

        Ok(bars)
    }

    /// Whether a result for `request` is currently cached
    pub fn contains(&self, request: &FetchRequest) -> bool {
        self.entries.contains_key(request)
    }

    /// Number of cached results
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of cached results
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Hit, miss and eviction counters
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// The wrapped provider
    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn touch(&mut self, request: &FetchRequest) {
        if let Some(pos) = self.recency.iter().position(|r| r == request) {
            if let Some(key) = self.recency.remove(pos) {
                self.recency.push_back(key);
            }
        }
    }
}
