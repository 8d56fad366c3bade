//! Derived-value cache for the metrics engine
//!
//! Entries are valid for exactly one ledger generation. The first access
//! under a newer generation drops every entry; there is no partial
//! invalidation. Trailing-window queries are keyed without their bounds,
//! so repeated reads between appends share one entry.

use chrono::{DateTime, Utc};
use revenue_ledger::RevenueFilter;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::types::{AdRevenueMetrics, MonetizationSummary, RevenueBreakdown};

/// Query a cached value was computed for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `total_revenue` over a filter
    TotalRevenue(RevenueFilter),
    /// `ad_revenue_metrics` over a range
    AdMetrics(Option<DateTime<Utc>>, Option<DateTime<Utc>>),
    /// `revenue_by_source` over a range
    RevenueBySource(Option<DateTime<Utc>>, Option<DateTime<Utc>>),
    /// `mrr` over the trailing window
    TrailingMrr,
    /// Summary over the trailing window
    TrailingSummary,
    /// Summary from a fixed start, to a fixed end or open-ended
    Summary(DateTime<Utc>, Option<DateTime<Utc>>),
}

/// Cached value
#[derive(Debug, Clone)]
pub enum CachedValue {
    /// A single amount
    Amount(Decimal),
    /// Ad performance
    AdMetrics(AdRevenueMetrics),
    /// Per-source breakdown
    Breakdown(RevenueBreakdown),
    /// Full summary
    Summary(Box<MonetizationSummary>),
}

/// Values the engine knows how to memoize
pub trait Cacheable: Clone {
    /// Wrap for storage
    fn into_cached(self) -> CachedValue;

    /// Unwrap a stored value of the same kind
    fn from_cached(value: &CachedValue) -> Option<Self>;
}

impl Cacheable for Decimal {
    fn into_cached(self) -> CachedValue {
        CachedValue::Amount(self)
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::Amount(amount) => Some(*amount),
            _ => None,
        }
    }
}

impl Cacheable for AdRevenueMetrics {
    fn into_cached(self) -> CachedValue {
        CachedValue::AdMetrics(self)
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::AdMetrics(metrics) => Some(metrics.clone()),
            _ => None,
        }
    }
}

impl Cacheable for RevenueBreakdown {
    fn into_cached(self) -> CachedValue {
        CachedValue::Breakdown(self)
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::Breakdown(breakdown) => Some(breakdown.clone()),
            _ => None,
        }
    }
}

impl Cacheable for MonetizationSummary {
    fn into_cached(self) -> CachedValue {
        CachedValue::Summary(Box::new(self))
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::Summary(summary) => Some((**summary).clone()),
            _ => None,
        }
    }
}

/// Cache counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to compute
    pub misses: u64,
    /// Times the cache was dropped for a newer generation
    pub invalidations: u64,
    /// Entries currently held
    pub entries: usize,
}

impl CacheStats {
    /// Hit rate in percent
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64) / (total as f64) * 100.0
        }
    }
}

/// Generation-scoped memo table
#[derive(Debug, Default)]
pub struct MetricsCache {
    generation: u64,
    entries: HashMap<CacheKey, CachedValue>,
    stats: CacheStats,
}

impl MetricsCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key` as of `generation`
    pub fn get<T: Cacheable>(&mut self, generation: u64, key: &CacheKey) -> Option<T> {
        if generation < self.generation {
            // reader raced an append; never serve or drop newer entries for it
            self.stats.misses += 1;
            return None;
        }
        self.sync(generation);

        match self.entries.get(key).and_then(T::from_cached) {
            Some(value) => {
                self.stats.hits += 1;
                Some(value)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store a value computed from a snapshot taken at `generation`.
    ///
    /// Values from a generation older than the cache's are discarded.
    pub fn insert<T: Cacheable>(&mut self, generation: u64, key: CacheKey, value: T) {
        if generation < self.generation {
            return;
        }
        self.sync(generation);
        self.entries.insert(key, value.into_cached());
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.stats.invalidations += 1;
        }
        self.entries.clear();
    }

    /// Generation the entries belong to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            ..self.stats
        }
    }

    fn sync(&mut self, generation: u64) {
        if generation != self.generation {
            tracing::debug!(
                from = self.generation,
                to = generation,
                entries = self.entries.len(),
                "Ledger changed, dropping metrics cache"
            );
            self.clear();
            self.generation = generation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_after_insert() {
        let mut cache = MetricsCache::new();
        let key = CacheKey::TotalRevenue(RevenueFilter::all());

        assert_eq!(cache.get::<Decimal>(0, &key), None);
        cache.insert(0, key.clone(), Decimal::from(10));
        assert_eq!(cache.get::<Decimal>(0, &key), Some(Decimal::from(10)));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hit_rate(), 50.0);
    }

    #[test]
    fn test_newer_generation_clears_everything() {
        let mut cache = MetricsCache::new();
        let total = CacheKey::TotalRevenue(RevenueFilter::all());
        let by_source = CacheKey::RevenueBySource(None, None);

        cache.insert(1, total.clone(), Decimal::from(10));
        cache.insert(1, by_source.clone(), RevenueBreakdown::new());

        assert_eq!(cache.get::<Decimal>(2, &total), None);
        assert_eq!(cache.get::<RevenueBreakdown>(2, &by_source), None);
        assert_eq!(cache.generation(), 2);
        assert_eq!(cache.stats().entries, 0);
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn test_stale_insert_ignored() {
        let mut cache = MetricsCache::new();
        let key = CacheKey::TotalRevenue(RevenueFilter::all());

        cache.insert(5, key.clone(), Decimal::from(50));
        cache.insert(4, key.clone(), Decimal::from(40));

        assert_eq!(cache.get::<Decimal>(5, &key), Some(Decimal::from(50)));
    }

    #[test]
    fn test_older_reader_does_not_clear_newer_entries() {
        let mut cache = MetricsCache::new();
        let key = CacheKey::TotalRevenue(RevenueFilter::all());

        cache.insert(3, key.clone(), Decimal::from(30));
        assert_eq!(cache.get::<Decimal>(2, &key), None);
        assert_eq!(cache.get::<Decimal>(3, &key), Some(Decimal::from(30)));
        assert_eq!(cache.stats().invalidations, 0);
    }

    #[test]
    fn test_kind_mismatch_is_a_miss() {
        let mut cache = MetricsCache::new();
        let key = CacheKey::RevenueBySource(None, None);

        cache.insert(0, key.clone(), Decimal::ONE);
        assert_eq!(cache.get::<RevenueBreakdown>(0, &key), None);
    }
}
