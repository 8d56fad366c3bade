//! Metrics engine
//!
//! Answers monetization queries over a shared [`RevenueLedger`]. Each query
//! reads one ledger snapshot, aggregates it and memoizes the result until
//! the ledger records another event.
//!
//! # Example
//!
//! ```
//! use monetization_metrics::{MetricsConfig, MetricsEngine};
//! use revenue_ledger::{LedgerConfig, RevenueLedger};
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! # fn main() -> monetization_metrics::Result<()> {
//! let ledger = Arc::new(RevenueLedger::new(LedgerConfig::default())?);
//! let engine = MetricsEngine::new(ledger.clone(), MetricsConfig::default())?;
//!
//! ledger.record_subscription_revenue("user_1", "pro", Decimal::new(999, 2), "monthly")?;
//! assert_eq!(engine.mrr(), Decimal::new(999, 2));
//!
//! let csv = engine.export_report(None, None, "csv")?;
//! assert_eq!(csv.lines().count(), 8);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use revenue_ledger::{RevenueEvent, RevenueFilter, RevenueLedger, RevenueSource};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::{
    aggregate,
    cache::{CacheKey, CacheStats, Cacheable, MetricsCache},
    metrics::EngineMetrics,
    report,
    types::{AdRevenueMetrics, MonetizationSummary, ReportFormat, RevenueBreakdown},
    MetricsConfig, Result,
};

/// Monetization metrics over a revenue ledger
#[derive(Debug)]
pub struct MetricsEngine {
    ledger: Arc<RevenueLedger>,
    config: MetricsConfig,
    cache: Mutex<MetricsCache>,
    metrics: EngineMetrics,
}

impl MetricsEngine {
    /// Create an engine reading from `ledger`
    pub fn new(ledger: Arc<RevenueLedger>, config: MetricsConfig) -> Result<Self> {
        config.validate()?;
        let metrics = EngineMetrics::new()?;

        Ok(Self {
            ledger,
            config,
            cache: Mutex::new(MetricsCache::new()),
            metrics,
        })
    }

    /// Sum of amounts matching the bounds and source; zero when none match
    pub fn total_revenue(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        source: Option<RevenueSource>,
    ) -> Decimal {
        let filter = RevenueFilter { start, end, source };
        self.memoize("total_revenue", CacheKey::TotalRevenue(filter), &filter, aggregate::total)
    }

    /// Ad performance over website ad events in range
    pub fn ad_revenue_metrics(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AdRevenueMetrics {
        let filter = RevenueFilter {
            start,
            end,
            source: Some(RevenueSource::WebsiteAds),
        };
        let fill_rate = self.config.fill_rate_percent;
        self.memoize(
            "ad_revenue_metrics",
            CacheKey::AdMetrics(start, end),
            &filter,
            |events| aggregate::ad_metrics(events, fill_rate),
        )
    }

    /// Revenue per source in range, one entry for every source
    pub fn revenue_by_source(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> RevenueBreakdown {
        let filter = RevenueFilter {
            start,
            end,
            source: None,
        };
        self.memoize(
            "revenue_by_source",
            CacheKey::RevenueBySource(start, end),
            &filter,
            aggregate::by_source,
        )
    }

    /// Monthly recurring revenue over the trailing reporting window.
    ///
    /// Memoized for the current ledger generation; the window is taken when
    /// the value is computed.
    pub fn mrr(&self) -> Decimal {
        let (start, end) = self.trailing_window();
        let filter = RevenueFilter::between(start, end);
        self.memoize(
            "mrr",
            CacheKey::TrailingMrr,
            &filter,
            aggregate::monthly_recurring,
        )
    }

    /// Average revenue per user in range; zero when `total_users` is zero
    pub fn arpu(
        &self,
        total_users: u64,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Decimal {
        if total_users == 0 {
            return Decimal::ZERO;
        }
        aggregate::per_user(self.total_revenue(start, end, None), total_users)
    }

    /// Summary over the trailing reporting window
    pub fn monetization_summary(&self) -> MonetizationSummary {
        let (start, end) = self.trailing_window();
        self.summarize(CacheKey::TrailingSummary, start, Some(end))
    }

    /// Summary over an explicit inclusive window.
    ///
    /// Totals, breakdown, ad and subscription sections cover the window;
    /// `mrr` always covers the trailing reporting window. Both come from a
    /// single ledger snapshot.
    pub fn summary_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> MonetizationSummary {
        self.summarize(CacheKey::Summary(start, Some(end)), start, Some(end))
    }

    /// Serialize a summary as `"json"` or `"csv"`.
    ///
    /// With no bounds this is the trailing [`monetization_summary`]. A
    /// missing `start` falls back to `end` minus the reporting window; a
    /// missing `end` leaves the window open up to the latest event. Any
    /// other format fails with `UnsupportedFormat` before anything is
    /// computed.
    ///
    /// [`monetization_summary`]: MetricsEngine::monetization_summary
    pub fn export_report(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        format: &str,
    ) -> Result<String> {
        let format: ReportFormat = match format.parse() {
            Ok(format) => format,
            Err(e) => {
                self.metrics.record_report_error();
                tracing::warn!(%format, "Rejected report export");
                return Err(e);
            }
        };

        let summary = match (start, end) {
            (None, None) => self.monetization_summary(),
            (Some(start), None) => self.summarize(CacheKey::Summary(start, None), start, None),
            (start, Some(end)) => {
                let start = start.unwrap_or(end - self.config.reporting_window());
                self.summary_between(start, end)
            }
        };

        let rendered = report::render(&summary, format)?;
        self.metrics.record_report(format.extension());
        tracing::info!(
            %format,
            period_start = %summary.period_start,
            period_end = %summary.period_end,
            bytes = rendered.len(),
            "Exported monetization report"
        );

        Ok(rendered)
    }

    /// Drop every cached value
    pub fn invalidate_cache(&self) {
        self.cache.lock().clear();
    }

    /// Cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    /// Ledger this engine reads from
    pub fn ledger(&self) -> &Arc<RevenueLedger> {
        &self.ledger
    }

    /// Engine configuration
    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Engine metrics
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    fn trailing_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = self.ledger.now();
        (end - self.config.reporting_window(), end)
    }

    /// One snapshot spanning both the requested window and the trailing
    /// window, split in memory so `mrr` matches [`MetricsEngine::mrr`].
    fn summarize(
        &self,
        key: CacheKey,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> MonetizationSummary {
        let (trailing_start, trailing_end) = self.trailing_window();
        let window = RevenueFilter {
            start: Some(start),
            end,
            source: None,
        };
        let trailing = RevenueFilter::between(trailing_start, trailing_end);
        let span = RevenueFilter {
            start: Some(start.min(trailing_start)),
            end: end.map(|end| end.max(trailing_end)),
            source: None,
        };
        let fill_rate = self.config.fill_rate_percent;

        let mut summary = self.memoize("monetization_summary", key, &span, |events| {
            let in_window: Vec<RevenueEvent> =
                events.iter().filter(|e| window.matches(e)).cloned().collect();
            let recurring: Vec<RevenueEvent> =
                events.iter().filter(|e| trailing.matches(e)).cloned().collect();

            MonetizationSummary {
                generated_at: trailing_end,
                period_start: start,
                period_end: end.unwrap_or(trailing_end),
                total_revenue: aggregate::round2(aggregate::total(&in_window)),
                revenue_by_source: aggregate::by_source(&in_window),
                mrr: aggregate::monthly_recurring(&recurring),
                ad_metrics: aggregate::ad_metrics(&in_window, fill_rate),
                subscription_metrics: aggregate::subscriptions(&in_window),
            }
        });

        summary.generated_at = self.ledger.now();
        summary
    }

    fn memoize<T, F>(&self, query: &'static str, key: CacheKey, filter: &RevenueFilter, compute: F) -> T
    where
        T: Cacheable,
        F: FnOnce(&[RevenueEvent]) -> T,
    {
        if self.config.cache_enabled {
            let generation = self.ledger.generation();
            if let Some(value) = self.cache.lock().get::<T>(generation, &key) {
                self.metrics.record_query(query, true);
                return value;
            }
        }

        let snapshot = self.ledger.snapshot(filter);
        let value = compute(&snapshot.events);

        if self.config.cache_enabled {
            self.cache.lock().insert(snapshot.generation, key, value.clone());
        }
        self.metrics.record_query(query, false);

        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use revenue_ledger::{Clock, LedgerConfig, ManualClock, SystemClock};

    fn create_test_engine() -> (MetricsEngine, Arc<RevenueLedger>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let ledger =
            Arc::new(RevenueLedger::with_clock(LedgerConfig::default(), clock.clone()).unwrap());
        let engine = MetricsEngine::new(ledger.clone(), MetricsConfig::default()).unwrap();
        (engine, ledger, clock)
    }

    #[test]
    fn test_fresh_ledger_reports_zeroes() {
        let (engine, _, _) = create_test_engine();

        assert_eq!(engine.total_revenue(None, None, None), Decimal::ZERO);
        assert_eq!(engine.mrr(), Decimal::ZERO);

        let breakdown = engine.revenue_by_source(None, None);
        let names: Vec<&str> = breakdown.keys().map(RevenueSource::as_str).collect();
        assert_eq!(
            names,
            vec!["website_ads", "pro_subscription", "team_subscription", "custom_partnership"]
        );
        assert!(breakdown.values().all(|v| v.is_zero()));
    }

    #[test]
    fn test_total_revenue_by_source() {
        let (engine, ledger, _) = create_test_engine();

        ledger.record_ad_revenue("ad_001", "user_1", 1000, 25, Decimal::new(500, 2)).unwrap();
        ledger.record_monthly_subscription("user_2", "pro", Decimal::new(999, 2)).unwrap();

        assert_eq!(engine.total_revenue(None, None, None), Decimal::new(1499, 2));
        assert_eq!(
            engine.total_revenue(None, None, Some(RevenueSource::WebsiteAds)),
            Decimal::new(500, 2)
        );
        assert_eq!(
            engine.total_revenue(None, None, Some(RevenueSource::TeamSubscription)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_fill_rate_comes_from_config() {
        let ledger = Arc::new(RevenueLedger::new(LedgerConfig::default()).unwrap());
        let config = MetricsConfig {
            fill_rate_percent: Decimal::new(875, 1),
            ..MetricsConfig::default()
        };
        let engine = MetricsEngine::new(ledger, config).unwrap();

        assert_eq!(engine.ad_revenue_metrics(None, None).fill_rate, Decimal::new(875, 1));
    }

    #[test]
    fn test_mrr_ignores_events_outside_window() {
        let (engine, ledger, clock) = create_test_engine();

        ledger.record_monthly_subscription("old", "pro", Decimal::new(999, 2)).unwrap();
        clock.advance(Duration::days(31));
        ledger.record_monthly_subscription("new", "team", Decimal::new(4999, 2)).unwrap();

        assert_eq!(engine.mrr(), Decimal::new(4999, 2));
    }

    #[test]
    fn test_mrr_window_edge_is_inclusive() {
        let (engine, ledger, clock) = create_test_engine();

        ledger.record_monthly_subscription("edge", "pro", Decimal::new(999, 2)).unwrap();
        clock.advance(Duration::days(30));

        assert_eq!(engine.mrr(), Decimal::new(999, 2));
    }

    #[test]
    fn test_arpu() {
        let (engine, ledger, _) = create_test_engine();
        ledger.record_monthly_subscription("user_1", "pro", Decimal::from(100)).unwrap();

        assert_eq!(engine.arpu(0, None, None), Decimal::ZERO);
        assert_eq!(engine.arpu(4, None, None), Decimal::from(25));
        assert_eq!(engine.arpu(3, None, None), Decimal::new(3333, 2));
    }

    #[test]
    fn test_cache_hit_then_invalidated_by_append() {
        let (engine, ledger, _) = create_test_engine();
        ledger.record_monthly_subscription("user_1", "pro", Decimal::from(10)).unwrap();

        assert_eq!(engine.total_revenue(None, None, None), Decimal::from(10));
        assert_eq!(engine.total_revenue(None, None, None), Decimal::from(10));
        assert_eq!(engine.cache_stats().hits, 1);

        ledger.record_monthly_subscription("user_2", "pro", Decimal::from(5)).unwrap();
        assert_eq!(engine.total_revenue(None, None, None), Decimal::from(15));
        assert_eq!(engine.cache_stats().invalidations, 1);
    }

    #[test]
    fn test_cache_disabled_never_hits() {
        let ledger = Arc::new(RevenueLedger::new(LedgerConfig::default()).unwrap());
        let config = MetricsConfig {
            cache_enabled: false,
            ..MetricsConfig::default()
        };
        let engine = MetricsEngine::new(ledger, config).unwrap();

        engine.revenue_by_source(None, None);
        engine.revenue_by_source(None, None);

        let stats = engine.cache_stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.entries, 0);
        assert_eq!(engine.metrics().cache_hits.get(), 0);
    }

    #[test]
    fn test_summary_sections_agree() {
        let (engine, ledger, _) = create_test_engine();

        ledger.record_ad_revenue("ad_001", "user_1", 1000, 25, Decimal::new(500, 2)).unwrap();
        ledger.record_subscription_revenue("user_2", "pro", Decimal::new(11988, 2), "annual").unwrap();
        ledger.record_monthly_subscription("user_3", "team", Decimal::new(4999, 2)).unwrap();
        ledger.record_partnership_revenue("acme", "user_4", Decimal::from(100), None).unwrap();

        let summary = engine.monetization_summary();
        assert_eq!(summary.total_revenue, Decimal::new(27487, 2));
        assert_eq!(summary.mrr, engine.mrr());
        assert_eq!(summary.mrr, Decimal::new(5998, 2));
        assert_eq!(summary.ad_metrics.revenue_usd, Decimal::new(500, 2));
        assert_eq!(summary.subscription_metrics.pro_revenue, Decimal::new(11988, 2));
        assert_eq!(summary.subscription_metrics.team_revenue, Decimal::new(4999, 2));
        assert_eq!(
            summary.subscription_metrics.total_subscription_revenue,
            Decimal::new(16987, 2)
        );
        assert_eq!(
            summary.revenue_by_source[&RevenueSource::CustomPartnership],
            Decimal::from(100)
        );
        assert_eq!(summary.period_end - summary.period_start, Duration::days(30));
    }

    #[test]
    fn test_export_unsupported_format() {
        let (engine, _, _) = create_test_engine();

        let err = engine.export_report(None, None, "xyz").unwrap_err();
        assert!(matches!(err, crate::Error::UnsupportedFormat(ref f) if f == "xyz"));
        assert_eq!(engine.metrics().report_errors.get(), 1);
    }

    #[test]
    fn test_export_with_explicit_window() {
        let (engine, ledger, clock) = create_test_engine();

        let start = clock.now();
        ledger.record_monthly_subscription("user_1", "pro", Decimal::new(999, 2)).unwrap();
        clock.advance(Duration::days(60));
        ledger.record_monthly_subscription("user_2", "pro", Decimal::from(20)).unwrap();

        let csv = engine
            .export_report(Some(start), Some(start + Duration::days(1)), "csv")
            .unwrap();
        assert!(csv.contains("total_revenue_usd,9.99\n"));

        let trailing = engine.export_report(None, None, "CSV").unwrap();
        assert!(trailing.contains("total_revenue_usd,20.00\n"));
    }

    #[test]
    fn test_export_mrr_stays_trailing_for_wide_window() {
        let (engine, ledger, clock) = create_test_engine();

        let start = clock.now();
        for month in 0..12 {
            if month > 0 {
                clock.advance(Duration::days(31));
            }
            ledger
                .record_monthly_subscription(&format!("user_{}", month), "pro", Decimal::new(999, 2))
                .unwrap();
        }

        let csv = engine
            .export_report(Some(start), Some(clock.now()), "csv")
            .unwrap();
        assert!(csv.contains("total_revenue_usd,119.88\n"));
        assert!(csv.contains(&format!("mrr,{:.2}\n", engine.mrr())));
        assert!(csv.contains("mrr,9.99\n"));

        let summary = engine.summary_between(start, clock.now());
        assert_eq!(summary.mrr, engine.mrr());
        assert_eq!(summary.subscription_metrics.pro_revenue, Decimal::new(11988, 2));
    }

    #[test]
    fn test_trailing_queries_hit_cache_on_system_clock() {
        let ledger =
            Arc::new(RevenueLedger::with_clock(LedgerConfig::default(), Arc::new(SystemClock)).unwrap());
        let engine = MetricsEngine::new(ledger.clone(), MetricsConfig::default()).unwrap();
        ledger.record_monthly_subscription("user_1", "pro", Decimal::new(999, 2)).unwrap();

        for _ in 0..100 {
            engine.mrr();
            engine.monetization_summary();
        }

        let stats = engine.cache_stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 198);
        assert_eq!(stats.entries, 2);
        assert_eq!(engine.monetization_summary().mrr, Decimal::new(999, 2));
    }

    #[test]
    fn test_cached_summary_refreshes_generated_at() {
        let (engine, ledger, clock) = create_test_engine();
        let start = clock.now();
        ledger.record_monthly_subscription("user_1", "pro", Decimal::new(999, 2)).unwrap();
        let end = clock.now();

        let first = engine.summary_between(start, end);
        clock.advance(Duration::hours(1));
        let second = engine.summary_between(start, end);

        assert_eq!(engine.cache_stats().hits, 1);
        assert_eq!(first.generated_at, start);
        assert_eq!(second.generated_at, clock.now());
        assert_eq!(second.total_revenue, first.total_revenue);
        assert_eq!(second.period_end, end);
    }
}
