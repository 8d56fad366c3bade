//! Prometheus metrics for the metrics engine
//!
//! - `monetization_queries_total{query}` - Queries served
//! - `monetization_cache_hits_total` - Queries answered from cache
//! - `monetization_reports_total{format}` - Reports exported
//! - `monetization_report_errors_total` - Report exports that failed

use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct EngineMetrics {
    /// Queries served, labelled by query
    pub queries_total: IntCounterVec,

    /// Cache hits
    pub cache_hits: IntCounter,

    /// Reports exported, labelled by format
    pub reports_total: IntCounterVec,

    /// Failed report exports
    pub report_errors: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl EngineMetrics {
    /// Create new metrics collector on a private registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let queries_total = IntCounterVec::new(
            Opts::new("monetization_queries_total", "Metric queries served"),
            &["query"],
        )?;
        registry.register(Box::new(queries_total.clone()))?;

        let cache_hits = IntCounter::new(
            "monetization_cache_hits_total",
            "Metric queries answered from cache",
        )?;
        registry.register(Box::new(cache_hits.clone()))?;

        let reports_total = IntCounterVec::new(
            Opts::new("monetization_reports_total", "Reports exported"),
            &["format"],
        )?;
        registry.register(Box::new(reports_total.clone()))?;

        let report_errors = IntCounter::new(
            "monetization_report_errors_total",
            "Report exports that failed",
        )?;
        registry.register(Box::new(report_errors.clone()))?;

        Ok(Self {
            queries_total,
            cache_hits,
            reports_total,
            report_errors,
            registry,
        })
    }

    /// Record a served query
    pub fn record_query(&self, query: &str, cache_hit: bool) {
        self.queries_total.with_label_values(&[query]).inc();
        if cache_hit {
            self.cache_hits.inc();
        }
    }

    /// Record an exported report
    pub fn record_report(&self, format: &str) {
        self.reports_total.with_label_values(&[format]).inc();
    }

    /// Record a failed export
    pub fn record_report_error(&self) {
        self.report_errors.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for EngineMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineMetrics")
            .field("cache_hits", &self.cache_hits.get())
            .field("report_errors", &self.report_errors.get())
            .finish_non_exhaustive()
    }
}
