//! Metrics collection for observability
//!
//! Prometheus metrics for monitoring the revenue ledger.
//!
//! # Metrics
//!
//! - `revenue_ledger_events_total{source}` - Events appended per source
//! - `revenue_ledger_rejected_total` - Events rejected at the append boundary
//! - `revenue_ledger_revenue_usd_total` - Revenue recorded (USD)
//! - `revenue_ledger_size` - Events held in memory

use prometheus::{Counter, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::fmt;
use std::sync::Arc;

use crate::types::RevenueSource;

/// Metrics collector
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Events appended, labelled by source
    pub events_total: IntCounterVec,

    /// Events rejected by validation
    pub rejected_total: IntCounter,

    /// Revenue recorded (USD)
    pub revenue_total: Counter,

    /// Events currently held
    pub ledger_size: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl LedgerMetrics {
    /// Create new metrics collector on a private registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let events_total = IntCounterVec::new(
            Opts::new("revenue_ledger_events_total", "Revenue events appended"),
            &["source"],
        )?;
        registry.register(Box::new(events_total.clone()))?;

        let rejected_total = IntCounter::new(
            "revenue_ledger_rejected_total",
            "Revenue events rejected at the append boundary",
        )?;
        registry.register(Box::new(rejected_total.clone()))?;

        let revenue_total = Counter::new(
            "revenue_ledger_revenue_usd_total",
            "Revenue recorded in USD",
        )?;
        registry.register(Box::new(revenue_total.clone()))?;

        let ledger_size = IntGauge::new("revenue_ledger_size", "Revenue events held in memory")?;
        registry.register(Box::new(ledger_size.clone()))?;

        Ok(Self {
            events_total,
            rejected_total,
            revenue_total,
            ledger_size,
            registry,
        })
    }

    /// Record an appended event
    pub fn record_event(&self, source: RevenueSource, amount_usd: f64, ledger_size: usize) {
        self.events_total.with_label_values(&[source.as_str()]).inc();
        if amount_usd > 0.0 {
            self.revenue_total.inc_by(amount_usd);
        }
        self.ledger_size.set(ledger_size as i64);
    }

    /// Record a rejected event
    pub fn record_rejection(&self) {
        self.rejected_total.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for LedgerMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerMetrics")
            .field("rejected_total", &self.rejected_total.get())
            .field("revenue_total", &self.revenue_total.get())
            .field("ledger_size", &self.ledger_size.get())
            .finish_non_exhaustive()
    }
}
