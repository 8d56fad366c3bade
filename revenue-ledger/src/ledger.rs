//! Append-only revenue ledger
//!
//! Owns the ordered history of revenue events. Every append goes through a
//! single write lock that also bumps the ledger generation, so readers either
//! see an event together with its generation bump or see neither.
//!
//! # Example
//!
//! ```
//! use revenue_ledger::{LedgerConfig, RevenueFilter, RevenueLedger};
//! use rust_decimal::Decimal;
//!
//! # fn main() -> revenue_ledger::Result<()> {
//! let ledger = RevenueLedger::new(LedgerConfig::default())?;
//! ledger.record_ad_revenue("ad_001", "user_1", 1000, 25, Decimal::new(500, 2))?;
//! ledger.record_subscription_revenue("user_2", "pro", Decimal::new(999, 2), "monthly")?;
//!
//! assert_eq!(ledger.query(&RevenueFilter::all()).len(), 2);
//! # Ok(())
//! # }
//! ```

use crate::{
    clock::{Clock, SystemClock},
    metrics::LedgerMetrics,
    types::{
        click_through_rate, AdMetadata, BillingPeriod, EventMetadata, PartnershipMetadata,
        RevenueEvent, RevenueFilter, RevenueSource, SubscriptionMetadata,
    },
    Error, LedgerConfig, Result,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Events plus the append counter, guarded together
#[derive(Debug, Default)]
struct LedgerState {
    events: Vec<RevenueEvent>,
    generation: u64,
}

/// Consistent read of the ledger
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    /// Ledger generation the events were read at
    pub generation: u64,
    /// Matching events in append order
    pub events: Vec<RevenueEvent>,
}

/// In-memory revenue ledger
#[derive(Debug)]
pub struct RevenueLedger {
    state: RwLock<LedgerState>,
    clock: Arc<dyn Clock>,
    metrics: LedgerMetrics,
    config: LedgerConfig,
}

impl RevenueLedger {
    /// Open a ledger on the system clock
    pub fn new(config: LedgerConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Open a ledger on a caller-supplied clock
    pub fn with_clock(config: LedgerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let metrics = LedgerMetrics::new()?;
        let state = LedgerState {
            events: Vec::with_capacity(config.initial_capacity),
            generation: 0,
        };

        tracing::debug!(
            service = %config.service_name,
            validate_amounts = config.validate_amounts,
            "Opened revenue ledger"
        );

        Ok(Self {
            state: RwLock::new(state),
            clock,
            metrics,
            config,
        })
    }

    /// Record revenue from an ad unit
    ///
    /// CTR is `clicks / impressions * 100`, or zero when no impressions were
    /// served.
    pub fn record_ad_revenue(
        &self,
        ad_id: &str,
        user_id: &str,
        impressions: u64,
        clicks: u64,
        revenue_usd: Decimal,
    ) -> Result<RevenueEvent> {
        self.validate_amount(revenue_usd, RevenueSource::WebsiteAds)?;

        let timestamp = self.clock.now();
        let metadata = AdMetadata {
            ad_id: ad_id.to_string(),
            impressions,
            clicks,
            ctr: click_through_rate(clicks, impressions),
        };

        let event = RevenueEvent::new(
            format!("ad_{}_{}_{}", ad_id, user_id, timestamp.timestamp_millis()),
            RevenueSource::WebsiteAds,
            revenue_usd,
            user_id.to_string(),
            timestamp,
            EventMetadata::Ad(metadata),
        );

        Ok(self.append(event))
    }

    /// Record a subscription payment
    ///
    /// A `"pro"` tier (any case) books as a pro subscription, every other
    /// tier as a team subscription.
    pub fn record_subscription_revenue(
        &self,
        user_id: &str,
        tier: &str,
        amount_usd: Decimal,
        billing_period: &str,
    ) -> Result<RevenueEvent> {
        let source = RevenueSource::for_tier(tier);
        self.validate_amount(amount_usd, source)?;

        let timestamp = self.clock.now();
        let metadata = SubscriptionMetadata {
            tier: tier.to_string(),
            billing_period: BillingPeriod::parse(billing_period),
        };

        let event = RevenueEvent::new(
            format!("sub_{}_{}_{}", user_id, tier, timestamp.timestamp_millis()),
            source,
            amount_usd,
            user_id.to_string(),
            timestamp,
            EventMetadata::Subscription(metadata),
        );

        Ok(self.append(event))
    }

    /// Record a monthly subscription payment
    pub fn record_monthly_subscription(
        &self,
        user_id: &str,
        tier: &str,
        amount_usd: Decimal,
    ) -> Result<RevenueEvent> {
        self.record_subscription_revenue(user_id, tier, amount_usd, BillingPeriod::Monthly.as_str())
    }

    /// Record a payment under a custom partnership
    pub fn record_partnership_revenue(
        &self,
        partner_id: &str,
        user_id: &str,
        amount_usd: Decimal,
        description: Option<&str>,
    ) -> Result<RevenueEvent> {
        self.validate_amount(amount_usd, RevenueSource::CustomPartnership)?;

        let timestamp = self.clock.now();
        let metadata = PartnershipMetadata {
            partner_id: partner_id.to_string(),
            description: description.map(str::to_string),
        };

        let event = RevenueEvent::new(
            format!("partner_{}_{}_{}", partner_id, user_id, timestamp.timestamp_millis()),
            RevenueSource::CustomPartnership,
            amount_usd,
            user_id.to_string(),
            timestamp,
            EventMetadata::Partnership(metadata),
        );

        Ok(self.append(event))
    }

    /// Events matching optional bounds and source, in append order
    pub fn filter(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        source: Option<RevenueSource>,
    ) -> Vec<RevenueEvent> {
        self.query(&RevenueFilter { start, end, source })
    }

    /// Events matching `filter`, in append order
    pub fn query(&self, filter: &RevenueFilter) -> Vec<RevenueEvent> {
        self.snapshot(filter).events
    }

    /// Matching events together with the generation they were read at
    pub fn snapshot(&self, filter: &RevenueFilter) -> LedgerSnapshot {
        let state = self.state.read();
        let events = state
            .events
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();

        LedgerSnapshot {
            generation: state.generation,
            events,
        }
    }

    /// Every event, in append order
    pub fn events(&self) -> Vec<RevenueEvent> {
        self.state.read().events.clone()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.state.read().events.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.state.read().events.is_empty()
    }

    /// Append counter; changes on every recorded event
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Current instant on the ledger's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Clock shared with readers that need the ledger's notion of now
    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Ledger metrics
    pub fn metrics(&self) -> &LedgerMetrics {
        &self.metrics
    }

    /// Ledger configuration
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn append(&self, event: RevenueEvent) -> RevenueEvent {
        let ledger_size = {
            let mut state = self.state.write();
            state.events.push(event.clone());
            state.generation += 1;
            state.events.len()
        };

        self.metrics.record_event(
            event.source(),
            event.amount_usd().to_f64().unwrap_or(0.0),
            ledger_size,
        );

        tracing::debug!(
            event_id = %event.event_id(),
            source = %event.source(),
            amount_usd = %event.amount_usd(),
            "Recorded revenue event"
        );

        event
    }

    fn validate_amount(&self, amount_usd: Decimal, source: RevenueSource) -> Result<()> {
        if self.config.validate_amounts && amount_usd < Decimal::ZERO {
            self.metrics.record_rejection();
            tracing::warn!(%source, %amount_usd, "Rejected revenue event with negative amount");
            return Err(Error::InvalidEvent(format!(
                "Amount must be non-negative, got {} for {}",
                amount_usd, source
            )));
        }
        Ok(())
    }
}
