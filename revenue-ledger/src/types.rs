//! Core types for the revenue ledger
//!
//! All types are designed for:
//! - Immutability once recorded (private fields, read-only accessors)
//! - Exact arithmetic (Decimal for money and ratios)
//! - A closed metadata shape per revenue source

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Revenue source
///
/// Declaration order is the reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueSource {
    /// Display advertising on the website
    WebsiteAds,
    /// Pro tier subscription
    ProSubscription,
    /// Team tier subscription
    TeamSubscription,
    /// Custom partnership deal
    CustomPartnership,
}

impl RevenueSource {
    /// Every source, in declaration order
    pub const ALL: [RevenueSource; 4] = [
        RevenueSource::WebsiteAds,
        RevenueSource::ProSubscription,
        RevenueSource::TeamSubscription,
        RevenueSource::CustomPartnership,
    ];

    /// Stable name used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            RevenueSource::WebsiteAds => "website_ads",
            RevenueSource::ProSubscription => "pro_subscription",
            RevenueSource::TeamSubscription => "team_subscription",
            RevenueSource::CustomPartnership => "custom_partnership",
        }
    }

    /// Subscription source for a billing tier.
    ///
    /// `"pro"` in any case maps to [`RevenueSource::ProSubscription`], every
    /// other tier is billed as a team subscription.
    pub fn for_tier(tier: &str) -> Self {
        if tier.eq_ignore_ascii_case("pro") {
            RevenueSource::ProSubscription
        } else {
            RevenueSource::TeamSubscription
        }
    }

    /// Whether this source counts towards recurring revenue
    pub fn is_subscription(&self) -> bool {
        matches!(
            self,
            RevenueSource::ProSubscription | RevenueSource::TeamSubscription
        )
    }
}

impl FromStr for RevenueSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "website_ads" => Ok(RevenueSource::WebsiteAds),
            "pro_subscription" => Ok(RevenueSource::ProSubscription),
            "team_subscription" => Ok(RevenueSource::TeamSubscription),
            "custom_partnership" => Ok(RevenueSource::CustomPartnership),
            other => Err(Error::Other(format!("Unknown revenue source: {}", other))),
        }
    }
}

impl fmt::Display for RevenueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription billing cadence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BillingPeriod {
    /// Billed every month
    Monthly,
    /// Billed once a year
    Annual,
    /// Any other cadence, kept verbatim and treated as monthly
    Other(String),
}

impl BillingPeriod {
    /// Parse a caller-supplied period (case-insensitive)
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("monthly") {
            BillingPeriod::Monthly
        } else if s.eq_ignore_ascii_case("annual") {
            BillingPeriod::Annual
        } else {
            BillingPeriod::Other(s.to_string())
        }
    }

    /// Period name
    pub fn as_str(&self) -> &str {
        match self {
            BillingPeriod::Monthly => "monthly",
            BillingPeriod::Annual => "annual",
            BillingPeriod::Other(s) => s,
        }
    }

    /// Normalize an amount billed for this period to a monthly amount
    pub fn monthly_amount(&self, amount: Decimal) -> Decimal {
        match self {
            BillingPeriod::Annual => amount / Decimal::from(12),
            _ => amount,
        }
    }
}

impl Default for BillingPeriod {
    fn default() -> Self {
        BillingPeriod::Monthly
    }
}

impl From<String> for BillingPeriod {
    fn from(s: String) -> Self {
        BillingPeriod::parse(&s)
    }
}

impl From<BillingPeriod> for String {
    fn from(period: BillingPeriod) -> Self {
        period.as_str().to_string()
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata recorded with an ad revenue event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdMetadata {
    /// Ad unit identifier
    pub ad_id: String,
    /// Impressions served
    pub impressions: u64,
    /// Clicks received
    pub clicks: u64,
    /// Click-through rate (percent, unrounded)
    pub ctr: Decimal,
}

/// Metadata recorded with a subscription payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionMetadata {
    /// Tier as supplied by billing
    pub tier: String,
    /// Billing cadence
    pub billing_period: BillingPeriod,
}

/// Metadata recorded with a partnership payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnershipMetadata {
    /// Partner identifier
    pub partner_id: String,
    /// Free-form deal description
    pub description: Option<String>,
}

/// Source-specific event metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventMetadata {
    /// Ad impressions and clicks
    Ad(AdMetadata),
    /// Subscription tier and cadence
    Subscription(SubscriptionMetadata),
    /// Partnership deal
    Partnership(PartnershipMetadata),
}

/// Immutable record of one revenue-generating occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueEvent {
    event_id: String,
    source: RevenueSource,
    amount_usd: Decimal,
    user_id: String,
    timestamp: DateTime<Utc>,
    metadata: EventMetadata,
}

impl RevenueEvent {
    pub(crate) fn new(
        event_id: String,
        source: RevenueSource,
        amount_usd: Decimal,
        user_id: String,
        timestamp: DateTime<Utc>,
        metadata: EventMetadata,
    ) -> Self {
        Self {
            event_id,
            source,
            amount_usd,
            user_id,
            timestamp,
            metadata,
        }
    }

    /// Event identifier
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Revenue source
    pub fn source(&self) -> RevenueSource {
        self.source
    }

    /// Amount in USD
    pub fn amount_usd(&self) -> Decimal {
        self.amount_usd
    }

    /// Paying or viewing user
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Time the event was recorded
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Source-specific metadata
    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    /// Ad metadata, if this is an ad event
    pub fn ad_metadata(&self) -> Option<&AdMetadata> {
        match &self.metadata {
            EventMetadata::Ad(meta) => Some(meta),
            _ => None,
        }
    }

    /// Subscription metadata, if this is a subscription event
    pub fn subscription_metadata(&self) -> Option<&SubscriptionMetadata> {
        match &self.metadata {
            EventMetadata::Subscription(meta) => Some(meta),
            _ => None,
        }
    }

    /// Partnership metadata, if this is a partnership event
    pub fn partnership_metadata(&self) -> Option<&PartnershipMetadata> {
        match &self.metadata {
            EventMetadata::Partnership(meta) => Some(meta),
            _ => None,
        }
    }

    /// Amount normalized to a monthly cadence.
    ///
    /// Annual subscriptions are spread over twelve months; everything else is
    /// returned as recorded.
    pub fn monthly_amount(&self) -> Decimal {
        match &self.metadata {
            EventMetadata::Subscription(meta) => meta.billing_period.monthly_amount(self.amount_usd),
            _ => self.amount_usd,
        }
    }
}

/// Click-through rate in percent; zero when nothing was served
pub fn click_through_rate(clicks: u64, impressions: u64) -> Decimal {
    if impressions == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(clicks) / Decimal::from(impressions) * Decimal::ONE_HUNDRED
}

/// Revenue per thousand impressions; zero when nothing was served.
///
/// Saturates at the `Decimal` range for extreme revenue.
pub fn effective_cpm(revenue: Decimal, impressions: u64) -> Decimal {
    if impressions == 0 {
        return Decimal::ZERO;
    }
    (revenue / Decimal::from(impressions)).saturating_mul(Decimal::ONE_THOUSAND)
}

/// Read filter over the ledger.
///
/// Bounds are inclusive; an absent field does not restrict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RevenueFilter {
    /// Earliest timestamp (inclusive)
    pub start: Option<DateTime<Utc>>,
    /// Latest timestamp (inclusive)
    pub end: Option<DateTime<Utc>>,
    /// Restrict to one source
    pub source: Option<RevenueSource>,
}

impl RevenueFilter {
    /// Filter matching every event
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter on an inclusive time range
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            source: None,
        }
    }

    /// Set the lower bound
    pub fn since(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    /// Set the upper bound
    pub fn until(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Restrict to one source
    pub fn with_source(mut self, source: RevenueSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Check whether an event passes this filter
    pub fn matches(&self, event: &RevenueEvent) -> bool {
        if let Some(start) = self.start {
            if event.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if event.timestamp > end {
                return false;
            }
        }
        match self.source {
            Some(source) => event.source == source,
            None => true,
        }
    }
}
