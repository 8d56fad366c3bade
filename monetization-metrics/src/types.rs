//! Derived metric and report types

use chrono::{DateTime, Utc};
use revenue_ledger::RevenueSource;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Revenue per source, iterated in the enumeration's declared order
pub type RevenueBreakdown = BTreeMap<RevenueSource, Decimal>;

/// Ad performance over a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdRevenueMetrics {
    /// Impressions served
    pub impressions: u64,
    /// Clicks received
    pub clicks: u64,
    /// Click-through rate (percent, 2dp)
    pub ctr: Decimal,
    /// Ad revenue (USD, 2dp)
    pub revenue_usd: Decimal,
    /// Revenue per thousand impressions (USD, 2dp)
    pub ecpm: Decimal,
    /// Configured fill rate (percent)
    pub fill_rate: Decimal,
}

/// Subscription revenue split by tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionMetrics {
    /// Pro tier revenue (USD, 2dp)
    pub pro_revenue: Decimal,
    /// Team tier revenue (USD, 2dp)
    pub team_revenue: Decimal,
    /// `pro_revenue + team_revenue`
    pub total_subscription_revenue: Decimal,
}

/// Everything a monetization dashboard shows for one window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonetizationSummary {
    /// When the summary was computed
    pub generated_at: DateTime<Utc>,
    /// Window start (inclusive)
    pub period_start: DateTime<Utc>,
    /// Window end (inclusive)
    pub period_end: DateTime<Utc>,
    /// All revenue in the window (USD, 2dp)
    pub total_revenue: Decimal,
    /// Revenue per source, one entry per source
    pub revenue_by_source: RevenueBreakdown,
    /// Monthly recurring revenue (USD, 2dp)
    pub mrr: Decimal,
    /// Ad performance
    pub ad_metrics: AdRevenueMetrics,
    /// Subscription revenue by tier
    pub subscription_metrics: SubscriptionMetrics,
}

/// Report serialization format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Pretty-printed JSON of the whole summary
    Json,
    /// Flat `metric,value` table
    Csv,
}

impl ReportFormat {
    /// File extension
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        }
    }

    /// MIME type
    pub fn mime_type(&self) -> &'static str {
        match self {
            ReportFormat::Json => "application/json",
            ReportFormat::Csv => "text/csv",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("json") {
            Ok(ReportFormat::Json)
        } else if s.eq_ignore_ascii_case("csv") {
            Ok(ReportFormat::Csv)
        } else {
            Err(Error::UnsupportedFormat(s.to_string()))
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}
