//! Aggregations over a slice of ledger events
//!
//! Every function here is pure: the engine takes one ledger snapshot and
//! runs any number of these over it. Sums are kept exact and only rounded
//! where a function documents it. Sums saturate at the `Decimal` range
//! instead of overflowing.

use revenue_ledger::types::{click_through_rate, effective_cpm};
use revenue_ledger::{RevenueEvent, RevenueSource};
use rust_decimal::Decimal;

use crate::types::{AdRevenueMetrics, RevenueBreakdown, SubscriptionMetrics};

/// Round to cents (banker's rounding)
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp(2)
}

fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Sum of amounts; zero when empty
pub fn total(events: &[RevenueEvent]) -> Decimal {
    saturating_sum(events.iter().map(RevenueEvent::amount_usd))
}

/// Sum of amounts for one source
pub fn total_for(events: &[RevenueEvent], source: RevenueSource) -> Decimal {
    saturating_sum(
        events
            .iter()
            .filter(|e| e.source() == source)
            .map(RevenueEvent::amount_usd),
    )
}

/// Revenue per source, rounded to cents.
///
/// Every source gets an entry, including those with no events.
pub fn by_source(events: &[RevenueEvent]) -> RevenueBreakdown {
    let mut breakdown: RevenueBreakdown = RevenueSource::ALL
        .iter()
        .map(|source| (*source, Decimal::ZERO))
        .collect();

    for event in events {
        let amount = breakdown.entry(event.source()).or_insert(Decimal::ZERO);
        *amount = amount.saturating_add(event.amount_usd());
    }

    for amount in breakdown.values_mut() {
        *amount = round2(*amount);
    }

    breakdown
}

/// Ad performance over the ad events in `events`
pub fn ad_metrics(events: &[RevenueEvent], fill_rate: Decimal) -> AdRevenueMetrics {
    let mut impressions = 0u64;
    let mut clicks = 0u64;
    let mut revenue = Decimal::ZERO;

    for event in events.iter().filter(|e| e.source() == RevenueSource::WebsiteAds) {
        if let Some(meta) = event.ad_metadata() {
            impressions = impressions.saturating_add(meta.impressions);
            clicks = clicks.saturating_add(meta.clicks);
        }
        revenue = revenue.saturating_add(event.amount_usd());
    }

    AdRevenueMetrics {
        impressions,
        clicks,
        ctr: round2(click_through_rate(clicks, impressions)),
        revenue_usd: round2(revenue),
        ecpm: round2(effective_cpm(revenue, impressions)),
        fill_rate,
    }
}

/// Subscription revenue normalized to a month, rounded to cents.
///
/// Annual payments count one twelfth; every other period counts in full.
pub fn monthly_recurring(events: &[RevenueEvent]) -> Decimal {
    let mrr = saturating_sum(
        events
            .iter()
            .filter(|e| e.source().is_subscription())
            .map(RevenueEvent::monthly_amount),
    );
    round2(mrr)
}

/// Subscription revenue split by tier
pub fn subscriptions(events: &[RevenueEvent]) -> SubscriptionMetrics {
    let pro_revenue = round2(total_for(events, RevenueSource::ProSubscription));
    let team_revenue = round2(total_for(events, RevenueSource::TeamSubscription));

    SubscriptionMetrics {
        pro_revenue,
        team_revenue,
        total_subscription_revenue: pro_revenue.saturating_add(team_revenue),
    }
}

/// Revenue per user, rounded to cents; zero for an empty user base
pub fn per_user(revenue: Decimal, total_users: u64) -> Decimal {
    if total_users == 0 {
        return Decimal::ZERO;
    }
    round2(revenue / Decimal::from(total_users))
}
