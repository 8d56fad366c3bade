//! Report serialization
//!
//! Two formats:
//! - JSON: the whole [`MonetizationSummary`], pretty-printed
//! - CSV: a fixed `metric,value` table of the headline numbers

use crate::types::{MonetizationSummary, ReportFormat};
use crate::Result;

/// CSV header line
pub const CSV_HEADER: &str = "metric,value";

/// Serialize a summary in the given format
pub fn render(summary: &MonetizationSummary, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => to_json(summary),
        ReportFormat::Csv => Ok(to_csv(summary)),
    }
}

/// Pretty JSON of the whole summary
pub fn to_json(summary: &MonetizationSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Headline numbers as an 8-line `metric,value` table
pub fn to_csv(summary: &MonetizationSummary) -> String {
    let ads = &summary.ad_metrics;
    let subscriptions = &summary.subscription_metrics;

    let mut content = String::new();
    content.push_str(CSV_HEADER);
    content.push('\n');
    content.push_str(&format!("total_revenue_usd,{:.2}\n", summary.total_revenue));
    content.push_str(&format!("mrr,{:.2}\n", summary.mrr));
    content.push_str(&format!("ad_revenue,{:.2}\n", ads.revenue_usd));
    content.push_str(&format!(
        "subscription_revenue,{:.2}\n",
        subscriptions.total_subscription_revenue
    ));
    content.push_str(&format!("ad_impressions,{}\n", ads.impressions));
    content.push_str(&format!("ad_clicks,{}\n", ads.clicks));
    content.push_str(&format!("ad_ctr,{:.2}\n", ads.ctr));
    content
}
