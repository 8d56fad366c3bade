//! Monetization Metrics
//!
//! Derived monetization metrics and reports over a [`revenue_ledger`]:
//! total revenue, revenue by source, ad performance (CTR, eCPM), MRR, ARPU,
//! and JSON/CSV summary exports.
//!
//! # Architecture
//!
//! - **Snapshot reads**: Each query aggregates one consistent ledger read
//! - **Pure aggregation**: [`aggregate`] functions never touch shared state
//! - **Generation cache**: Results live until the ledger records another event
//!
//! # Rounding
//!
//! Sums stay exact (`Decimal`); monetary and ratio outputs are rounded to two
//! decimal places only when they leave an operation.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod report;
pub mod types;

// Re-exports
pub use cache::CacheStats;
pub use config::MetricsConfig;
pub use engine::MetricsEngine;
pub use error::{Error, Result};
pub use types::{
    AdRevenueMetrics, MonetizationSummary, ReportFormat, RevenueBreakdown, SubscriptionMetrics,
};
