//! Revenue Ledger
//!
//! Append-only, in-memory ledger of monetization events: ad revenue,
//! subscription payments and partnership deals.
//!
//! # Architecture
//!
//! - **Append-only**: Events are immutable once recorded and never deleted
//! - **Single lock**: One `RwLock` guards the events and the append counter
//! - **Injected clock**: Timestamps come from a [`Clock`], never the caller
//!
//! # Invariants
//!
//! - `amount_usd >= 0` unless validation is switched off in [`LedgerConfig`]
//! - Reads return events in append order
//! - The generation counter changes on every append

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod types;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LedgerConfig;
pub use error::{Error, Result};
pub use ledger::{LedgerSnapshot, RevenueLedger};
pub use metrics::LedgerMetrics;
pub use types::{
    AdMetadata, BillingPeriod, EventMetadata, PartnershipMetadata, RevenueEvent, RevenueFilter,
    RevenueSource, SubscriptionMetadata,
};
