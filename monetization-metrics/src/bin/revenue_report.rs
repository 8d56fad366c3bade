//! Revenue report binary
//!
//! Seeds a ledger with sample ad and subscription revenue and prints the
//! monetization report.
//!
//! ```bash
//! revenue-report --format csv
//! revenue-report --format json --users 1200
//! ```

use anyhow::Context;
use clap::Parser;
use monetization_metrics::{MetricsConfig, MetricsEngine};
use revenue_ledger::{LedgerConfig, RevenueLedger};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "revenue-report")]
#[command(about = "Print a monetization report for a sample revenue ledger", long_about = None)]
struct Cli {
    /// Report format (json or csv)
    #[arg(long, short, env = "REPORT_FORMAT", default_value = "json")]
    format: String,

    /// Metrics configuration file (TOML)
    #[arg(long, short, env = "METRICS_CONFIG")]
    config: Option<PathBuf>,

    /// User base for the ARPU line
    #[arg(long, default_value_t = 0)]
    users: u64,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    // Load configuration
    let config = match &cli.config {
        Some(path) => MetricsConfig::from_file(path)
            .with_context(|| format!("loading metrics config from {}", path.display()))?,
        None => MetricsConfig::from_env().context("loading metrics config from environment")?,
    };
    let ledger_config = match &config.ledger_config_path {
        Some(path) => LedgerConfig::from_file(path)
            .with_context(|| format!("loading ledger config from {}", path.display()))?,
        None => LedgerConfig::from_env().context("loading ledger config from environment")?,
    };

    tracing::info!(service = %config.service_name, "Starting revenue report");

    let ledger = Arc::new(RevenueLedger::new(ledger_config)?);
    seed(&ledger)?;
    tracing::info!(events = ledger.len(), "Ledger seeded");

    let engine = MetricsEngine::new(ledger, config)?;
    let report = engine.export_report(None, None, &cli.format)?;
    println!("{}", report);

    if cli.users > 0 {
        let arpu = engine.arpu(cli.users, None, None);
        tracing::info!(users = cli.users, %arpu, "Average revenue per user");
    }

    Ok(())
}

fn seed(ledger: &RevenueLedger) -> revenue_ledger::Result<()> {
    ledger.record_ad_revenue("ad_001", "user_1", 1000, 25, Decimal::new(500, 2))?;
    ledger.record_ad_revenue("ad_002", "user_2", 1000, 15, Decimal::new(300, 2))?;
    ledger.record_subscription_revenue("user_3", "pro", Decimal::new(999, 2), "monthly")?;
    ledger.record_subscription_revenue("user_4", "pro", Decimal::new(11988, 2), "annual")?;
    ledger.record_subscription_revenue("user_5", "team", Decimal::new(4999, 2), "monthly")?;
    ledger.record_partnership_revenue("partner_001", "user_6", Decimal::from(250), Some("Newsletter sponsorship"))?;
    Ok(())
}
