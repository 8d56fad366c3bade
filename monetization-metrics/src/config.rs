//! Configuration for the metrics engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metrics engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Service name
    pub service_name: String,

    /// Ad fill rate reported with ad metrics (percent).
    ///
    /// Supplied by the ad server; never derived from ledger events.
    pub fill_rate_percent: Decimal,

    /// Trailing window for MRR and the monetization summary (days)
    pub reporting_window_days: i64,

    /// Memoize query results until the next ledger append
    pub cache_enabled: bool,

    /// Ledger configuration file, if any
    pub ledger_config_path: Option<PathBuf>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            service_name: "monetization-metrics".to_string(),
            fill_rate_percent: Decimal::from(95),
            reporting_window_days: 30,
            cache_enabled: true,
            ledger_config_path: None,
        }
    }
}

impl MetricsConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MetricsConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = MetricsConfig::default();

        if let Ok(value) = std::env::var("METRICS_FILL_RATE") {
            config.fill_rate_percent = value.parse().map_err(|_| {
                crate::Error::Config(format!("METRICS_FILL_RATE must be a decimal, got {:?}", value))
            })?;
        }

        if let Ok(value) = std::env::var("METRICS_WINDOW_DAYS") {
            config.reporting_window_days = value.parse().map_err(|_| {
                crate::Error::Config(format!("METRICS_WINDOW_DAYS must be an integer, got {:?}", value))
            })?;
        }

        if let Ok(value) = std::env::var("METRICS_CACHE_ENABLED") {
            config.cache_enabled = value.parse().map_err(|_| {
                crate::Error::Config(format!("METRICS_CACHE_ENABLED must be a bool, got {:?}", value))
            })?;
        }

        if let Ok(path) = std::env::var("LEDGER_CONFIG_PATH") {
            config.ledger_config_path = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> crate::Result<()> {
        if self.reporting_window_days <= 0 {
            return Err(crate::Error::Config(format!(
                "reporting_window_days must be positive, got {}",
                self.reporting_window_days
            )));
        }

        if self.fill_rate_percent < Decimal::ZERO || self.fill_rate_percent > Decimal::ONE_HUNDRED {
            return Err(crate::Error::Config(format!(
                "fill_rate_percent must be within 0..=100, got {}",
                self.fill_rate_percent
            )));
        }

        Ok(())
    }

    /// Reporting window as a duration
    pub fn reporting_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.reporting_window_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert_eq!(config.fill_rate_percent, Decimal::from(95));
        assert_eq!(config.reporting_window_days, 30);
        assert!(config.cache_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fill_rate_percent = 87.5").unwrap();
        writeln!(file, "cache_enabled = false").unwrap();

        let config = MetricsConfig::from_file(file.path()).unwrap();
        assert_eq!(config.fill_rate_percent, Decimal::new(875, 1));
        assert!(!config.cache_enabled);
        assert_eq!(config.reporting_window_days, 30);
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let config = MetricsConfig {
            reporting_window_days: 0,
            ..MetricsConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MetricsConfig {
            fill_rate_percent: Decimal::from(120),
            ..MetricsConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
