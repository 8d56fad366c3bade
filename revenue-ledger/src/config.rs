//! Configuration for the revenue ledger

use serde::{Deserialize, Serialize};

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Reject negative amounts at the append boundary
    pub validate_amounts: bool,

    /// Pre-allocated event capacity
    pub initial_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            service_name: "revenue-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            validate_amounts: true,
            initial_capacity: 1024,
        }
    }
}

impl LedgerConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LedgerConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = LedgerConfig::default();

        if let Ok(value) = std::env::var("LEDGER_VALIDATE_AMOUNTS") {
            config.validate_amounts = value.parse().map_err(|_| {
                crate::Error::Config(format!("LEDGER_VALIDATE_AMOUNTS must be a bool, got {:?}", value))
            })?;
        }

        if let Ok(value) = std::env::var("LEDGER_INITIAL_CAPACITY") {
            config.initial_capacity = value.parse().map_err(|_| {
                crate::Error::Config(format!("LEDGER_INITIAL_CAPACITY must be an integer, got {:?}", value))
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.service_name, "revenue-ledger");
        assert!(config.validate_amounts);
        assert_eq!(config.initial_capacity, 1024);
    }

    #[test]
    fn test_from_file_fills_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "validate_amounts = false").unwrap();

        let config = LedgerConfig::from_file(file.path()).unwrap();
        assert!(!config.validate_amounts);
        assert_eq!(config.service_name, "revenue-ledger");
    }

    #[test]
    fn test_from_file_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "validate_amounts = [").unwrap();

        let err = LedgerConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
