//! Error types for the metrics engine

use thiserror::Error;

/// Result type for metrics and reporting operations
pub type Result<T> = std::result::Result<T, Error>;

/// Metrics engine errors
#[derive(Error, Debug)]
pub enum Error {
    /// Report format other than json or csv
    #[error("Unsupported report format: {0}")]
    UnsupportedFormat(String),

    /// Report serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error raised by the underlying ledger
    #[error("Ledger error: {0}")]
    Ledger(#[from] revenue_ledger::Error),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
