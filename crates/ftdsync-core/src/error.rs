use std::path::PathBuf;

use thiserror::Error;

/// Reasons a raw `|`-delimited report line is dropped.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LineReject {
    #[error("line has {found} fields, expected at least 6")]
    TooFewFields { found: usize },
    #[error("settlement date is not an 8-digit calendar date")]
    InvalidSettlementDate,
    #[error("ticker field is empty")]
    EmptyTicker,
    #[error("quantity is not a positive integer")]
    InvalidQuantity,
}

/// Reasons a raw ticker cannot be normalized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TickerReject {
    #[error("defunct ticker '{ticker}' has no recoverable prefix")]
    UnrecoverableDefunct { ticker: String },
    #[error("ticker '{ticker}' is empty after cleaning")]
    Empty { ticker: String },
}

/// Failure reported by a ticker-to-identifier mapping provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("no identifier for ticker '{ticker}' as of {as_of}")]
    UnknownTicker { ticker: String, as_of: String },
}

/// Errors raised by the rate-limited fetcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("exhausted {attempts} attempts for {url}: {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
    #[error("{url} rejected with status {status}")]
    Rejected { url: String, status: u16 },
    #[error("request to {url} could not be sent: {message}")]
    Unsendable { url: String, message: String },
}

/// Invalid run configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("requests per second must be greater than zero")]
    ZeroRateLimit,
    #[error("retry count must be greater than zero")]
    ZeroRetries,
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
    #[error("catalog url '{url}' is not an absolute http(s) url")]
    InvalidCatalogUrl { url: String },
}

/// Top-level error type for sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("ticker mapping dataset not found at {}", path.display())]
    MissingPrerequisite { path: PathBuf },

    #[error("distribution catalog unavailable: {reason}")]
    DiscoveryUnavailable { reason: String },

    #[error("archive for {title} has {entries} payload entries, expected exactly one")]
    ArchivePayloadMissing { title: String, entries: usize },

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("distribution task failed: {0}")]
    Task(String),
}
