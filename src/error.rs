//! Error types for tag-harvest
//!
//! Two layers of errors exist:
//! - [`Error`] covers run-level failures (bad configuration, unreadable input,
//!   output that cannot be written). These abort a run.
//! - [`FetchError`] covers a single song lookup. It never leaves the worker that
//!   produced it; the pool logs it and, depending on the failure policy, keeps a
//!   [`TaskFailure`](crate::types::TaskFailure) record of it.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for tag-harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tag-harvest
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_workers")
        key: Option<String>,
    },

    /// The requested song range does not fit the loaded input
    #[error("invalid song range {from}..{to} for {total} songs")]
    InvalidRange {
        /// First song index (inclusive)
        from: usize,
        /// Last song index (exclusive)
        to: usize,
        /// Number of songs in the input
        total: usize,
    },

    /// An input row could not be turned into a song
    #[error("invalid row {line} in {path}: {reason}")]
    InvalidRow {
        /// Input file the row came from
        path: PathBuf,
        /// One-based line number
        line: u64,
        /// What was wrong with the row
        reason: String,
    },

    /// Submission to a pool that was already shut down
    #[error("worker pool is shut down: not accepting new tasks")]
    PoolClosed,

    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client could not be built
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Base URL could not be parsed
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a configuration key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Failure of a single song lookup
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP request could not be sent or completed
    #[error("request to {url} failed: {source}")]
    Request {
        /// Target URL
        url: String,
        /// Underlying client error
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status {
        /// Target URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The response body could not be read
    #[error("failed to read body from {url}: {source}")]
    Body {
        /// Target URL
        url: String,
        /// Underlying client error
        source: reqwest::Error,
    },

    /// No target URL could be built for the song
    #[error("cannot build URL: {reason}")]
    InvalidUrl {
        /// Why the URL could not be built
        reason: String,
    },

    /// The lookup exceeded the per-task timeout
    #[error("timed out after {after:?}")]
    Timeout {
        /// The timeout that expired
        after: Duration,
    },

    /// The run was cancelled before this lookup completed
    #[error("cancelled before completion")]
    Cancelled,

    /// The fetcher panicked while handling this song
    #[error("fetcher panicked: {reason}")]
    Panicked {
        /// Panic payload, if it was a string
        reason: String,
    },

    /// Any other fetcher-specific failure
    #[error("{0}")]
    Other(String),
}
