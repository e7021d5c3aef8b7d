//! Telemetry error types and failure classification.
//!
//! Classification drives retry behavior: only `Transient` failures are
//! re-attempted. Unclassified errors are treated as non-retryable so an
//! unknown failure mode can never produce a retry loop.

use thiserror::Error;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors that can occur while recording or dispatching interactions.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A structurally required field is missing. Never sent, never retried.
    #[error("invalid record: {0}")]
    Validation(String),

    /// Network/timeout-class failure; eligible for bounded retry.
    #[error("transient sink failure: {0}")]
    Transient(String),

    /// The store rejected the record (constraint, auth). Not retried.
    #[error("sink rejected record (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TelemetryError {
    /// Whether the failure is worth re-attempting.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Classifies a transport-level failure. Timeouts and connection
    /// errors are transient; anything else stays unclassified.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::Transient(err.to_string())
        } else {
            Self::Http(err)
        }
    }

    /// Classifies a non-success HTTP status. 408/429 and the 5xx range are
    /// transient; the remaining 4xx range is a rejection.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            408 | 429 => Self::Transient(format!("HTTP {status}: {message}")),
            s if s >= 500 => Self::Transient(format!("HTTP {s}: {message}")),
            s => Self::Rejected { status: s, message },
        }
    }
}
