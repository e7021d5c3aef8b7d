//! Telemetry pipeline configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the tracking pipeline and the usage-store client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Base URL of the hosted usage store (e.g., "https://usage.promptline.dev").
    pub api_base_url: String,

    /// API key sent with every request.
    pub api_key: String,

    /// Records taken from the queue head per drain; reaching this pending
    /// count also triggers an immediate drain.
    pub batch_size: usize,

    /// Periodic drain interval in milliseconds.
    pub flush_interval_ms: u64,

    /// Total send attempts per record before it is abandoned.
    pub max_send_attempts: u32,

    /// Base delay for exponential retry backoff, in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://usage.promptline.dev".to_string(),
            api_key: String::new(),
            batch_size: 10,
            flush_interval_ms: 5000,
            max_send_attempts: 3,
            retry_base_delay_ms: 1000,
            request_timeout_secs: 10,
        }
    }
}

impl TelemetryConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
