//! Usage-telemetry pipeline for the Promptline CLI.
//!
//! Opt-in interaction tracking with:
//! - A privacy gate that redacts fields before anything leaves the process
//! - An in-memory queue drained in bounded batches (timer or threshold)
//! - A remote usage store client with failure classification
//! - Bounded per-record retry with exponential backoff
//! - Update-in-place for late-arriving response metadata
//!
//! Every entry point is best-effort and non-propagating: telemetry can log
//! and degrade, but it never fails or blocks the host CLI.

pub mod api_client;
pub mod config;
pub mod error;
pub mod privacy;
pub mod queue;
pub mod sink;
pub mod tracker;

pub use api_client::{StoredInteraction, UsageApiClient};
pub use config::TelemetryConfig;
pub use error::{TelemetryError, TelemetryResult};
pub use sink::InteractionSink;
pub use tracker::{TrackerEngine, TrackerHandle, create_tracker};
