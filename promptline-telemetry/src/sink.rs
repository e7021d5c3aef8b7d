//! Sink seam between the batch processor and the remote store.
//!
//! The tracker is generic over this trait; tests substitute a scripted
//! in-memory sink, production wires in [`crate::api_client::UsageApiClient`].

use crate::error::TelemetryResult;
use promptline_types::InteractionRecord;
use std::future::Future;

/// One-way write interface to the remote usage store.
pub trait InteractionSink: Send + Sync + 'static {
    /// Sends a single record. Failures carry a classification
    /// ([`crate::error::TelemetryError::is_retryable`]) that decides
    /// whether the caller re-attempts.
    fn send(
        &self,
        client_id: &str,
        record: &InteractionRecord,
    ) -> impl Future<Output = TelemetryResult<()>> + Send;
}
