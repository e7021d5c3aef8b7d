//! HTTP client for the hosted usage store.
//!
//! Speaks a PostgREST-style REST dialect against a single `interactions`
//! table: filtered GETs for listing, POST for insert, filtered DELETE for
//! the bulk purge, and a top-1 select as a liveness probe. Uses reqwest
//! with JSON serialization and an api-key + bearer header pair.

use crate::config::TelemetryConfig;
use crate::error::{TelemetryError, TelemetryResult};
use crate::sink::InteractionSink;
use chrono::{DateTime, Utc};
use promptline_types::InteractionRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

const INTERACTIONS_PATH: &str = "/rest/v1/interactions";

/// HTTP client for the Promptline usage store.
pub struct UsageApiClient {
    client: Client,
    config: TelemetryConfig,
}

/// Wire row for the interactions table.
///
/// Absent token counts and duration are coerced to zero at this boundary;
/// the queue itself never mutates records.
#[derive(Serialize)]
struct InteractionRow<'a> {
    client_id: &'a str,
    prompt_id: &'a str,
    session_id: &'a str,
    prompt_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_kind: Option<&'a str>,
    input_token_count: u64,
    output_token_count: u64,
    total_token_count: u64,
    cached_token_count: u64,
    thoughts_token_count: u64,
    tool_token_count: u64,
    response_duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a serde_json::Map<String, serde_json::Value>>,
    created_at: DateTime<Utc>,
}

impl<'a> InteractionRow<'a> {
    fn from_record(client_id: &'a str, record: &'a InteractionRecord) -> Self {
        Self {
            client_id,
            prompt_id: &record.prompt_id,
            session_id: &record.session_id,
            prompt_text: &record.prompt_text,
            model_name: record.model_name.as_deref(),
            auth_kind: record.auth_kind.as_deref(),
            input_token_count: record.input_token_count.unwrap_or(0),
            output_token_count: record.output_token_count.unwrap_or(0),
            total_token_count: record.total_token_count.unwrap_or(0),
            cached_token_count: record.cached_token_count.unwrap_or(0),
            thoughts_token_count: record.thoughts_token_count.unwrap_or(0),
            tool_token_count: record.tool_token_count.unwrap_or(0),
            response_duration_ms: record.response_duration_ms.unwrap_or(0),
            metadata: record.metadata.as_ref(),
            created_at: record.created_at,
        }
    }
}

/// A stored interaction row returned by the list operation.
#[derive(Clone, Debug, Deserialize)]
pub struct StoredInteraction {
    pub client_id: String,
    pub prompt_id: String,
    pub session_id: String,
    pub prompt_text: String,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub auth_kind: Option<String>,
    #[serde(default)]
    pub input_token_count: u64,
    #[serde(default)]
    pub output_token_count: u64,
    #[serde(default)]
    pub total_token_count: u64,
    #[serde(default)]
    pub cached_token_count: u64,
    #[serde(default)]
    pub thoughts_token_count: u64,
    #[serde(default)]
    pub tool_token_count: u64,
    #[serde(default)]
    pub response_duration_ms: u64,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    pub created_at: DateTime<Utc>,
}

impl UsageApiClient {
    pub fn new(config: TelemetryConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .expect("failed to build HTTP client");

        Self { client, config }
    }

    fn table_url(&self) -> String {
        format!("{}{}", self.config.api_base_url, INTERACTIONS_PATH)
    }

    /// Structural validation before anything goes on the wire. A record
    /// failing here is dropped by the caller, never retried.
    fn validate(record: &InteractionRecord) -> TelemetryResult<()> {
        if record.prompt_id.is_empty() {
            return Err(TelemetryError::Validation("missing prompt_id".to_string()));
        }
        if record.session_id.is_empty() {
            return Err(TelemetryError::Validation("missing session_id".to_string()));
        }
        Ok(())
    }

    async fn check_status(resp: reqwest::Response) -> TelemetryResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        Err(TelemetryError::from_status(status.as_u16(), message))
    }

    /// Inserts one interaction record.
    pub async fn insert_interaction(
        &self,
        client_id: &str,
        record: &InteractionRecord,
    ) -> TelemetryResult<()> {
        Self::validate(record)?;

        let row = InteractionRow::from_record(client_id, record);
        let resp = self
            .client
            .post(self.table_url())
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await
            .map_err(TelemetryError::from_transport)?;

        Self::check_status(resp).await?;
        debug!("inserted interaction {}", record.prompt_id);
        Ok(())
    }

    /// Lists stored interactions for an identity, newest first, paged.
    pub async fn list_interactions(
        &self,
        client_id: &str,
        limit: usize,
        offset: usize,
    ) -> TelemetryResult<Vec<StoredInteraction>> {
        let url = format!(
            "{}?client_id=eq.{client_id}&order=created_at.desc&limit={limit}&offset={offset}",
            self.table_url()
        );
        let resp = self
            .client
            .get(url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(TelemetryError::from_transport)?;

        let resp = Self::check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Deletes every stored interaction for an identity.
    pub async fn delete_interactions(&self, client_id: &str) -> TelemetryResult<()> {
        let url = format!("{}?client_id=eq.{client_id}", self.table_url());
        let resp = self
            .client
            .delete(url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header("Prefer", "return=minimal")
            .send()
            .await
            .map_err(TelemetryError::from_transport)?;

        Self::check_status(resp).await?;
        Ok(())
    }

    /// Lightweight liveness probe: fetch at most one row and measure the
    /// round trip.
    pub async fn health_check(&self) -> TelemetryResult<Duration> {
        let started = Instant::now();
        let url = format!("{}?select=prompt_id&limit=1", self.table_url());
        let resp = self
            .client
            .get(url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(TelemetryError::from_transport)?;

        Self::check_status(resp).await?;
        Ok(started.elapsed())
    }
}

impl InteractionSink for UsageApiClient {
    fn send(
        &self,
        client_id: &str,
        record: &InteractionRecord,
    ) -> impl Future<Output = TelemetryResult<()>> + Send {
        self.insert_interaction(client_id, record)
    }
}
