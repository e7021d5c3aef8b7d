//! Shared types for the Promptline usage-telemetry pipeline.
//!
//! This crate holds the vocabulary shared between the consent store and the
//! tracking pipeline: the interaction record, the response patch applied to
//! pending records, the persisted privacy settings, and the read-only queue
//! snapshot surfaced to CLI status commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentinel stored in place of a redacted prompt.
///
/// Deliberately not the empty string so downstream display can tell
/// "redacted by the user" apart from "no prompt".
pub const REDACTED_PROMPT: &str = "[prompt redacted]";

/// One prompt/response interaction pending upload.
///
/// Mutable while queued (late response metadata is merged in via
/// [`ResponseUsage`]); immutable once handed to the sink.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Caller-supplied unique key; the only field used for lookup.
    pub prompt_id: String,
    pub session_id: String,
    pub prompt_text: String,
    pub model_name: Option<String>,
    pub auth_kind: Option<String>,
    pub input_token_count: Option<u64>,
    pub output_token_count: Option<u64>,
    pub total_token_count: Option<u64>,
    pub cached_token_count: Option<u64>,
    pub thoughts_token_count: Option<u64>,
    pub tool_token_count: Option<u64>,
    pub response_duration_ms: Option<u64>,
    /// Free-form extras. Merged key-wise on update, never replaced wholesale.
    pub metadata: Option<Map<String, Value>>,
    /// Stamped at construction; the remote store lists by this, descending.
    pub created_at: DateTime<Utc>,
}

impl InteractionRecord {
    pub fn new(prompt_id: &str, session_id: &str, prompt_text: &str) -> Self {
        Self {
            prompt_id: prompt_id.to_string(),
            session_id: session_id.to_string(),
            prompt_text: prompt_text.to_string(),
            model_name: None,
            auth_kind: None,
            input_token_count: None,
            output_token_count: None,
            total_token_count: None,
            cached_token_count: None,
            thoughts_token_count: None,
            tool_token_count: None,
            response_duration_ms: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    /// Merges late-arriving response metadata into this record.
    ///
    /// Scalar fields overwrite when present in the patch; `metadata` is a
    /// key-wise shallow merge.
    pub fn apply_response(&mut self, usage: &ResponseUsage) {
        if let Some(model) = &usage.model_name {
            self.model_name = Some(model.clone());
        }
        if let Some(v) = usage.input_token_count {
            self.input_token_count = Some(v);
        }
        if let Some(v) = usage.output_token_count {
            self.output_token_count = Some(v);
        }
        if let Some(v) = usage.total_token_count {
            self.total_token_count = Some(v);
        }
        if let Some(v) = usage.cached_token_count {
            self.cached_token_count = Some(v);
        }
        if let Some(v) = usage.thoughts_token_count {
            self.thoughts_token_count = Some(v);
        }
        if let Some(v) = usage.tool_token_count {
            self.tool_token_count = Some(v);
        }
        if let Some(v) = usage.response_duration_ms {
            self.response_duration_ms = Some(v);
        }
        if let Some(extra) = &usage.metadata {
            let target = self.metadata.get_or_insert_with(Map::new);
            for (key, value) in extra {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Partial update attached to an already-queued record once the model
/// response arrives with true token counts.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResponseUsage {
    pub model_name: Option<String>,
    pub input_token_count: Option<u64>,
    pub output_token_count: Option<u64>,
    pub total_token_count: Option<u64>,
    pub cached_token_count: Option<u64>,
    pub thoughts_token_count: Option<u64>,
    pub tool_token_count: Option<u64>,
    pub response_duration_ms: Option<u64>,
    pub metadata: Option<Map<String, Value>>,
}

/// Session-scoped context the `track_prompt` convenience path consumes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub model_name: Option<String>,
    pub auth_kind: Option<String>,
}

impl SessionContext {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            model_name: None,
            auth_kind: None,
        }
    }
}

/// Persisted privacy settings.
///
/// Loaded once at process start, mutated only through the consent store,
/// rewritten in full after every mutation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    /// Anonymous v4 UUID minted when the settings file is first created.
    /// This is the remote identity for insert/list/delete.
    pub client_id: String,
    /// Whether this build ships with a usage sink configured at all.
    pub remote_tracking_enabled: bool,
    /// Explicit user opt-in. Tracking requires both flags.
    pub consent_given: bool,
    pub track_prompts: bool,
    pub track_tokens: bool,
    pub track_metadata: bool,
    pub data_retention_days: u32,
}

impl PrivacySettings {
    /// Tracking happens only when the sink is configured AND the user
    /// opted in.
    pub fn is_tracking_enabled(&self) -> bool {
        self.remote_tracking_enabled && self.consent_given
    }
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            client_id: uuid::Uuid::new_v4().to_string(),
            remote_tracking_enabled: true,
            consent_given: false,
            track_prompts: true,
            track_tokens: true,
            track_metadata: true,
            data_retention_days: 30,
        }
    }
}

/// Read-only tracker snapshot for CLI status commands. Obtaining one never
/// suspends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub pending_count: usize,
    pub is_draining: bool,
    pub is_enabled: bool,
}
