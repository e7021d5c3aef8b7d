//! Privacy gate — field-level redaction before anything is queued.
//!
//! Pure functions over the current settings; no side effects. The
//! tracking-disabled case never reaches this module: the tracker drops the
//! interaction before a record is even constructed.

use promptline_types::{InteractionRecord, PrivacySettings, REDACTED_PROMPT, ResponseUsage};

/// Redacts a record per the current settings.
///
/// Redaction is independent per category: prompt text, token counts, and
/// metadata are each gated by their own toggle. `prompt_id` and
/// `session_id` are structural identifiers — the update-by-id mechanism
/// needs them — and are never redacted.
pub fn apply_privacy_filter(
    settings: &PrivacySettings,
    mut record: InteractionRecord,
) -> InteractionRecord {
    if !settings.track_prompts {
        record.prompt_text = REDACTED_PROMPT.to_string();
    }
    if !settings.track_tokens {
        record.input_token_count = None;
        record.output_token_count = None;
        record.total_token_count = None;
        record.cached_token_count = None;
        record.thoughts_token_count = None;
        record.tool_token_count = None;
    }
    if !settings.track_metadata {
        record.metadata = None;
    }
    record
}

/// Applies the same category gates to a late response patch, so an update
/// cannot reintroduce fields the gate already stripped from the queued
/// record.
pub fn filter_response_usage(settings: &PrivacySettings, usage: &ResponseUsage) -> ResponseUsage {
    let mut filtered = usage.clone();
    if !settings.track_tokens {
        filtered.input_token_count = None;
        filtered.output_token_count = None;
        filtered.total_token_count = None;
        filtered.cached_token_count = None;
        filtered.thoughts_token_count = None;
        filtered.tool_token_count = None;
    }
    if !settings.track_metadata {
        filtered.metadata = None;
    }
    filtered
}
