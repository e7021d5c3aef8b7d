#![allow(dead_code)]

use promptline_consent::ConsentStore;
use promptline_telemetry::{InteractionSink, TelemetryConfig, TelemetryError, TelemetryResult};
use promptline_types::InteractionRecord;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// In-memory sink with per-prompt scripted failures, consumed in order.
/// Unscripted sends succeed and are recorded.
#[derive(Clone, Default)]
pub struct ScriptedSink {
    state: Arc<Mutex<SinkState>>,
}

#[derive(Default)]
struct SinkState {
    delivered: Vec<InteractionRecord>,
    scripted: HashMap<String, VecDeque<TelemetryError>>,
    calls: usize,
}

impl ScriptedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the next `times` sends for `prompt_id` to fail transiently.
    pub fn fail_transient(&self, prompt_id: &str, times: usize) {
        let mut state = self.state.lock().unwrap();
        let queue = state.scripted.entry(prompt_id.to_string()).or_default();
        for _ in 0..times {
            queue.push_back(TelemetryError::Transient("connection reset".into()));
        }
    }

    /// Scripts the next send for `prompt_id` to be rejected by the store.
    pub fn fail_rejected(&self, prompt_id: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .scripted
            .entry(prompt_id.to_string())
            .or_default()
            .push_back(TelemetryError::Rejected {
                status: 409,
                message: "duplicate prompt_id".into(),
            });
    }

    /// Scripts the next send for `prompt_id` to fail validation.
    pub fn fail_validation(&self, prompt_id: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .scripted
            .entry(prompt_id.to_string())
            .or_default()
            .push_back(TelemetryError::Validation("missing session_id".into()));
    }

    pub fn delivered(&self) -> Vec<InteractionRecord> {
        self.state.lock().unwrap().delivered.clone()
    }

    pub fn delivered_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .delivered
            .iter()
            .map(|r| r.prompt_id.clone())
            .collect()
    }

    /// Total send calls, including failed ones.
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

impl InteractionSink for ScriptedSink {
    fn send(
        &self,
        _client_id: &str,
        record: &InteractionRecord,
    ) -> impl Future<Output = TelemetryResult<()>> + Send {
        let state = Arc::clone(&self.state);
        let record = record.clone();
        async move {
            let mut state = state.lock().unwrap();
            state.calls += 1;
            if let Some(queue) = state.scripted.get_mut(&record.prompt_id) {
                if let Some(err) = queue.pop_front() {
                    return Err(err);
                }
            }
            state.delivered.push(record);
            Ok(())
        }
    }
}

/// Consent store with the user opted in.
pub fn consent_enabled(dir: &TempDir) -> Arc<ConsentStore> {
    let store = ConsentStore::open(dir.path().join("privacy.json")).unwrap();
    store.set_consent(true).unwrap();
    Arc::new(store)
}

/// Consent store left at its opt-out default.
pub fn consent_disabled(dir: &TempDir) -> Arc<ConsentStore> {
    Arc::new(ConsentStore::open(dir.path().join("privacy.json")).unwrap())
}

pub fn test_config() -> TelemetryConfig {
    TelemetryConfig {
        api_base_url: "http://localhost:0".into(),
        api_key: "test-key".into(),
        batch_size: 10,
        flush_interval_ms: 5000,
        max_send_attempts: 3,
        retry_base_delay_ms: 1000,
        request_timeout_secs: 1,
    }
}

pub fn record(prompt_id: &str) -> InteractionRecord {
    InteractionRecord::new(prompt_id, "session-1", "hello world")
}
