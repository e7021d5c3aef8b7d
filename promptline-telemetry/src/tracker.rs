//! Interaction tracking orchestrator.
//!
//! The tracker accepts new interactions, applies the privacy gate,
//! enqueues them, and supports update-by-id for late response metadata.
//! A background engine drains the queue in bounded batches on a periodic
//! tick; reaching the batch-size threshold nudges an immediate drain.
//!
//! Every entry point is best-effort: failures are logged and the record is
//! dropped or retried, but nothing propagates to the caller.

use crate::config::TelemetryConfig;
use crate::error::TelemetryError;
use crate::privacy::{apply_privacy_filter, filter_response_usage};
use crate::queue::{InteractionQueue, PendingInteraction};
use crate::sink::InteractionSink;
use futures::future::join_all;
use promptline_consent::ConsentStore;
use promptline_types::{InteractionRecord, QueueStatus, ResponseUsage, SessionContext};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Commands sent to the tracker engine.
#[derive(Debug)]
pub enum TrackerCommand {
    /// Attempt a drain now (batch-size threshold reached).
    Drain,
    /// Stop the engine after one best-effort final flush.
    Stop,
}

/// State shared between the handle and the engine.
///
/// The queue mutex is never held across an await; the `draining` flag is a
/// non-blocking try-lock — drains that lose it skip rather than wait, which
/// is what prevents duplicate dispatch of the same record.
struct TrackerShared<S> {
    queue: Mutex<InteractionQueue>,
    draining: AtomicBool,
    sink: S,
    config: TelemetryConfig,
    consent: Arc<ConsentStore>,
}

/// Handle for recording interactions and querying the queue.
pub struct TrackerHandle<S> {
    shared: Arc<TrackerShared<S>>,
    command_tx: mpsc::Sender<TrackerCommand>,
}

impl<S> Clone for TrackerHandle<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            command_tx: self.command_tx.clone(),
        }
    }
}

/// Background drain loop. Spawn [`TrackerEngine::run`] on the runtime.
pub struct TrackerEngine<S> {
    shared: Arc<TrackerShared<S>>,
    command_rx: mpsc::Receiver<TrackerCommand>,
}

/// Creates a tracker handle and its engine.
///
/// The caller spawns `engine.run()`; the handle is cheap to clone and
/// hand to every subsystem that records usage.
pub fn create_tracker<S: InteractionSink>(
    config: TelemetryConfig,
    consent: Arc<ConsentStore>,
    sink: S,
) -> (TrackerHandle<S>, TrackerEngine<S>) {
    let (command_tx, command_rx) = mpsc::channel(64);

    let shared = Arc::new(TrackerShared {
        queue: Mutex::new(InteractionQueue::new()),
        draining: AtomicBool::new(false),
        sink,
        config,
        consent,
    });

    let handle = TrackerHandle {
        shared: Arc::clone(&shared),
        command_tx,
    };

    let engine = TrackerEngine { shared, command_rx };

    (handle, engine)
}

impl<S: InteractionSink> TrackerHandle<S> {
    /// Records an interaction. Fire-and-forget: when tracking is disabled
    /// this is a complete no-op — no record is constructed and no state
    /// changes.
    pub fn track(&self, record: InteractionRecord) {
        let settings = self.shared.consent.settings();
        if !settings.is_tracking_enabled() {
            return;
        }

        let filtered = apply_privacy_filter(&settings, record);
        let pending_count = {
            let mut queue = self.shared.lock_queue();
            queue.enqueue(filtered);
            queue.pending_count()
        };

        // Threshold trigger fires exactly when the boundary is reached;
        // overflow beyond it waits for the periodic tick.
        if pending_count == self.shared.config.batch_size {
            let _ = self.command_tx.try_send(TrackerCommand::Drain);
        }
    }

    /// Convenience constructor for the prompt-submission path.
    ///
    /// `prompt_length` seeds `input_token_count` as a provisional estimate
    /// until [`Self::update_with_response`] reports true counts.
    pub fn track_prompt(
        &self,
        ctx: &SessionContext,
        prompt_text: &str,
        prompt_id: &str,
        prompt_length: u64,
        auth_kind: Option<&str>,
    ) {
        let mut record = InteractionRecord::new(prompt_id, &ctx.session_id, prompt_text);
        record.model_name = ctx.model_name.clone();
        record.auth_kind = auth_kind
            .map(str::to_string)
            .or_else(|| ctx.auth_kind.clone());
        record.input_token_count = Some(prompt_length);
        self.track(record);
    }

    /// Merges response metadata into the pending record with this id.
    ///
    /// A miss (already dispatched, or never enqueued) is a silent no-op;
    /// that data-loss window is accepted — there is no addressable remote
    /// row to patch once a record has left the queue.
    pub fn update_with_response(&self, prompt_id: &str, usage: &ResponseUsage) {
        let settings = self.shared.consent.settings();
        if !settings.is_tracking_enabled() {
            return;
        }

        let filtered = filter_response_usage(&settings, usage);
        let updated = self.shared.lock_queue().apply_update(prompt_id, &filtered);
        if !updated {
            debug!("no pending interaction {prompt_id} to update");
        }
    }

    /// Read-only snapshot; never suspends.
    pub fn queue_status(&self) -> QueueStatus {
        QueueStatus {
            pending_count: self.shared.lock_queue().pending_count(),
            is_draining: self.shared.draining.load(Ordering::SeqCst),
            is_enabled: self.shared.consent.is_tracking_enabled(),
        }
    }

    /// Drains until the queue is empty and no drain is in flight.
    pub async fn flush(&self) {
        self.shared.flush().await;
    }

    /// Asks the engine to stop after one best-effort final flush.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(TrackerCommand::Stop).await;
    }
}

impl<S: InteractionSink> TrackerShared<S> {
    fn lock_queue(&self) -> MutexGuard<'_, InteractionQueue> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// One drain: take up to `batch_size` records from the head and
    /// dispatch them concurrently. Skips when another drain holds the
    /// guard — the next tick or threshold trigger picks the work up.
    async fn drain(&self, final_attempt: bool) {
        if self
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let batch = self.lock_queue().take_batch(self.config.batch_size);
        if !batch.is_empty() {
            join_all(
                batch
                    .into_iter()
                    .map(|pending| self.dispatch(pending, final_attempt)),
            )
            .await;
        }

        self.draining.store(false, Ordering::SeqCst);
    }

    /// Dispatches one record. On a transient failure with attempts left,
    /// the record's own future backs off and re-enters the queue head;
    /// batch peers are not delayed. All other failures drop the record.
    async fn dispatch(&self, mut pending: PendingInteraction, final_attempt: bool) {
        let client_id = self.consent.settings().client_id;

        match self.sink.send(&client_id, &pending.record).await {
            Ok(()) => {
                debug!("delivered interaction {}", pending.record.prompt_id);
            }
            Err(e) if e.is_retryable() && !final_attempt => {
                pending.attempts += 1;
                if pending.attempts >= self.config.max_send_attempts {
                    warn!(
                        "abandoning interaction {} after {} attempts: {e}",
                        pending.record.prompt_id, pending.attempts
                    );
                } else {
                    let delay =
                        self.config.retry_base_delay() * (1u32 << (pending.attempts - 1));
                    debug!(
                        "transient failure for interaction {}, retrying in {delay:?}: {e}",
                        pending.record.prompt_id
                    );
                    tokio::time::sleep(delay).await;
                    self.lock_queue().requeue_front(pending);
                }
            }
            Err(TelemetryError::Validation(msg)) => {
                debug!(
                    "dropping invalid interaction {}: {msg}",
                    pending.record.prompt_id
                );
            }
            Err(e) => {
                warn!(
                    "dropping undeliverable interaction {}: {e}",
                    pending.record.prompt_id
                );
            }
        }
    }

    /// Loops drain attempts until nothing is pending and no drain is in
    /// flight. Terminates even against a dead sink: the retry cap turns
    /// every record into a delivery or an abandonment.
    async fn flush(&self) {
        loop {
            self.drain(false).await;

            let draining = self.draining.load(Ordering::SeqCst);
            let pending = self.lock_queue().pending_count();
            if !draining && pending == 0 {
                break;
            }

            // Another drain holds the guard, or a retry is backing off.
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }

    /// Shutdown path: drain without scheduling new retries, stopping as
    /// soon as a pass makes no progress.
    async fn final_flush(&self) {
        loop {
            let before = self.lock_queue().pending_count();
            if before == 0 {
                break;
            }
            self.drain(true).await;
            if self.lock_queue().pending_count() >= before {
                break;
            }
        }
    }
}

impl<S: InteractionSink> TrackerEngine<S> {
    /// Runs the drain loop until [`TrackerCommand::Stop`] arrives or every
    /// handle is dropped.
    pub async fn run(mut self) {
        info!("telemetry tracker started");

        let mut flush_interval = tokio::time::interval(self.shared.config.flush_interval());
        // Skip the immediate first tick.
        flush_interval.tick().await;

        loop {
            tokio::select! {
                _ = flush_interval.tick() => {
                    if self.shared.lock_queue().pending_count() > 0 {
                        self.shared.drain(false).await;
                    }
                }
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(TrackerCommand::Drain) => {
                            self.shared.drain(false).await;
                        }
                        Some(TrackerCommand::Stop) => {
                            info!("telemetry tracker stopping");
                            self.shared.final_flush().await;
                            break;
                        }
                        None => {
                            info!("command channel closed, stopping tracker");
                            break;
                        }
                    }
                }
            }
        }

        info!("telemetry tracker stopped");
    }
}
