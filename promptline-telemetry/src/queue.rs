//! Pending-interaction queue.
//!
//! FIFO for dispatch, except that retried records re-enter at the head so
//! they are re-attempted before newer ones — a deliberate priority
//! inversion favoring eventual delivery over strict fairness.
//!
//! Update-by-id is a linear scan; fine at the documented batch sizes
//! (tens of pending records at most).

use promptline_types::{InteractionRecord, ResponseUsage};
use std::collections::VecDeque;

/// A queued record plus its delivery attempt count.
#[derive(Clone, Debug)]
pub struct PendingInteraction {
    pub record: InteractionRecord,
    /// Completed send attempts.
    pub attempts: u32,
}

/// Ordered buffer of records awaiting dispatch.
#[derive(Debug, Default)]
pub struct InteractionQueue {
    pending: VecDeque<PendingInteraction>,
}

impl InteractionQueue {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    /// Appends a fresh record at the tail.
    pub fn enqueue(&mut self, record: InteractionRecord) {
        self.pending.push_back(PendingInteraction {
            record,
            attempts: 0,
        });
    }

    /// Puts a previously-taken record back at the head for re-attempt.
    pub fn requeue_front(&mut self, pending: PendingInteraction) {
        self.pending.push_front(pending);
    }

    /// Removes and returns up to `n` records from the head.
    pub fn take_batch(&mut self, n: usize) -> Vec<PendingInteraction> {
        let take = n.min(self.pending.len());
        self.pending.drain(..take).collect()
    }

    /// Merges a response patch into the first pending record with a
    /// matching id, leaving its queue position unchanged. Returns false on
    /// a miss (already dispatched, or never enqueued).
    pub fn apply_update(&mut self, prompt_id: &str, usage: &ResponseUsage) -> bool {
        match self
            .pending
            .iter_mut()
            .find(|p| p.record.prompt_id == prompt_id)
        {
            Some(pending) => {
                pending.record.apply_response(usage);
                true
            }
            None => false,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
