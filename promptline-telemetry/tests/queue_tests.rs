use promptline_telemetry::queue::InteractionQueue;
use promptline_types::{InteractionRecord, ResponseUsage};

fn record(prompt_id: &str) -> InteractionRecord {
    InteractionRecord::new(prompt_id, "session-1", "hello")
}

#[test]
fn new_queue_is_empty() {
    let queue = InteractionQueue::new();
    assert!(queue.is_empty());
    assert_eq!(queue.pending_count(), 0);
}

#[test]
fn enqueue_preserves_insertion_order() {
    let mut queue = InteractionQueue::new();
    for i in 1..=5 {
        queue.enqueue(record(&format!("p{i}")));
    }
    assert_eq!(queue.pending_count(), 5);

    let ids: Vec<String> = queue
        .take_batch(10)
        .into_iter()
        .map(|p| p.record.prompt_id)
        .collect();
    assert_eq!(ids, vec!["p1", "p2", "p3", "p4", "p5"]);
}

#[test]
fn take_batch_removes_from_the_head_up_to_n() {
    let mut queue = InteractionQueue::new();
    for i in 1..=5 {
        queue.enqueue(record(&format!("p{i}")));
    }

    let first: Vec<String> = queue
        .take_batch(3)
        .into_iter()
        .map(|p| p.record.prompt_id)
        .collect();
    assert_eq!(first, vec!["p1", "p2", "p3"]);
    assert_eq!(queue.pending_count(), 2);

    let rest: Vec<String> = queue
        .take_batch(3)
        .into_iter()
        .map(|p| p.record.prompt_id)
        .collect();
    assert_eq!(rest, vec!["p4", "p5"]);
    assert!(queue.is_empty());
}

#[test]
fn take_batch_on_empty_queue_returns_nothing() {
    let mut queue = InteractionQueue::new();
    assert!(queue.take_batch(10).is_empty());
}

#[test]
fn requeued_record_jumps_ahead_of_newer_ones() {
    let mut queue = InteractionQueue::new();
    queue.enqueue(record("p1"));
    queue.enqueue(record("p2"));

    let mut taken = queue.take_batch(1);
    let mut failed = taken.remove(0);
    failed.attempts = 1;
    queue.requeue_front(failed);

    let batch = queue.take_batch(2);
    assert_eq!(batch[0].record.prompt_id, "p1");
    assert_eq!(batch[0].attempts, 1);
    assert_eq!(batch[1].record.prompt_id, "p2");
    assert_eq!(batch[1].attempts, 0);
}

#[test]
fn apply_update_merges_without_moving_the_record() {
    let mut queue = InteractionQueue::new();
    queue.enqueue(record("p1"));
    queue.enqueue(record("p2"));
    queue.enqueue(record("p3"));

    let updated = queue.apply_update(
        "p2",
        &ResponseUsage {
            output_token_count: Some(42),
            ..Default::default()
        },
    );
    assert!(updated);
    assert_eq!(queue.pending_count(), 3);

    let batch = queue.take_batch(3);
    assert_eq!(batch[1].record.prompt_id, "p2");
    assert_eq!(batch[1].record.output_token_count, Some(42));
    assert_eq!(batch[0].record.output_token_count, None);
}

#[test]
fn apply_update_miss_is_reported_and_changes_nothing() {
    let mut queue = InteractionQueue::new();
    queue.enqueue(record("p1"));

    let updated = queue.apply_update(
        "p9",
        &ResponseUsage {
            output_token_count: Some(42),
            ..Default::default()
        },
    );
    assert!(!updated);
    assert_eq!(queue.pending_count(), 1);
}

#[test]
fn duplicate_ids_are_distinct_entries_and_update_hits_the_first() {
    let mut queue = InteractionQueue::new();
    let mut first = record("p1");
    first.prompt_text = "first".into();
    let mut second = record("p1");
    second.prompt_text = "second".into();
    queue.enqueue(first);
    queue.enqueue(second);
    assert_eq!(queue.pending_count(), 2);

    queue.apply_update(
        "p1",
        &ResponseUsage {
            output_token_count: Some(7),
            ..Default::default()
        },
    );

    let batch = queue.take_batch(2);
    assert_eq!(batch[0].record.prompt_text, "first");
    assert_eq!(batch[0].record.output_token_count, Some(7));
    assert_eq!(batch[1].record.prompt_text, "second");
    assert_eq!(batch[1].record.output_token_count, None);
}
