// ============================================================================
// Moderation Worker Tests
// ============================================================================
//
// Drives the verdict loop with a scripted source and checks status updates,
// commit behaviour and cancellation.
//
// ============================================================================

use groupchat_server::message::{CreateMessage, MessageStatus, Transition};
use groupchat_server::moderation_worker::{
    process_payload, ModerationWorker, PendingSweeper, ProcessOutcome,
};
use groupchat_server::pipeline::ConsumerError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use test_utils::{hours_ago, Harness, ScriptedVerdictSource};

const POLL_TIMEOUT: Duration = Duration::from_millis(10);

async fn create(h: &Harness, content: &str) -> i64 {
    h.pipeline
        .create(CreateMessage {
            user_id: 1,
            group_id: 7,
            content: content.to_string(),
            attachments: vec![],
        })
        .await
        .unwrap()
        .id
}

/// Run the worker until the script is exhausted, then cancel it
async fn run_to_completion(h: &Harness, source: Arc<ScriptedVerdictSource>) -> u64 {
    let cancel = CancellationToken::new();
    let worker = ModerationWorker::new(source.clone(), h.pipeline.clone(), POLL_TIMEOUT)
        .with_error_backoff(Duration::from_millis(5));
    let handle = tokio::spawn(worker.run(cancel.clone()));

    source.wait_until_drained().await;
    cancel.cancel();
    handle.await.unwrap()
}

#[tokio::test]
async fn test_worker_applies_verdicts_and_commits() {
    let h = Harness::new();
    let hateful = create(&h, "bad").await;
    let fine = create(&h, "nice").await;

    let source = Arc::new(ScriptedVerdictSource::default());
    source.push_verdict(hateful, 7, true);
    source.push_verdict(fine, 7, false);

    let handled = run_to_completion(&h, source.clone()).await;

    assert_eq!(handled, 2);
    assert_eq!(source.commits.load(Ordering::SeqCst), 2);
    assert_eq!(h.store.get(hateful).unwrap().status, MessageStatus::Hate);
    assert_eq!(h.store.get(fine).unwrap().status, MessageStatus::Neutral);
    assert_eq!(h.broadcaster.hate_updates(), vec![(7, hateful)]);
}

#[tokio::test]
async fn test_worker_skips_malformed_payloads() {
    let h = Harness::new();
    let id = create(&h, "bad").await;

    let source = Arc::new(ScriptedVerdictSource::default());
    source.push_payload(b"not json");
    source.push_payload(br#"{"id": 0, "group_id": 7, "is_hate_speech": true}"#);
    source.push_verdict(id, 7, true);

    let handled = run_to_completion(&h, source.clone()).await;

    assert_eq!(handled, 3);
    // malformed payloads are committed past
    assert_eq!(source.commits.load(Ordering::SeqCst), 3);
    assert_eq!(h.store.get(id).unwrap().status, MessageStatus::Hate);
}

#[tokio::test]
async fn test_worker_survives_transport_errors() {
    let h = Harness::new();
    let id = create(&h, "nice").await;

    let source = Arc::new(ScriptedVerdictSource::default());
    source.push_error(ConsumerError::Transport("broker down".to_string()));
    source.push_error(ConsumerError::Timeout);
    source.push_error(ConsumerError::Transport("broker down".to_string()));
    source.push_verdict(id, 7, false);

    let handled = run_to_completion(&h, source.clone()).await;

    assert_eq!(handled, 1);
    assert_eq!(source.commits.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.get(id).unwrap().status, MessageStatus::Neutral);
}

/// Poll `condition` until it holds, failing after a few seconds
async fn eventually(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_worker_retries_failed_update_before_moving_on() {
    let h = Harness::new();
    let first = create(&h, "bad").await;
    let second = create(&h, "nice").await;
    h.store.fail_update.store(true, Ordering::SeqCst);

    let source = Arc::new(ScriptedVerdictSource::default());
    source.push_verdict(first, 7, true);
    source.push_verdict(second, 7, false);

    let cancel = CancellationToken::new();
    let worker = ModerationWorker::new(source.clone(), h.pipeline.clone(), POLL_TIMEOUT)
        .with_error_backoff(Duration::from_millis(5));
    let handle = tokio::spawn(worker.run(cancel.clone()));

    // the failing verdict is retried and nothing behind it is read or committed
    eventually(|| h.store.update_calls.load(Ordering::SeqCst) >= 3).await;
    assert_eq!(source.commits.load(Ordering::SeqCst), 0);
    assert_eq!(h.store.get(second).unwrap().status, MessageStatus::Pending);

    h.store.fail_update.store(false, Ordering::SeqCst);
    source.wait_until_drained().await;
    cancel.cancel();
    let handled = handle.await.unwrap();

    assert_eq!(handled, 2);
    assert_eq!(source.commits.load(Ordering::SeqCst), 2);
    assert_eq!(h.store.get(first).unwrap().status, MessageStatus::Hate);
    assert_eq!(h.store.get(second).unwrap().status, MessageStatus::Neutral);
    assert_eq!(h.broadcaster.hate_updates(), vec![(7, first)]);
}

#[tokio::test]
async fn test_worker_cancelled_during_retry_leaves_verdict_uncommitted() {
    let h = Harness::new();
    let id = create(&h, "bad").await;
    h.store.fail_update.store(true, Ordering::SeqCst);

    let source = Arc::new(ScriptedVerdictSource::default());
    source.push_verdict(id, 7, true);

    let cancel = CancellationToken::new();
    let worker = ModerationWorker::new(source.clone(), h.pipeline.clone(), POLL_TIMEOUT)
        .with_error_backoff(Duration::from_millis(5));
    let handle = tokio::spawn(worker.run(cancel.clone()));

    eventually(|| h.store.update_calls.load(Ordering::SeqCst) >= 2).await;
    cancel.cancel();
    let handled = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("worker did not stop after cancellation")
        .unwrap();

    assert_eq!(handled, 0);
    assert_eq!(source.commits.load(Ordering::SeqCst), 0);
    assert_eq!(h.store.get(id).unwrap().status, MessageStatus::Pending);
}

#[tokio::test]
async fn test_worker_redelivered_verdict_is_idempotent() {
    let h = Harness::new();
    let id = create(&h, "bad").await;

    let source = Arc::new(ScriptedVerdictSource::default());
    source.push_verdict(id, 7, true);
    source.push_verdict(id, 7, true);
    source.push_verdict(id, 7, false);

    run_to_completion(&h, source.clone()).await;

    assert_eq!(source.commits.load(Ordering::SeqCst), 3);
    assert_eq!(h.store.get(id).unwrap().status, MessageStatus::Hate);
    assert_eq!(h.broadcaster.hate_updates().len(), 1);
}

#[tokio::test]
async fn test_worker_stops_on_cancel_while_idle() {
    let h = Harness::new();
    let source = Arc::new(ScriptedVerdictSource::default());
    let cancel = CancellationToken::new();

    // long poll timeout: cancellation must not wait for it
    let worker = ModerationWorker::new(source.clone(), h.pipeline.clone(), Duration::from_secs(60));
    let handle = tokio::spawn(worker.run(cancel.clone()));

    source.wait_until_drained().await;
    cancel.cancel();

    let handled = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("worker did not stop after cancellation")
        .unwrap();
    assert_eq!(handled, 0);
}

#[tokio::test]
async fn test_process_payload_outcomes() {
    let h = Harness::new();
    let id = create(&h, "bad").await;

    let applied = process_payload(
        &h.pipeline,
        format!(r#"{{"id": {}, "group_id": 7, "is_hate_speech": true}}"#, id).as_bytes(),
    )
    .await;
    assert_eq!(
        applied,
        ProcessOutcome::Applied(Transition::Changed {
            from: MessageStatus::Pending,
            to: MessageStatus::Hate,
        })
    );
    assert!(applied.should_commit());

    let repeated = process_payload(
        &h.pipeline,
        format!(r#"{{"id": {}, "group_id": 7, "is_hate_speech": false}}"#, id).as_bytes(),
    )
    .await;
    assert_eq!(repeated, ProcessOutcome::Applied(Transition::Unchanged));

    let malformed = process_payload(&h.pipeline, b"{}").await;
    assert_eq!(malformed, ProcessOutcome::Malformed);
    assert!(malformed.should_commit());
}

// ----------------------------------------------------------------------------
// Pending sweep
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_sweeper_resends_stale_pending_messages() {
    let h = Harness::new();
    let stale = h.store.seed(7, 1, "stuck", hours_ago(2));
    h.store.seed(7, 1, "recent", hours_ago(0));

    let sweeper = PendingSweeper::new(
        h.pipeline.clone(),
        Duration::from_secs(3600),
        Duration::from_secs(60),
        100,
    );

    assert_eq!(sweeper.sweep_once().await, 1);
    let requests = h.moderation.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].id, stale);
}

#[tokio::test]
async fn test_sweeper_skips_classified_messages() {
    let h = Harness::new();
    let id = h.store.seed(7, 1, "stuck", hours_ago(2));

    let source = Arc::new(ScriptedVerdictSource::default());
    source.push_verdict(id, 7, false);
    run_to_completion(&h, source).await;

    let sweeper = PendingSweeper::new(
        h.pipeline.clone(),
        Duration::from_secs(3600),
        Duration::from_secs(60),
        100,
    );
    assert_eq!(sweeper.sweep_once().await, 0);
    assert!(h.moderation.requests().is_empty());
}

#[tokio::test]
async fn test_sweeper_reports_zero_when_broker_is_down() {
    let h = Harness::new();
    h.store.seed(7, 1, "stuck", hours_ago(2));
    h.moderation.fail.store(true, Ordering::SeqCst);

    let sweeper = PendingSweeper::new(
        h.pipeline.clone(),
        Duration::from_secs(3600),
        Duration::from_secs(60),
        100,
    );

    assert_eq!(sweeper.sweep_once().await, 0);
    assert_eq!(h.moderation.attempts.load(Ordering::SeqCst), 1);
}
