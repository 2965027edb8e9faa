// ============================================================================
// Message Pipeline Tests
// ============================================================================
//
// Create path, fan-out, moderation round-trip and read path against
// in-memory collaborators.
//
// ============================================================================

use bytes::Bytes;
use groupchat_server::config::AttachmentFailurePolicy;
use groupchat_server::kafka::types::ModerationVerdict;
use groupchat_server::message::{CreateMessage, MessageStatus, RawAttachment, Transition};
use groupchat_server::pipeline::{PipelineError, PipelineSettings};
use groupchat_server::utils::is_valid_object_name;
use groupchat_server::realtime::RealtimeEvent;
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::time::Duration;

use test_utils::{hours_ago, Harness};

fn text_message(user_id: i64, group_id: i64, content: &str) -> CreateMessage {
    CreateMessage {
        user_id,
        group_id,
        content: content.to_string(),
        attachments: vec![],
    }
}

fn file(name: &str, content_type: &str, data: &'static [u8]) -> RawAttachment {
    RawAttachment {
        filename: name.to_string(),
        content_type: content_type.to_string(),
        data: Bytes::from_static(data),
    }
}

fn verdict(id: i64, group_id: i64, is_hate_speech: bool) -> ModerationVerdict {
    ModerationVerdict {
        id,
        group_id,
        is_hate_speech,
    }
}

// ----------------------------------------------------------------------------
// Create
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_create_persists_pending_message_and_broadcasts_once() {
    let h = Harness::new();

    let message = h.pipeline.create(text_message(1, 7, "hello")).await.unwrap();
    h.pipeline.wait_for_background().await;

    assert!(message.id > 0);
    assert_eq!(message.status, MessageStatus::Pending);
    assert_eq!(message.content, "hello");
    assert_eq!(h.store.get(message.id).unwrap().status, MessageStatus::Pending);

    let broadcasts = h.broadcaster.new_messages();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(broadcasts[0].0, 7);
    assert_eq!(broadcasts[0].1, message);
}

#[tokio::test]
async fn test_create_sends_one_moderation_request() {
    let h = Harness::new();

    let message = h.pipeline.create(text_message(1, 7, "hello")).await.unwrap();
    h.pipeline.wait_for_background().await;

    let requests = h.moderation.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].id, message.id);
    assert_eq!(requests[0].group_id, 7);
    assert_eq!(requests[0].content, "hello");
}

#[tokio::test]
async fn test_fan_out_skips_sender() {
    let h = Harness::new();
    h.directory.set_members(7, &[1, 2, 3]);

    h.pipeline.create(text_message(1, 7, "hello")).await.unwrap();
    h.pipeline.wait_for_background().await;

    assert_eq!(h.notifier.recipients(), vec![2, 3]);
    for notification in h.notifier.sent() {
        assert_eq!(notification.from_user_id, 1);
        assert_eq!(notification.room_id, 7);
        assert_eq!(notification.content, "hello");
    }
}

#[tokio::test]
async fn test_fan_out_continues_after_failed_send() {
    let h = Harness::new();
    h.directory.set_members(7, &[1, 2, 3, 4]);
    h.notifier.fail_for(3);

    h.pipeline.create(text_message(1, 7, "hello")).await.unwrap();
    h.pipeline.wait_for_background().await;

    assert_eq!(h.notifier.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(h.notifier.recipients(), vec![2, 4]);
}

#[tokio::test]
async fn test_roster_failure_does_not_fail_create() {
    let h = Harness::new();
    h.directory.fail.store(true, Ordering::SeqCst);

    let message = h.pipeline.create(text_message(1, 7, "hello")).await.unwrap();
    h.pipeline.wait_for_background().await;

    assert!(h.notifier.sent().is_empty());
    // moderation runs independently of the fan-out
    assert_eq!(h.moderation.requests()[0].id, message.id);
}

#[tokio::test]
async fn test_moderation_send_failure_leaves_message_pending() {
    let h = Harness::new();
    h.moderation.fail.store(true, Ordering::SeqCst);

    let message = h.pipeline.create(text_message(1, 7, "hello")).await.unwrap();
    h.pipeline.wait_for_background().await;

    assert_eq!(h.moderation.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.get(message.id).unwrap().status, MessageStatus::Pending);
}

#[tokio::test]
async fn test_broadcast_failure_does_not_fail_create() {
    let h = Harness::new();
    h.broadcaster.fail.store(true, Ordering::SeqCst);

    let result = h.pipeline.create(text_message(1, 7, "hello")).await;
    h.pipeline.wait_for_background().await;

    assert!(result.is_ok());
    assert_eq!(h.moderation.requests().len(), 1);
}

#[tokio::test]
async fn test_empty_message_rejected_without_side_effects() {
    let h = Harness::new();
    h.directory.set_members(7, &[1, 2]);

    for content in ["", "   ", "\n\t"] {
        let err = h
            .pipeline
            .create(text_message(1, 7, content))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }
    h.pipeline.wait_for_background().await;

    assert_eq!(h.store.create_calls.load(Ordering::SeqCst), 0);
    assert!(h.broadcaster.events().is_empty());
    assert!(h.moderation.requests().is_empty());
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_invalid_ids_rejected() {
    let h = Harness::new();

    let err = h.pipeline.create(text_message(0, 7, "hi")).await.unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
    let err = h.pipeline.create(text_message(1, -7, "hi")).await.unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));

    assert_eq!(h.store.create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_attachment_only_message_is_accepted() {
    let h = Harness::new();

    let message = h
        .pipeline
        .create(CreateMessage {
            user_id: 1,
            group_id: 7,
            content: "  ".to_string(),
            attachments: vec![file("cat.png", "image/png", b"meow")],
        })
        .await
        .unwrap();

    assert_eq!(message.files.len(), 1);
    let attachment = &message.files[0];
    assert_eq!(attachment.original_name, "cat.png");
    assert_eq!(attachment.content_type, "image/png");
    assert_eq!(attachment.size, 4);
    assert!(attachment.object_name.ends_with("-cat.png"));
    assert!(attachment.url.starts_with(&format!("mem://{}", attachment.object_name)));

    let (content_type, data) = h.attachments.object(&attachment.object_name).unwrap();
    assert_eq!(content_type, "image/png");
    assert_eq!(data, Bytes::from_static(b"meow"));
}

#[tokio::test]
async fn test_dotted_filename_is_kept_as_attachment() {
    let h = Harness::new();

    let message = h
        .pipeline
        .create(CreateMessage {
            user_id: 1,
            group_id: 7,
            content: "backup".to_string(),
            attachments: vec![file("archive..tar.gz", "application/gzip", b"gz")],
        })
        .await
        .unwrap();

    assert_eq!(message.files.len(), 1);
    let attachment = &message.files[0];
    assert_eq!(attachment.original_name, "archive..tar.gz");
    assert!(attachment.object_name.ends_with("-archive.tar.gz"));
    assert!(is_valid_object_name(&attachment.object_name));
    assert!(h.attachments.object(&attachment.object_name).is_some());
}

#[tokio::test]
async fn test_attachments_keep_client_order() {
    let h = Harness::new();

    let message = h
        .pipeline
        .create(CreateMessage {
            user_id: 1,
            group_id: 7,
            content: "album".to_string(),
            attachments: vec![
                file("a.png", "image/png", b"a"),
                file("b.png", "image/png", b"bb"),
                file("c.png", "image/png", b"ccc"),
            ],
        })
        .await
        .unwrap();

    let names: Vec<&str> = message
        .files
        .iter()
        .map(|f| f.original_name.as_str())
        .collect();
    assert_eq!(names, vec!["a.png", "b.png", "c.png"]);

    let object_names: HashSet<&str> = message
        .files
        .iter()
        .map(|f| f.object_name.as_str())
        .collect();
    assert_eq!(object_names.len(), 3);
}

#[tokio::test]
async fn test_best_effort_drops_only_failed_attachment() {
    let h = Harness::with_policy(AttachmentFailurePolicy::BestEffort);
    h.attachments.fail_uploads_of("broken.png");

    let message = h
        .pipeline
        .create(CreateMessage {
            user_id: 1,
            group_id: 7,
            content: "two files".to_string(),
            attachments: vec![
                file("ok.png", "image/png", b"ok"),
                file("broken.png", "image/png", b"nope"),
            ],
        })
        .await
        .unwrap();

    assert_eq!(message.files.len(), 1);
    assert_eq!(message.files[0].original_name, "ok.png");
    assert_eq!(h.broadcaster.new_messages().len(), 1);
}

#[tokio::test]
async fn test_best_effort_rejects_when_nothing_is_left() {
    let h = Harness::with_policy(AttachmentFailurePolicy::BestEffort);
    h.attachments.fail_uploads_of("broken.png");

    let err = h
        .pipeline
        .create(CreateMessage {
            user_id: 1,
            group_id: 7,
            content: String::new(),
            attachments: vec![file("broken.png", "image/png", b"nope")],
        })
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::AttachmentUpload { .. }));
    assert_eq!(h.store.create_calls.load(Ordering::SeqCst), 0);
    assert!(h.broadcaster.events().is_empty());
}

#[tokio::test]
async fn test_all_or_nothing_aborts_on_failed_upload() {
    let h = Harness::with_policy(AttachmentFailurePolicy::AllOrNothing);
    h.attachments.fail_uploads_of("broken.png");

    let err = h
        .pipeline
        .create(CreateMessage {
            user_id: 1,
            group_id: 7,
            content: "two files".to_string(),
            attachments: vec![
                file("ok.png", "image/png", b"ok"),
                file("broken.png", "image/png", b"nope"),
            ],
        })
        .await
        .unwrap_err();
    h.pipeline.wait_for_background().await;

    match err {
        PipelineError::AttachmentUpload { filename, .. } => assert_eq!(filename, "broken.png"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(h.store.create_calls.load(Ordering::SeqCst), 0);
    assert!(h.store.messages().is_empty());
    assert!(h.broadcaster.events().is_empty());
    assert!(h.moderation.requests().is_empty());
}

#[tokio::test]
async fn test_persistence_failure_has_no_side_effects() {
    let h = Harness::new();
    h.directory.set_members(7, &[1, 2]);
    h.store.fail_create.store(true, Ordering::SeqCst);

    let err = h.pipeline.create(text_message(1, 7, "hello")).await.unwrap_err();
    h.pipeline.wait_for_background().await;

    assert!(matches!(err, PipelineError::Persistence(_)));
    assert!(h.broadcaster.events().is_empty());
    assert!(h.moderation.requests().is_empty());
    assert!(h.notifier.sent().is_empty());
    assert_eq!(h.pipeline.background_tasks(), 0);
}

// ----------------------------------------------------------------------------
// Verdicts
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_hate_verdict_updates_status_and_broadcasts() {
    let h = Harness::new();
    let message = h.pipeline.create(text_message(1, 7, "bad")).await.unwrap();

    let transition = h.pipeline.apply_verdict(&verdict(message.id, 7, true)).await.unwrap();

    assert_eq!(
        transition,
        Transition::Changed {
            from: MessageStatus::Pending,
            to: MessageStatus::Hate
        }
    );
    assert_eq!(h.store.get(message.id).unwrap().status, MessageStatus::Hate);
    assert_eq!(h.broadcaster.hate_updates(), vec![(7, message.id)]);
}

#[tokio::test]
async fn test_neutral_verdict_is_not_broadcast() {
    let h = Harness::new();
    let message = h.pipeline.create(text_message(1, 7, "nice")).await.unwrap();

    h.pipeline.apply_verdict(&verdict(message.id, 7, false)).await.unwrap();

    assert_eq!(h.store.get(message.id).unwrap().status, MessageStatus::Neutral);
    assert!(h.broadcaster.hate_updates().is_empty());
    // only the newMessage event
    assert_eq!(h.broadcaster.events().len(), 1);
}

#[tokio::test]
async fn test_duplicate_hate_verdict_broadcasts_once() {
    let h = Harness::new();
    let message = h.pipeline.create(text_message(1, 7, "bad")).await.unwrap();

    let first = h.pipeline.apply_verdict(&verdict(message.id, 7, true)).await.unwrap();
    let second = h.pipeline.apply_verdict(&verdict(message.id, 7, true)).await.unwrap();

    assert!(first.entered_hate());
    assert_eq!(second, Transition::Unchanged);
    assert_eq!(h.store.get(message.id).unwrap().status, MessageStatus::Hate);
    assert_eq!(h.broadcaster.hate_updates().len(), 1);
}

#[tokio::test]
async fn test_first_verdict_wins() {
    let h = Harness::new();
    let message = h.pipeline.create(text_message(1, 7, "borderline")).await.unwrap();

    h.pipeline.apply_verdict(&verdict(message.id, 7, false)).await.unwrap();
    let late = h.pipeline.apply_verdict(&verdict(message.id, 7, true)).await.unwrap();

    assert_eq!(late, Transition::Unchanged);
    assert_eq!(h.store.get(message.id).unwrap().status, MessageStatus::Neutral);
    assert!(h.broadcaster.hate_updates().is_empty());
}

#[tokio::test]
async fn test_verdict_for_unknown_message_is_ignored() {
    let h = Harness::new();

    let transition = h.pipeline.apply_verdict(&verdict(999, 7, true)).await.unwrap();

    assert_eq!(transition, Transition::Unchanged);
    assert!(h.broadcaster.events().is_empty());
}

#[tokio::test]
async fn test_verdict_store_failure_is_reported() {
    let h = Harness::new();
    let message = h.pipeline.create(text_message(1, 7, "bad")).await.unwrap();
    h.store.fail_update.store(true, Ordering::SeqCst);

    let err = h
        .pipeline
        .apply_verdict(&verdict(message.id, 7, true))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Persistence(_)));
    assert!(h.broadcaster.hate_updates().is_empty());
}

#[tokio::test]
async fn test_hate_update_goes_to_stored_group() {
    let h = Harness::new();
    let message = h.pipeline.create(text_message(1, 7, "bad")).await.unwrap();

    h.pipeline.apply_verdict(&verdict(message.id, 7, true)).await.unwrap();

    let (group_id, event) = h.broadcaster.events().pop().unwrap();
    assert_eq!(group_id, 7);
    assert_eq!(event, RealtimeEvent::HateUpdate { message_id: message.id });
}

#[tokio::test]
async fn test_hate_update_ignores_mismatched_verdict_group() {
    let h = Harness::new();
    let message = h.pipeline.create(text_message(1, 7, "bad")).await.unwrap();

    let transition = h
        .pipeline
        .apply_verdict(&verdict(message.id, 99, true))
        .await
        .unwrap();

    assert!(transition.entered_hate());
    assert_eq!(h.store.get(message.id).unwrap().status, MessageStatus::Hate);
    assert_eq!(h.broadcaster.hate_updates(), vec![(7, message.id)]);
}

// ----------------------------------------------------------------------------
// Read path and reconciliation
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_list_by_group_is_ordered_and_regenerates_urls() {
    let h = Harness::new();
    let older = h.store.seed(7, 2, "older", hours_ago(2));
    let created = h
        .pipeline
        .create(CreateMessage {
            user_id: 1,
            group_id: 7,
            content: "with file".to_string(),
            attachments: vec![file("doc.pdf", "application/pdf", b"%PDF")],
        })
        .await
        .unwrap();
    h.store.seed(8, 1, "other group", hours_ago(1));

    let urls_before = h.attachments.url_calls.load(Ordering::SeqCst);
    let messages = h.pipeline.list_by_group(7).await.unwrap();

    let ids: Vec<i64> = messages.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![older, created.id]);
    assert_eq!(h.attachments.url_calls.load(Ordering::SeqCst), urls_before + 1);
    assert!(messages[1].files[0]
        .url
        .starts_with(&format!("mem://{}", created.files[0].object_name)));
}

#[tokio::test]
async fn test_each_read_signs_a_fresh_url_for_the_same_object() {
    let h = Harness::new();
    let created = h
        .pipeline
        .create(CreateMessage {
            user_id: 1,
            group_id: 7,
            content: "with file".to_string(),
            attachments: vec![file("doc.pdf", "application/pdf", b"%PDF")],
        })
        .await
        .unwrap();

    let first = h.pipeline.list_by_group(7).await.unwrap();
    let longer = h.pipeline.clone().with_settings(PipelineSettings {
        failure_policy: AttachmentFailurePolicy::BestEffort,
        url_ttl: Duration::from_secs(7200),
        log_message_content: false,
    });
    let second = longer.list_by_group(7).await.unwrap();

    let (a, b) = (&first[0].files[0], &second[0].files[0]);
    assert_eq!(a.object_name, created.files[0].object_name);
    assert_eq!(a.object_name, b.object_name);
    assert_ne!(a.url, b.url);
}

#[tokio::test]
async fn test_list_by_group_rejects_invalid_group() {
    let h = Harness::new();
    assert!(matches!(
        h.pipeline.list_by_group(0).await,
        Err(PipelineError::Validation(_))
    ));
}

#[tokio::test]
async fn test_resend_only_targets_stale_pending_messages() {
    let h = Harness::new();
    let stale = h.store.seed(7, 1, "stale", hours_ago(3));
    let classified = h.store.seed(7, 1, "classified", hours_ago(3));
    h.store.seed(7, 1, "fresh", hours_ago(0));
    h.pipeline
        .apply_verdict(&verdict(classified, 7, false))
        .await
        .unwrap();

    let resent = h.pipeline.resend_stale_pending(hours_ago(1), 10).await.unwrap();

    assert_eq!(resent, 1);
    let requests = h.moderation.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].id, stale);
    assert_eq!(requests[0].content, "stale");
}

#[tokio::test]
async fn test_resend_respects_batch_limit() {
    let h = Harness::new();
    for i in 0..5 {
        h.store.seed(7, 1, &format!("m{}", i), hours_ago(5 - i));
    }

    let resent = h.pipeline.resend_stale_pending(hours_ago(0), 2).await.unwrap();

    assert_eq!(resent, 2);
    let contents: Vec<String> = h.moderation.requests().into_iter().map(|r| r.content).collect();
    assert_eq!(contents, vec!["m0", "m1"]);
}

#[tokio::test]
async fn test_wait_for_background_can_be_called_repeatedly() {
    let h = Harness::new();
    h.directory.set_members(7, &[1, 2]);

    h.pipeline.create(text_message(1, 7, "one")).await.unwrap();
    h.pipeline.wait_for_background().await;
    h.pipeline.create(text_message(1, 7, "two")).await.unwrap();
    h.pipeline.wait_for_background().await;

    assert_eq!(h.moderation.requests().len(), 2);
    assert_eq!(h.notifier.sent().len(), 2);
    assert_eq!(h.pipeline.background_tasks(), 0);
}
