mod common;

use chrono::Duration;
use common::Harness;
use morsel_core::{MediaError, MediaKind, ShareState};

#[tokio::test]
async fn test_send_to_many_uploads_once_and_writes_one_row_per_recipient() {
    let h = Harness::new();
    let service = h.share_service();

    let shares = service
        .send_to_many(&h.photo(), &[h.friend, h.other], Some("  lunch  ".to_string()))
        .await
        .unwrap();

    assert_eq!(shares.len(), 2);
    assert_eq!(h.store.upload_count(), 1);
    assert_eq!(h.shares.len().await, 2);
    assert!(shares.iter().all(|s| s.media_url == shares[0].media_url));
    assert!(shares.iter().all(|s| s.sender_id == h.me && !s.is_viewed));
    assert!(shares.iter().all(|s| s.caption.as_deref() == Some("lunch")));
    assert!(shares[0].media_url.contains("/shared-media/photos/"));
    assert_eq!(service.state(), ShareState::Success);
}

#[tokio::test]
async fn test_empty_recipients_fail_without_network_calls() {
    let h = Harness::new();
    let service = h.share_service();

    let result = service.send_to_many(&h.photo(), &[], None).await;

    assert!(matches!(result, Err(MediaError::Validation(_))));
    assert_eq!(h.store.call_count(), 0);
    assert_eq!(h.shares.call_count(), 0);
    assert!(matches!(service.state(), ShareState::Error(_)));
}

#[tokio::test]
async fn test_sharing_with_yourself_is_rejected() {
    let h = Harness::new();
    let result = h.share_service().send_to_one(&h.photo(), h.me, None).await;
    assert!(matches!(result, Err(MediaError::Validation(_))));
    assert_eq!(h.store.call_count(), 0);
}

#[tokio::test]
async fn test_insert_failure_sends_nothing() {
    let h = Harness::new();
    h.shares.set_fail_writes(true);
    let service = h.share_service();

    let result = service
        .send_to_many(&h.photo(), &[h.friend, h.other], None)
        .await;

    assert!(matches!(result, Err(MediaError::Persist(_))));
    assert!(h.shares.is_empty().await);
    assert_eq!(h.store.object_count(), 0);
    assert!(matches!(service.state(), ShareState::Error(_)));
}

#[tokio::test]
async fn test_upload_failure_is_upload_error() {
    let h = Harness::new();
    h.store.set_fail_uploads(true);
    let service = h.share_service();

    let result = service.send_to_one(&h.photo(), h.friend, None).await;

    assert!(matches!(result, Err(MediaError::Upload(_))));
    assert_eq!(h.shares.write_count(), 0);
}

#[tokio::test]
async fn test_video_share_carries_truncated_duration() {
    let h = Harness::new();
    let share = h
        .share_service()
        .send_to_one(&h.video(), h.friend, None)
        .await
        .unwrap();

    assert_eq!(share.media_type, MediaKind::Video);
    assert_eq!(share.duration_seconds, Some(12));
    assert!(share.media_url.contains("/shared-media/videos/"));
    assert_eq!(h.scratch_outputs(), 0);
}

#[tokio::test]
async fn test_state_reset_and_observers() {
    let h = Harness::new();
    let service = h.share_service();
    let rx = service.subscribe();

    assert!(!service.reset());
    service.send_to_one(&h.photo(), h.friend, None).await.unwrap();
    assert_eq!(*rx.borrow(), ShareState::Success);

    assert!(service.reset());
    assert_eq!(service.state(), ShareState::Idle);
}

#[tokio::test]
async fn test_load_sent_newest_first() {
    let h = Harness::new();
    let service = h.share_service();

    let first = service.send_to_one(&h.photo(), h.friend, None).await.unwrap();
    h.clock.advance(Duration::minutes(1));
    let second = service.send_to_one(&h.photo(), h.other, None).await.unwrap();

    let sent = service.load_sent(h.me).await.unwrap();
    assert_eq!(
        sent.iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );
}
