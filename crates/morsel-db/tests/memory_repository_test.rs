use chrono::{Duration, TimeZone, Utc};
use morsel_core::{MediaKind, Share, Story, UploadedMedia, UserId};
use morsel_db::{
    DbError, MemoryShareRepository, MemoryStoryRepository, ShareRepository, StoryRepository,
};

fn photo() -> UploadedMedia {
    UploadedMedia::new(
        "https://cdn.test/shared-media/photos/a.jpg".to_string(),
        MediaKind::Photo,
        None,
    )
    .unwrap()
}

#[tokio::test]
async fn test_insert_many_and_list_received_newest_first() {
    let repo = MemoryShareRepository::new();
    let sender = UserId::new();
    let receiver = UserId::new();
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

    let older = Share::new(sender, receiver, &photo(), None, t0).unwrap();
    let newer = Share::new(sender, receiver, &photo(), None, t0 + Duration::minutes(5)).unwrap();
    repo.insert_many(&[older.clone(), newer.clone()]).await.unwrap();

    let received = repo.list_received(receiver).await.unwrap();
    assert_eq!(received.iter().map(|s| s.id).collect::<Vec<_>>(), vec![newer.id, older.id]);
    assert_eq!(repo.list_sent(sender).await.unwrap().len(), 2);
    assert!(repo.list_received(sender).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_insert_writes_nothing() {
    let repo = MemoryShareRepository::new();
    repo.set_fail_writes(true);
    let share = Share::new(UserId::new(), UserId::new(), &photo(), None, Utc::now()).unwrap();

    assert!(matches!(
        repo.insert_many(&[share]).await,
        Err(DbError::Unavailable(_))
    ));
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn test_mark_viewed_unknown_share() {
    let repo = MemoryShareRepository::new();
    let share = Share::new(UserId::new(), UserId::new(), &photo(), None, Utc::now()).unwrap();
    assert!(matches!(
        repo.mark_viewed(share.id, Utc::now()).await,
        Err(DbError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_story_reads_exclude_expired() {
    let repo = MemoryStoryRepository::new();
    let author = UserId::new();
    let other = UserId::new();
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();

    let fresh = Story::new(author, &photo(), None, now, Duration::hours(24)).unwrap();
    let day = Duration::hours(24);
    let stale = Story::new(author, &photo(), None, now - Duration::hours(30), day).unwrap();
    let friend = Story::new(other, &photo(), None, now - Duration::hours(1), day).unwrap();
    for story in [&fresh, &stale, &friend] {
        repo.insert(story).await.unwrap();
    }

    let own = repo.list_active_by_author(author, now).await.unwrap();
    assert_eq!(own.iter().map(|s| s.id).collect::<Vec<_>>(), vec![fresh.id]);

    let both = repo.list_active_by_authors(&[author, other], now).await.unwrap();
    assert_eq!(both.iter().map(|s| s.id).collect::<Vec<_>>(), vec![fresh.id, friend.id]);

    let later = repo
        .list_active_by_authors(&[author, other], now + Duration::hours(25))
        .await
        .unwrap();
    assert!(later.is_empty());
}

#[tokio::test]
async fn test_delete_story() {
    let repo = MemoryStoryRepository::new();
    let story = Story::new(UserId::new(), &photo(), None, Utc::now(), Duration::hours(24)).unwrap();
    repo.insert(&story).await.unwrap();

    repo.delete(story.id).await.unwrap();
    assert!(!repo.contains(story.id).await);
    assert!(matches!(repo.delete(story.id).await, Err(DbError::NotFound(_))));
}
