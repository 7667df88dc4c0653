use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::media::{check_duration, MediaKind, UploadedMedia};
use super::share::normalize_caption;
use crate::error::MediaError;
use crate::ids::{StoryId, UserId};

/// A self-expiring broadcast post owned by one author.
///
/// `expires_at` is fixed at creation. Expiry is never stored as a flag; it is derived from the
/// clock every time it is asked for, so a stale copy can never claim to be active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub author_id: UserId,
    pub media_url: String,
    pub media_type: MediaKind,
    pub duration_seconds: Option<u32>,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Story {
    pub fn new(
        author_id: UserId,
        media: &UploadedMedia,
        caption: Option<String>,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, MediaError> {
        if ttl <= Duration::zero() {
            return Err(MediaError::Validation(
                "story lifetime must be positive".to_string(),
            ));
        }
        if media.url.trim().is_empty() {
            return Err(MediaError::Validation("media URL must not be empty".to_string()));
        }
        check_duration(media.kind, media.duration_seconds)?;

        Ok(Self {
            id: StoryId::new(),
            author_id,
            media_url: media.url.clone(),
            media_type: media.kind,
            duration_seconds: media.duration_seconds,
            caption: normalize_caption(caption),
            created_at,
            expires_at: created_at + ttl,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now)
    }

    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

/// Keep only active stories and order them newest first.
pub fn active_newest_first(
    stories: impl IntoIterator<Item = Story>,
    now: DateTime<Utc>,
) -> Vec<Story> {
    let mut active: Vec<Story> = stories.into_iter().filter(|s| s.is_active(now)).collect();
    active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    active
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story_at(created_at: DateTime<Utc>) -> Story {
        let media = UploadedMedia::new(
            "https://cdn.example.com/stories/u/a.jpg".to_string(),
            MediaKind::Photo,
            None,
        )
        .unwrap();
        Story::new(UserId::new(), &media, None, created_at, Duration::hours(24)).unwrap()
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let story = story_at(now);
        assert!(story.is_active(now));
        assert!(story.is_active(story.expires_at - Duration::seconds(1)));
        assert!(story.is_expired(story.expires_at));
        assert!(!story.is_active(now + Duration::hours(25)));
    }

    #[test]
    fn test_time_remaining_never_negative() {
        let now = Utc::now();
        let story = story_at(now);
        assert_eq!(story.time_remaining(now), Duration::hours(24));
        assert_eq!(story.time_remaining(now + Duration::hours(30)), Duration::zero());
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let media = UploadedMedia::new("p/a.jpg".to_string(), MediaKind::Photo, None).unwrap();
        let result = Story::new(UserId::new(), &media, None, Utc::now(), Duration::zero());
        assert!(matches!(result, Err(MediaError::Validation(_))));
    }

    #[test]
    fn test_active_newest_first() {
        let now = Utc::now();
        let old = story_at(now - Duration::hours(30));
        let older = story_at(now - Duration::hours(2));
        let newest = story_at(now - Duration::minutes(5));
        let sorted = active_newest_first(vec![older.clone(), old, newest.clone()], now);
        assert_eq!(sorted, vec![newest, older]);
    }
}
