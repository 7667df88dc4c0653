use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::{check_duration, MediaKind, UploadedMedia};
use crate::error::MediaError;
use crate::ids::{ShareId, UserId};

/// A directed, single-recipient delivery of one uploaded asset.
///
/// Rows are created at fan-out time, one per recipient, all pointing at the same `media_url`.
/// Only `is_viewed` and `updated_at` ever change afterwards, and `is_viewed` only goes
/// from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub id: ShareId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub media_url: String,
    pub media_type: MediaKind,
    pub duration_seconds: Option<u32>,
    pub caption: Option<String>,
    pub is_viewed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Share {
    pub fn new(
        sender_id: UserId,
        receiver_id: UserId,
        media: &UploadedMedia,
        caption: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, MediaError> {
        if sender_id == receiver_id {
            return Err(MediaError::Validation(
                "sender and receiver must be different users".to_string(),
            ));
        }
        if media.url.trim().is_empty() {
            return Err(MediaError::Validation("media URL must not be empty".to_string()));
        }
        check_duration(media.kind, media.duration_seconds)?;

        Ok(Self {
            id: ShareId::new(),
            sender_id,
            receiver_id,
            media_url: media.url.clone(),
            media_type: media.kind,
            duration_seconds: media.duration_seconds,
            caption: normalize_caption(caption),
            is_viewed: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Flip the viewed flag. Returns `false` when the share was already viewed.
    pub fn mark_viewed(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_viewed {
            return false;
        }
        self.is_viewed = true;
        self.updated_at = at;
        true
    }
}

/// Blank captions are stored as absent.
pub(crate) fn normalize_caption(caption: Option<String>) -> Option<String> {
    caption
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}
