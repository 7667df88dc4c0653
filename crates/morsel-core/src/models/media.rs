use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::MediaError;

/// Kind of media carried by a share or story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Canonical content type of the delivered payload.
    pub fn content_type(self) -> &'static str {
        match self {
            MediaKind::Photo => "image/jpeg",
            MediaKind::Video => "video/mp4",
        }
    }

    /// File extension used in storage paths.
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Photo => "jpg",
            MediaKind::Video => "mp4",
        }
    }

    /// Top-level category folder for direct-share uploads.
    pub fn share_category(self) -> &'static str {
        match self {
            MediaKind::Photo => "photos",
            MediaKind::Video => "videos",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaKind::Photo => write!(f, "photo"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "photo" => Ok(MediaKind::Photo),
            "video" => Ok(MediaKind::Video),
            other => Err(MediaError::Validation(format!("unknown media type: {}", other))),
        }
    }
}

/// Encoded payload ready for upload.
///
/// Owned by the encoding pipeline until it has been uploaded; afterwards only the remote URL
/// is kept.
#[derive(Clone)]
pub struct EncodedAsset {
    pub bytes: Vec<u8>,
    pub kind: MediaKind,
    pub content_type: String,
    pub duration_seconds: Option<u32>,
}

impl EncodedAsset {
    pub fn photo(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            kind: MediaKind::Photo,
            content_type: MediaKind::Photo.content_type().to_string(),
            duration_seconds: None,
        }
    }

    pub fn video(bytes: Vec<u8>, duration_seconds: u32) -> Self {
        Self {
            bytes,
            kind: MediaKind::Video,
            content_type: MediaKind::Video.content_type().to_string(),
            duration_seconds: Some(duration_seconds),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for EncodedAsset {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("EncodedAsset")
            .field("kind", &self.kind)
            .field("content_type", &self.content_type)
            .field("size_bytes", &self.bytes.len())
            .field("duration_seconds", &self.duration_seconds)
            .finish()
    }
}

/// A payload that has been uploaded exactly once and is now referenced by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedMedia {
    pub url: String,
    pub kind: MediaKind,
    pub duration_seconds: Option<u32>,
}

impl UploadedMedia {
    pub fn new(
        url: String,
        kind: MediaKind,
        duration_seconds: Option<u32>,
    ) -> Result<Self, MediaError> {
        if url.trim().is_empty() {
            return Err(MediaError::Validation("media URL must not be empty".to_string()));
        }
        check_duration(kind, duration_seconds)?;
        Ok(Self {
            url,
            kind,
            duration_seconds,
        })
    }
}

/// Check that `duration_seconds` agrees with `kind`: absent for photos, present for videos.
pub(crate) fn check_duration(
    kind: MediaKind,
    duration_seconds: Option<u32>,
) -> Result<(), MediaError> {
    match (kind, duration_seconds) {
        (MediaKind::Photo, None) | (MediaKind::Video, Some(_)) => Ok(()),
        (MediaKind::Photo, Some(_)) => Err(MediaError::Validation(
            "photos must not carry a duration".to_string(),
        )),
        (MediaKind::Video, None) => Err(MediaError::Validation(
            "videos must carry a duration".to_string(),
        )),
    }
}
