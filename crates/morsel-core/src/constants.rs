//! Shared constants for buckets, defaults and storage layout.

/// Default bucket namespace for direct shares.
pub const SHARED_MEDIA_BUCKET: &str = "shared-media";

/// Default bucket namespace for stories.
pub const STORIES_BUCKET: &str = "stories";

/// Default story lifetime.
pub const DEFAULT_STORY_TTL_HOURS: i64 = 24;

/// Fixed JPEG quality factor for captured photos.
pub const DEFAULT_PHOTO_JPEG_QUALITY: u8 = 80;

/// Path segment of the store's public object URL pattern.
pub const PUBLIC_OBJECT_PATH: &str = "storage/v1/object/public";
