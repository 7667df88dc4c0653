//! Shared path generation for storage backends.
//!
//! Path format: `{photos|videos}/{uuid}.{ext}` for direct shares and `{author_id}/{uuid}.{ext}`
//! for stories. Both live under their own bucket.

use morsel_core::constants::PUBLIC_OBJECT_PATH;
use morsel_core::{MediaKind, UserId};
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

/// Fresh path for a direct-share upload.
pub fn share_path(kind: MediaKind) -> String {
    format!(
        "{}/{}.{}",
        kind.share_category(),
        Uuid::new_v4(),
        kind.extension()
    )
}

/// Fresh path for a story upload in the author's namespace.
pub fn story_path(author_id: UserId, kind: MediaKind) -> String {
    format!("{}/{}.{}", author_id, Uuid::new_v4(), kind.extension())
}

/// Reject bucket/path pairs that could escape their namespace.
pub fn validate_key(bucket: &str, path: &str) -> StorageResult<()> {
    if bucket.is_empty() || bucket.contains('/') || bucket.contains("..") {
        return Err(StorageError::InvalidKey(format!("invalid bucket: {}", bucket)));
    }
    if path.is_empty() || path.contains("..") || path.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Recover a story's storage path from its public URL.
///
/// Story URLs end in `{author_id}/{filename}`; those two trailing segments are the path inside
/// the bucket. Query strings and fragments are ignored. Returns `None` when the URL has fewer
/// than two segments.
pub fn path_from_url(url: &str) -> Option<String> {
    let without_suffix = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let without_scheme = match without_suffix.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or_default(),
        None => without_suffix,
    };

    let segments: Vec<&str> = without_scheme.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return None;
    }
    let tail = &segments[segments.len() - 2..];
    Some(format!("{}/{}", tail[0], tail[1]))
}

/// Statically constructed public URL following the store's object URL pattern.
pub fn fallback_public_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        PUBLIC_OBJECT_PATH,
        bucket,
        path.trim_start_matches('/')
    )
}
