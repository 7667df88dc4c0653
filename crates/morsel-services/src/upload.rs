//! Encode-then-upload, shared by direct shares and stories.

use crate::errors::upload_error;
use morsel_core::{MediaKind, MediaResult, UploadedMedia};
use morsel_processing::{CapturedMedia, MediaEncoder};
use morsel_storage::AssetStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// An asset that has been uploaded once, with the location it was written to.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    pub media: UploadedMedia,
    pub bucket: String,
    pub path: String,
}

#[derive(Clone)]
pub struct MediaPipeline {
    encoder: Arc<MediaEncoder>,
    store: Arc<dyn AssetStore>,
}

impl MediaPipeline {
    pub fn new(encoder: Arc<MediaEncoder>, store: Arc<dyn AssetStore>) -> Self {
        Self { encoder, store }
    }

    pub fn store(&self) -> &Arc<dyn AssetStore> {
        &self.store
    }

    /// Encode `media`, upload it exactly once to `bucket`, and resolve its public URL.
    ///
    /// `path_for` picks the object path once the final media kind is known.
    pub async fn encode_and_upload(
        &self,
        media: &CapturedMedia,
        bucket: &str,
        path_for: impl FnOnce(MediaKind) -> String,
        cancel: &CancellationToken,
    ) -> MediaResult<UploadedAsset> {
        let asset = self.encoder.encode(media, cancel).await?;
        let kind = asset.kind;
        let duration_seconds = asset.duration_seconds;
        let content_type = asset.content_type.clone();
        let size = asset.len();
        let path = path_for(kind);

        let start = std::time::Instant::now();
        self.store
            .upload(bucket, &path, asset.bytes, &content_type)
            .await
            .map_err(upload_error)?;

        let url = self
            .store
            .public_url(bucket, &path)
            .await
            .map_err(upload_error)?;

        tracing::info!(
            bucket = %bucket,
            path = %path,
            kind = %kind,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Media uploaded"
        );

        Ok(UploadedAsset {
            media: UploadedMedia::new(url, kind, duration_seconds)?,
            bucket: bucket.to_string(),
            path,
        })
    }

    /// Best-effort removal of an asset whose record could not be written.
    pub async fn discard(&self, asset: &UploadedAsset) {
        if let Err(e) = self
            .store
            .remove(&asset.bucket, std::slice::from_ref(&asset.path))
            .await
        {
            tracing::warn!(
                bucket = %asset.bucket,
                path = %asset.path,
                error = %e,
                "Failed to remove orphaned upload"
            );
        }
    }
}
