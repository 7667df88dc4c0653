//! MediaEncoder - converts captured media into upload-ready assets

use crate::capture::CapturedMedia;
use crate::photo;
use crate::video::{DurationProbe, TranscodingService};
use image::DynamicImage;
use morsel_core::{EncodedAsset, MediaError, MediaResult};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct MediaEncoder {
    jpeg_quality: u8,
    transcoder: TranscodingService,
    probe: Arc<dyn DurationProbe>,
}

impl MediaEncoder {
    pub fn new(
        jpeg_quality: u8,
        transcoder: TranscodingService,
        probe: Arc<dyn DurationProbe>,
    ) -> Self {
        Self {
            jpeg_quality,
            transcoder,
            probe,
        }
    }

    /// Encode a decoded still image as JPEG on the blocking pool.
    pub async fn encode_photo(&self, image: DynamicImage) -> MediaResult<EncodedAsset> {
        let quality = self.jpeg_quality;
        run_blocking(move || jpeg_asset(&image, quality)).await
    }

    /// Decode a still image in any supported format, then encode it as JPEG.
    pub async fn encode_photo_bytes(&self, data: Vec<u8>) -> MediaResult<EncodedAsset> {
        let quality = self.jpeg_quality;
        run_blocking(move || {
            let image = photo::decode(&data)
                .map_err(|e| MediaError::Encoding(format!("Failed to decode photo: {}", e)))?;
            jpeg_asset(&image, quality)
        })
        .await
    }

    /// Transcode `source` and load the delivered file.
    ///
    /// The duration is read from the transcoded output and truncated to whole seconds. The
    /// scratch output is deleted before this returns, whatever the outcome.
    pub async fn prepare_video(
        &self,
        source: &Path,
        cancel: &CancellationToken,
    ) -> MediaResult<(EncodedAsset, u32)> {
        let transcoded = self.transcoder.convert(source, cancel).await?;

        let seconds = self
            .probe
            .duration_seconds(transcoded.path())
            .await
            .map_err(|e| MediaError::Encoding(format!("Failed to read video duration: {}", e)))?;
        let duration_seconds = truncate_seconds(seconds);

        let bytes = transcoded
            .read_bytes()
            .await
            .map_err(|e| MediaError::Encoding(format!("Failed to read transcoded video: {}", e)))?;

        if let Err(e) = transcoded.release() {
            tracing::warn!(error = %e, "Failed to remove transcoded output");
        }

        tracing::info!(
            size_bytes = bytes.len(),
            duration_seconds,
            "Video prepared for upload"
        );
        Ok((EncodedAsset::video(bytes, duration_seconds), duration_seconds))
    }

    /// Encode any captured media into its upload payload.
    pub async fn encode(
        &self,
        media: &CapturedMedia,
        cancel: &CancellationToken,
    ) -> MediaResult<EncodedAsset> {
        match media {
            CapturedMedia::Photo(image) => self.encode_photo(image.clone()).await,
            CapturedMedia::PhotoBytes(data) => self.encode_photo_bytes(data.clone()).await,
            CapturedMedia::Video(path) => Ok(self.prepare_video(path, cancel).await?.0),
        }
    }
}

fn jpeg_asset(image: &DynamicImage, quality: u8) -> MediaResult<EncodedAsset> {
    let bytes = photo::encode_jpeg(image, quality)
        .map_err(|e| MediaError::Encoding(format!("Failed to encode photo: {}", e)))?;

    tracing::debug!(size_bytes = bytes.len(), quality, "Photo encoded");
    Ok(EncodedAsset::photo(bytes))
}

/// Image codecs are CPU-bound, so they run off the async workers.
async fn run_blocking<F>(work: F) -> MediaResult<EncodedAsset>
where
    F: FnOnce() -> MediaResult<EncodedAsset> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| MediaError::Encoding(format!("Photo encoding task failed: {}", e)))?
}

fn truncate_seconds(seconds: f64) -> u32 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    seconds.trunc().min(u32::MAX as f64) as u32
}
