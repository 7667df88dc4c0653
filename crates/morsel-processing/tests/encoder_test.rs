use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use morsel_core::{MediaError, MediaKind, TranscodeError};
use morsel_processing::{
    CapturedMedia, ConversionBackend, DurationProbe, MediaEncoder, TranscodingService,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

struct CopyBackend;

#[async_trait]
impl ConversionBackend for CopyBackend {
    async fn convert(&self, source: &Path, output: &Path) -> Result<(), TranscodeError> {
        tokio::fs::copy(source, output)
            .await
            .map(|_| ())
            .map_err(|e| TranscodeError::Failed(e.to_string()))
    }
}

/// Reports a fixed duration and remembers which file it was asked about.
struct FixedProbe {
    seconds: f64,
    probed: Mutex<Option<PathBuf>>,
}

impl FixedProbe {
    fn new(seconds: f64) -> Arc<Self> {
        Arc::new(Self {
            seconds,
            probed: Mutex::new(None),
        })
    }

    fn probed(&self) -> Option<PathBuf> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl DurationProbe for FixedProbe {
    async fn duration_seconds(&self, path: &Path) -> anyhow::Result<f64> {
        anyhow::ensure!(path.exists(), "probed a missing file");
        *self.probed.lock().unwrap() = Some(path.to_path_buf());
        Ok(self.seconds)
    }
}

fn encoder_with(scratch: &Path, probe: Arc<FixedProbe>) -> MediaEncoder {
    MediaEncoder::new(
        80,
        TranscodingService::new(Arc::new(CopyBackend), scratch),
        probe,
    )
}

fn encoder(scratch: &Path, seconds: f64) -> MediaEncoder {
    encoder_with(scratch, FixedProbe::new(seconds))
}

#[tokio::test]
async fn test_video_duration_is_truncated_from_output() {
    let scratch = tempdir().unwrap();
    let source = scratch.path().join("clip.mov");
    std::fs::write(&source, b"fake-mp4").unwrap();

    let probe = FixedProbe::new(12.7);

    let (asset, duration) = encoder_with(scratch.path(), probe.clone())
        .prepare_video(&source, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(duration, 12);
    assert_eq!(asset.duration_seconds, Some(12));
    assert_eq!(asset.kind, MediaKind::Video);
    assert_eq!(asset.content_type, "video/mp4");
    assert_eq!(asset.bytes, b"fake-mp4");

    let probed = probe.probed().unwrap();
    assert_ne!(probed, source);
    assert_eq!(probed.parent(), Some(scratch.path()));
    assert_eq!(probed.extension().and_then(|e| e.to_str()), Some("mp4"));
    assert!(probed
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap()
        .starts_with("morsel-transcode-"));

    // Only the source remains; the transcoded output has been released.
    assert!(!probed.exists());
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_encode_captured_photo() {
    let scratch = tempdir().unwrap();
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])));

    let asset = encoder(scratch.path(), 0.0)
        .encode(&CapturedMedia::Photo(image), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(asset.kind, MediaKind::Photo);
    assert_eq!(asset.content_type, "image/jpeg");
    assert_eq!(asset.duration_seconds, None);
    assert!(!asset.is_empty());
}

#[tokio::test]
async fn test_undecodable_photo_is_encoding_error() {
    let scratch = tempdir().unwrap();
    let result = encoder(scratch.path(), 0.0)
        .encode_photo_bytes(b"nope".to_vec())
        .await;
    assert!(matches!(result, Err(MediaError::Encoding(_))));
}

#[tokio::test(flavor = "current_thread")]
async fn test_photo_encoding_leaves_runtime_free() {
    let scratch = tempdir().unwrap();
    let encoder = Arc::new(encoder(scratch.path(), 0.0));
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1024, 1024, Rgb([9, 8, 7])));

    let (tx, mut rx) = tokio::sync::oneshot::channel::<()>();
    let encoding = tokio::spawn({
        let encoder = encoder.clone();
        async move {
            let asset = encoder.encode_photo(image).await;
            (asset, rx.try_recv().is_ok())
        }
    });
    // Runs while the encode is parked on the blocking pool.
    let ticker = tokio::spawn(async move {
        let _ = tx.send(());
    });

    ticker.await.unwrap();
    let (asset, ticked_first) = encoding.await.unwrap();
    assert!(ticked_first);
    assert_eq!(asset.unwrap().kind, MediaKind::Photo);
}

#[tokio::test]
async fn test_cancelled_video_surfaces_transcode_error() {
    let scratch = tempdir().unwrap();
    let source = scratch.path().join("clip.mov");
    std::fs::write(&source, b"fake-mp4").unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = encoder(scratch.path(), 3.0)
        .encode(&CapturedMedia::Video(source), &cancel)
        .await;

    assert!(matches!(
        result,
        Err(MediaError::Transcode(TranscodeError::Cancelled))
    ));
}
