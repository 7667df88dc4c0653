//! Cancellable conversion of a source video into a scratch-directory MP4.

use async_trait::async_trait;
use morsel_core::TranscodeError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;
use tokio_util::sync::CancellationToken;

/// Something that can turn `source` into a canonical MP4 at `output`.
///
/// Implementations write to `output` (which already exists and may be overwritten) and report
/// how the conversion ended. Dropping the returned future must stop the work.
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    async fn convert(&self, source: &Path, output: &Path) -> Result<(), TranscodeError>;
}

/// A completed conversion. The output file is removed when this handle is dropped.
#[derive(Debug)]
pub struct TranscodedVideo {
    output: TempPath,
}

impl TranscodedVideo {
    pub fn path(&self) -> &Path {
        &self.output
    }

    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.output).await
    }

    /// Delete the output file now instead of on drop.
    pub fn release(self) -> std::io::Result<()> {
        self.output.close()
    }
}

#[derive(Clone)]
pub struct TranscodingService {
    backend: Arc<dyn ConversionBackend>,
    scratch_dir: PathBuf,
}

impl TranscodingService {
    pub fn new(backend: Arc<dyn ConversionBackend>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Convert `source` to the delivery format.
    ///
    /// Ends in exactly one of: a [`TranscodedVideo`], `Failed`, `Cancelled` or
    /// `UnsupportedStatus`. On every error path the scratch output is gone before this returns.
    pub async fn convert(
        &self,
        source: &Path,
        cancel: &CancellationToken,
    ) -> Result<TranscodedVideo, TranscodeError> {
        if cancel.is_cancelled() {
            return Err(TranscodeError::Cancelled);
        }

        match tokio::fs::metadata(source).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(TranscodeError::Failed(format!(
                    "source is not a file: {}",
                    source.display()
                )))
            }
            Err(e) => {
                return Err(TranscodeError::Failed(format!(
                    "source not readable {}: {}",
                    source.display(),
                    e
                )))
            }
        }

        let output = tempfile::Builder::new()
            .prefix("morsel-transcode-")
            .suffix(".mp4")
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| TranscodeError::Failed(format!("Failed to create scratch file: {}", e)))?
            .into_temp_path();

        let start = std::time::Instant::now();
        tracing::info!(
            source = %source.display(),
            output = %output.display(),
            "Transcoding started"
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TranscodeError::Cancelled),
            result = self.backend.convert(source, &output) => result,
        };

        let outcome = match outcome {
            Ok(()) => match tokio::fs::metadata(&output).await {
                Ok(meta) if meta.len() > 0 => Ok(()),
                _ => Err(TranscodeError::Failed(
                    "transcoder produced no output".to_string(),
                )),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                tracing::info!(
                    output = %output.display(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Transcoding completed"
                );
                Ok(TranscodedVideo { output })
            }
            Err(e) => {
                let path = output.to_path_buf();
                if let Err(io) = output.close() {
                    tracing::warn!(
                        output = %path.display(),
                        error = %io,
                        "Failed to remove scratch output"
                    );
                }
                tracing::warn!(
                    error = %e,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Transcoding did not complete"
                );
                Err(e)
            }
        }
    }
}
