//! Error types module
//!
//! Every pipeline stage maps its underlying failure into one `MediaError` kind before it
//! leaves the stage. Backend-specific errors (`StorageError`, `DbError`) stay in their own
//! crates and are converted at the service boundary.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a cancelled transcode
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Terminal failure outcomes of a transcoding run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscodeError {
    #[error("Transcoding failed: {0}")]
    Failed(String),

    #[error("Transcoding was cancelled")]
    Cancelled,

    #[error("Transcoder exited with unsupported status: {0}")]
    UnsupportedStatus(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Persist error: {0}")]
    Persist(String),

    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Machine-readable error code (e.g., "UPLOAD_ERROR")
    pub fn error_code(&self) -> &'static str {
        match self {
            MediaError::Encoding(_) => "ENCODING_ERROR",
            MediaError::Transcode(TranscodeError::Cancelled) => "TRANSCODE_CANCELLED",
            MediaError::Transcode(_) => "TRANSCODE_ERROR",
            MediaError::Upload(_) => "UPLOAD_ERROR",
            MediaError::Persist(_) => "PERSIST_ERROR",
            MediaError::Resolution(_) => "RESOLUTION_ERROR",
            MediaError::NotFound(_) => "NOT_FOUND",
            MediaError::Validation(_) => "VALIDATION_ERROR",
            MediaError::Forbidden(_) => "FORBIDDEN",
        }
    }

    /// Log level for this error
    pub fn log_level(&self) -> LogLevel {
        match self {
            MediaError::Validation(_) | MediaError::NotFound(_) | MediaError::Forbidden(_) => {
                LogLevel::Debug
            }
            MediaError::Transcode(TranscodeError::Cancelled) | MediaError::Resolution(_) => {
                LogLevel::Warn
            }
            _ => LogLevel::Error,
        }
    }

    /// Emit this error through `tracing` at its own log level.
    pub fn log(&self, operation: &'static str) {
        let code = self.error_code();
        match self.log_level() {
            LogLevel::Debug => {
                tracing::debug!(operation, code, error = %self, "operation rejected")
            }
            LogLevel::Warn => tracing::warn!(operation, code, error = %self, "operation aborted"),
            LogLevel::Error => tracing::error!(operation, code, error = %self, "operation failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcode_error_converts() {
        let err: MediaError = TranscodeError::Cancelled.into();
        assert!(matches!(err, MediaError::Transcode(TranscodeError::Cancelled)));
        assert_eq!(err.error_code(), "TRANSCODE_CANCELLED");
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_validation_is_debug_level() {
        let err = MediaError::Validation("no recipients".to_string());
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert_eq!(err.to_string(), "Invalid input: no recipients");
    }
}
