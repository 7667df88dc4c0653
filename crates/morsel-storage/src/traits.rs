//! Remote asset store abstraction
//!
//! This module defines the AssetStore trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Content-addressed remote asset store.
///
/// Objects live at `(bucket, path)`; see the crate root for the path layout. Services hold an
/// `Arc<dyn AssetStore>` so any backend can be injected.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `data` at `bucket/path`, replacing anything already there.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Publicly reachable URL for `bucket/path`.
    async fn public_url(&self, bucket: &str, path: &str) -> StorageResult<String>;

    /// Remove the given paths from `bucket`. Missing objects are not an error.
    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
