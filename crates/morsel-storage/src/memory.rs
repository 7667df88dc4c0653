//! In-memory asset store.
//!
//! Used for development runs and tests. Every call is counted, and each operation can be
//! switched to fail so callers can exercise their partial-failure paths.

use crate::keys::validate_key;
use crate::traits::{AssetStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

pub struct MemoryStorage {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    base_url: String,
    uploads: AtomicUsize,
    lookups: AtomicUsize,
    removals: AtomicUsize,
    fail_uploads: AtomicBool,
    fail_lookups: AtomicBool,
    fail_removals: AtomicBool,
}

impl MemoryStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            base_url: base_url.into(),
            uploads: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
            removals: AtomicUsize::new(0),
            fail_uploads: AtomicBool::new(false),
            fail_lookups: AtomicBool::new(false),
            fail_removals: AtomicBool::new(false),
        }
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn removal_count(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }

    /// Total calls made against this store.
    pub fn call_count(&self) -> usize {
        self.upload_count() + self.lookup_count() + self.removal_count()
    }

    pub fn contains(&self, bucket: &str, path: &str) -> bool {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&(bucket.to_string(), path.to_string()))
    }

    /// Stored bytes and content type, for assertions.
    pub fn object(&self, bucket: &str, path: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(bucket.to_string(), path.to_string()))
            .map(|o| (o.data.clone(), o.content_type.clone()))
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new("http://localhost:54321/memory")
    }
}

#[async_trait]
impl AssetStore for MemoryStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        validate_key(bucket, path)?;
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("simulated upload failure".to_string()));
        }

        let size = data.len();
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).insert(
            (bucket.to_string(), path.to_string()),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );

        tracing::debug!(bucket = %bucket, path = %path, size_bytes = size, "Memory storage upload");
        Ok(())
    }

    async fn public_url(&self, bucket: &str, path: &str) -> StorageResult<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        validate_key(bucket, path)?;
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError("simulated lookup failure".to_string()));
        }
        Ok(format!("{}/{}/{}", self.base_url.trim_end_matches('/'), bucket, path))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        self.removals.fetch_add(1, Ordering::SeqCst);
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed("simulated removal failure".to_string()));
        }

        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        for path in paths {
            validate_key(bucket, path)?;
            objects.remove(&(bucket.to_string(), path.clone()));
        }
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
