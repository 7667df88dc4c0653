use crate::keys::validate_key;
use crate::traits::{AssetStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::collections::HashMap;

/// S3 storage implementation
///
/// Each bucket namespace maps to one S3 bucket; the set of buckets is fixed at construction.
#[derive(Clone)]
pub struct S3Storage {
    stores: HashMap<String, AmazonS3>,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `buckets` - Bucket names this store may address (e.g. `shared-media`, `stories`)
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        buckets: &[String],
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut stores = HashMap::with_capacity(buckets.len());

        for bucket in buckets {
            let mut builder = AmazonS3Builder::from_env()
                .with_region(region.clone())
                .with_bucket_name(bucket.clone());

            if let Some(ref endpoint) = endpoint_url {
                let allow_http = endpoint.starts_with("http://");
                builder = builder
                    .with_endpoint(endpoint.clone())
                    .with_allow_http(allow_http);
            }

            let store = builder
                .build()
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;
            stores.insert(bucket.clone(), store);
        }

        Ok(S3Storage {
            stores,
            region,
            endpoint_url,
        })
    }

    fn store_for(&self, bucket: &str) -> StorageResult<&AmazonS3> {
        self.stores
            .get(bucket)
            .ok_or_else(|| StorageError::ConfigError(format!("bucket not configured: {}", bucket)))
    }

    /// Generate public URL for S3 object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses the endpoint URL if provided
    fn generate_url(&self, bucket: &str, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            // Path-style for compatibility: {endpoint}/{bucket}/{key}
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                bucket, self.region, key
            )
        }
    }
}

/// Objects are served with the content type they were uploaded with.
fn put_options(content_type: &str) -> PutOptions {
    let mut attributes = Attributes::new();
    attributes.insert(
        Attribute::ContentType,
        AttributeValue::from(content_type.to_string()),
    );
    PutOptions {
        attributes,
        ..PutOptions::default()
    }
}

#[async_trait]
impl AssetStore for S3Storage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        validate_key(bucket, path)?;
        let store = self.store_for(bucket)?;
        let size = data.len() as u64;
        let location = Path::from(path.to_string());

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store
            .put_opts(
                &location,
                PutPayload::from(Bytes::from(data)),
                put_options(content_type),
            )
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %path,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %path,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn public_url(&self, bucket: &str, path: &str) -> StorageResult<String> {
        validate_key(bucket, path)?;
        self.store_for(bucket)?;
        Ok(self.generate_url(bucket, path))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<()> {
        let store = self.store_for(bucket)?;
        let start = std::time::Instant::now();

        for path in paths {
            validate_key(bucket, path)?;
            let location = Path::from(path.to_string());

            let result: ObjectResult<_> = store.delete(&location).await;

            match result {
                Ok(_) | Err(ObjectStoreError::NotFound { .. }) => {}
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        bucket = %bucket,
                        key = %path,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "S3 delete failed"
                    );
                    return Err(StorageError::DeleteFailed(e.to_string()));
                }
            }
        }

        tracing::info!(
            bucket = %bucket,
            count = paths.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_options_carry_content_type() {
        let opts = put_options("video/mp4");
        assert_eq!(
            opts.attributes.get(&Attribute::ContentType).map(|v| v.as_ref()),
            Some("video/mp4")
        );
    }

    #[tokio::test]
    async fn test_generate_url_styles() {
        let buckets = vec!["stories".to_string()];
        let aws = S3Storage::new(&buckets, "eu-west-1".to_string(), None)
            .await
            .unwrap();
        assert_eq!(
            aws.generate_url("stories", "u/a.mp4"),
            "https://stories.s3.eu-west-1.amazonaws.com/u/a.mp4"
        );

        let minio = S3Storage::new(
            &buckets,
            "us-east-1".to_string(),
            Some("http://localhost:9000/".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(
            minio.generate_url("stories", "u/a.mp4"),
            "http://localhost:9000/stories/u/a.mp4"
        );
    }
}
