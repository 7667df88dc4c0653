//! Configuration module
//!
//! Environment-driven settings for storage, the structured store, transcoding and story
//! lifetime. `.env` files are honoured through `dotenvy`.

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_PHOTO_JPEG_QUALITY, DEFAULT_STORY_TTL_HOURS, SHARED_MEDIA_BUCKET, STORIES_BUCKET,
};
use crate::storage_types::StorageBackend;

const DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_STORAGE_BACKEND: StorageBackend = StorageBackend::Memory;

#[derive(Clone, Debug)]
pub struct MorselConfig {
    pub environment: String,
    // Structured store
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    // Asset store
    pub storage_backend: StorageBackend,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub public_base_url: String,
    pub shared_media_bucket: String,
    pub stories_bucket: String,
    // Media pipeline
    pub story_ttl_hours: i64,
    pub photo_jpeg_quality: u8,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub transcode_scratch_dir: PathBuf,
}

impl MorselConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse::<StorageBackend>()?,
            Err(_) => DEFAULT_STORAGE_BACKEND,
        };

        let local_storage_base_url = env::var("LOCAL_STORAGE_BASE_URL").ok();
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .ok()
            .or_else(|| local_storage_base_url.clone())
            .unwrap_or_else(|| "http://localhost:54321".to_string());

        let config = MorselConfig {
            environment,
            database_url: env::var("DATABASE_URL").ok(),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DB_MAX_CONNECTIONS),
            storage_backend,
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url,
            s3_region: env::var("S3_REGION").or_else(|_| env::var("AWS_REGION")).ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            public_base_url,
            shared_media_bucket: env::var("SHARED_MEDIA_BUCKET")
                .unwrap_or_else(|_| SHARED_MEDIA_BUCKET.to_string()),
            stories_bucket: env::var("STORIES_BUCKET")
                .unwrap_or_else(|_| STORIES_BUCKET.to_string()),
            story_ttl_hours: env::var("STORY_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_STORY_TTL_HOURS),
            photo_jpeg_quality: env::var("PHOTO_JPEG_QUALITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PHOTO_JPEG_QUALITY),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            transcode_scratch_dir: env::var("TRANSCODE_SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.story_ttl_hours <= 0 {
            return Err(anyhow::anyhow!("STORY_TTL_HOURS must be positive"));
        }

        if self.photo_jpeg_quality == 0 || self.photo_jpeg_quality > 100 {
            return Err(anyhow::anyhow!("PHOTO_JPEG_QUALITY must be between 1 and 100"));
        }

        if let Some(url) = &self.database_url {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.shared_media_bucket.trim().is_empty() || self.stories_bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("Bucket names must not be empty"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() || self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn story_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.story_ttl_hours)
    }
}

impl Default for MorselConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            database_url: None,
            db_max_connections: DB_MAX_CONNECTIONS,
            storage_backend: DEFAULT_STORAGE_BACKEND,
            local_storage_path: None,
            local_storage_base_url: None,
            s3_region: None,
            s3_endpoint: None,
            public_base_url: "http://localhost:54321".to_string(),
            shared_media_bucket: SHARED_MEDIA_BUCKET.to_string(),
            stories_bucket: STORIES_BUCKET.to_string(),
            story_ttl_hours: DEFAULT_STORY_TTL_HOURS,
            photo_jpeg_quality: DEFAULT_PHOTO_JPEG_QUALITY,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            transcode_scratch_dir: env::temp_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MorselConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.story_ttl(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_from_env_without_backend_matches_default() {
        env::remove_var("STORAGE_BACKEND");
        let config = MorselConfig::from_env().unwrap();
        assert_eq!(config.storage_backend, MorselConfig::default().storage_backend);
        assert_eq!(config.storage_backend, StorageBackend::Memory);
    }

    #[test]
    fn test_local_backend_requires_paths() {
        let config = MorselConfig {
            storage_backend: StorageBackend::Local,
            ..MorselConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_postgres_url() {
        let config = MorselConfig {
            database_url: Some("mysql://localhost/morsel".to_string()),
            ..MorselConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_ttl() {
        let config = MorselConfig {
            story_ttl_hours: 0,
            ..MorselConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
