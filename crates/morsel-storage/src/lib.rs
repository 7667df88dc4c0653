//! Morsel Storage Library
//!
//! The remote asset store contract and its backends (S3-compatible, local filesystem,
//! in-memory), plus the public URL resolver used for playback.
//!
//! # Storage path format
//!
//! Objects are addressed by `(bucket, path)`:
//!
//! - **Direct shares**: bucket `shared-media`, path `{photos|videos}/{uuid}.{ext}`
//! - **Stories**: bucket `stories`, path `{author_id}/{uuid}.{ext}`
//!
//! Paths must not contain `..` or a leading `/`. Path generation lives in the `keys` module so
//! every caller stays consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
pub mod resolver;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_asset_store;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use morsel_core::StorageBackend;
pub use resolver::PublicUrlResolver;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{AssetStore, StorageError, StorageResult};
