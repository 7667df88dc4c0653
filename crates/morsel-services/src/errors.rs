//! Mapping of backend errors into `MediaError` kinds.

use morsel_core::MediaError;
use morsel_db::DbError;
use morsel_storage::StorageError;

pub fn upload_error(err: StorageError) -> MediaError {
    MediaError::Upload(err.to_string())
}

pub fn persist_error(err: DbError) -> MediaError {
    match err {
        DbError::NotFound(what) => MediaError::NotFound(what),
        other => MediaError::Persist(other.to_string()),
    }
}
