/// Image file storage
///
/// The catalog only needs to put bytes under a key, delete a key and turn a key
/// into a public URL; [`ImageStore`] is that seam. [`LocalImageStore`] keeps
/// files under a media root on the local filesystem, which the API serves
/// statically.

mod local;

pub use local::LocalImageStore;

use async_trait::async_trait;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Key is empty, absolute, or escapes the storage root
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Where uploaded images go
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores `bytes` under `key`, replacing nothing: keys are expected to be fresh
    ///
    /// Either the complete file is visible under `key` afterwards or nothing is.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Removes `key`; removing a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Whether `key` currently holds a file
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Public URL clients use to fetch `key`
    fn public_url(&self, key: &str) -> String;
}

/// Checks a key is a relative path made of plain segments
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let plain = !key.is_empty()
        && !key.starts_with('/')
        && !key.contains('\\')
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    if plain {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
