use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{validate_key, ImageStore, StorageError};

/// Filesystem-backed image store rooted at a media directory
///
/// # Example
///
/// ```no_run
/// use servicehub_shared::storage::{ImageStore, LocalImageStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = LocalImageStore::new("./media", "/media");
/// store.put("uploads/service/a.png", b"...").await?;
/// assert_eq!(store.public_url("uploads/service/a.png"), "/media/uploads/service/a.png");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    base_url: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of `key` under the media root
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

/// Partially written file that is removed unless persisted
struct PartFile {
    path: PathBuf,
    armed: bool,
}

impl PartFile {
    fn next_to(target: &Path) -> Self {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            path: target.with_file_name(format!(".{}.{}.part", name, Uuid::new_v4())),
            armed: true,
        }
    }

    async fn persist(mut self, target: &Path) -> Result<(), StorageError> {
        fs::rename(&self.path, target).await?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "Failed to remove partial upload");
                }
            }
        }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.path_for(key)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let part = PartFile::next_to(&target);
        {
            let mut file = fs::File::create(&part.path).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
        }
        part.persist(&target).await?;

        debug!(key, size = bytes.len(), "Stored image");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let target = self.path_for(key)?;

        match fs::remove_file(&target).await {
            Ok(()) => {
                debug!(key, "Deleted image");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let target = self.path_for(key)?;
        Ok(fs::try_exists(&target).await?)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}
