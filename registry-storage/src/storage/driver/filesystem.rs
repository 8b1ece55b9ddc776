use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use tokio::{
    fs::{File, create_dir_all, metadata, read, remove_file, rename},
    io::{self, AsyncWriteExt},
};

use crate::error::{ConfigError, Result, StorageError};
use crate::storage::{StorageBackend, item_path, require_content};

/// Items live as plain files under `<root>/<key>`.
pub struct FilesystemStorage {
    root: PathBuf,
}

impl FilesystemStorage {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|source| ConfigError::StorageRoot {
            path: root.clone(),
            source,
        })?;
        tracing::info!(root = %root.display(), "filesystem storage backend ready");
        Ok(FilesystemStorage { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // `item_path` already refused `.`/`..` and empty segments, so the joined
    // path stays under the root.
    fn path_for(&self, key: &ObjectPath) -> PathBuf {
        key.parts()
            .fold(self.root.clone(), |path, part| path.join(part.as_ref()))
    }

    async fn crate_path(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Writes next to the destination and renames into place, so a reader
    /// sees either the old tarball or the new one.
    async fn write_atomic(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        self.crate_path(path).await?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp_path = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

        let written = async {
            let mut file = File::create(&tmp_path).await?;
            file.write_all(content).await?;
            file.sync_all().await?;
            rename(&tmp_path, path).await
        }
        .await;

        if written.is_err() {
            let _ = remove_file(&tmp_path).await;
        }
        written
    }
}

#[async_trait]
impl StorageBackend for FilesystemStorage {
    fn kind(&self) -> &'static str {
        "file"
    }

    async fn set_item(&self, path: &str, content: Bytes) -> Result<bool> {
        let key = item_path(path)?;
        require_content(&content)?;

        let file_path = self.path_for(&key);
        match self.write_atomic(&file_path, &content).await {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::error!(path, file = %file_path.display(), "failed to store item: {e}");
                Ok(false)
            }
        }
    }

    async fn has_item(&self, path: &str) -> Result<bool> {
        let key = item_path(path)?;

        match metadata(self.path_for(&key)).await {
            Ok(meta) if meta.is_file() => {
                tracing::debug!("the item already exists: {path}");
                Ok(true)
            }
            Ok(_) => Ok(false),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("the item doesn't exist: {path}");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_item(&self, path: &str) -> Result<Bytes> {
        let key = item_path(path)?;

        match read(self.path_for(&key)).await {
            Ok(buf) => Ok(Bytes::from(buf)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
