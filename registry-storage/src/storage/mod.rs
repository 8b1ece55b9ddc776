use std::sync::Arc;

use bytes::Bytes;
use object_store::path::Path as ObjectPath;

use crate::config::StorageConfig;
use crate::error::{ConfigError, Result, StorageError};
use driver::filesystem::FilesystemStorage;
use driver::gcs::GcsStorage;

pub mod driver;

/// Storage capability the registry uses for module tarballs. One
/// implementation per backend; the process picks exactly one at startup.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Constant identifier of the backend kind.
    fn kind(&self) -> &'static str;

    /// Stores `content` under `path`, replacing whatever was there.
    ///
    /// Argument errors are returned as `Err` before any I/O. Once the write
    /// is attempted, every failure is reported as `Ok(false)`.
    async fn set_item(&self, path: &str, content: Bytes) -> Result<bool>;

    /// Whether an item is stored under `path`. Only a definite "not found"
    /// yields `Ok(false)`; any other lookup failure is an error.
    async fn has_item(&self, path: &str) -> Result<bool>;

    /// Full contents of the item at `path`.
    async fn get_item(&self, path: &str) -> Result<Bytes>;
}

/// Builds the backend selected by configuration.
pub fn open(config: &StorageConfig) -> Result<Arc<dyn StorageBackend>, ConfigError> {
    let backend: Arc<dyn StorageBackend> = match config {
        StorageConfig::Filesystem { root } => Arc::new(FilesystemStorage::new(root)?),
        StorageConfig::Gcs(gcs) => Arc::new(GcsStorage::new(gcs)?),
    };
    Ok(backend)
}

/// Parses an item key. Empty keys, empty segments and `.`/`..` segments are
/// rejected, as are keys the parser would rewrite (leading or trailing `/`),
/// so every accepted key names exactly one object.
pub(crate) fn item_path(path: &str) -> Result<ObjectPath> {
    if path.trim().is_empty() {
        return Err(StorageError::InvalidArgument("path is required.".into()));
    }
    if path
        .split('/')
        .any(|segment| segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidArgument(format!(
            "path `{path}` must not contain relative segments"
        )));
    }
    let parsed = ObjectPath::parse(path)
        .map_err(|e| StorageError::InvalidArgument(format!("path `{path}` is invalid: {e}")))?;
    if parsed.as_ref().is_empty() || parsed.as_ref() != path {
        return Err(StorageError::InvalidArgument(format!(
            "path `{path}` must not start or end with `/`"
        )));
    }
    Ok(parsed)
}

pub(crate) fn require_content(content: &Bytes) -> Result<()> {
    if content.is_empty() {
        return Err(StorageError::InvalidArgument("tarball is required.".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_path_accepts_registry_layout() {
        let path = item_path("modules/hashicorp/consul/aws/0.1.0/consul-0.1.0.tar.gz").unwrap();
        assert_eq!(path.parts().count(), 6);
    }

    #[test]
    fn item_path_rejects_bad_keys() {
        for key in ["", "   ", "a/../b", "./a", "a//b", "/", "//", "/a/b", "a/b/"] {
            assert!(
                matches!(item_path(key), Err(StorageError::InvalidArgument(_))),
                "{key:?} should be rejected"
            );
        }
    }

    #[test]
    fn empty_content_is_rejected() {
        assert!(matches!(
            require_content(&Bytes::new()),
            Err(StorageError::InvalidArgument(_))
        ));
        assert!(require_content(&Bytes::from_static(b"x")).is_ok());
    }

    #[test]
    fn open_filesystem_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = open(&StorageConfig::Filesystem {
            root: dir.path().join("modules"),
        })
        .unwrap();
        assert_eq!(backend.kind(), "file");
        assert!(dir.path().join("modules").is_dir());
    }
}
