//! Google Cloud Storage backend.
//!
//! A thin adapter: every operation is a single request against the bucket,
//! with no retries, caching or locking at this layer. The bucket handle is
//! built once from [`GcsConfig`] and shared read-only by all callers.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::gcp::{GcpCredential, GoogleCloudStorageBuilder};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore, StaticCredentialProvider};

use crate::config::{GcsAuth, GcsConfig};
use crate::error::{ConfigError, Result, StorageError};
use crate::storage::{StorageBackend, item_path, require_content};

/// Message prefix the JSON API uses for missing objects.
const NOT_FOUND_PREFIX: &str = "No such object:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Other,
}

/// Separates "the object is definitely absent" from every other failure.
///
/// The structured `NotFound` kind is authoritative; the message prefix only
/// covers errors the client could not map to a status.
pub fn classify_error(err: &object_store::Error) -> ErrorClass {
    match err {
        object_store::Error::NotFound { .. } => ErrorClass::NotFound,
        object_store::Error::Generic { source, .. }
            if source.to_string().starts_with(NOT_FOUND_PREFIX) =>
        {
            ErrorClass::NotFound
        }
        _ => ErrorClass::Other,
    }
}

/// The three bucket calls the adapter makes.
#[async_trait]
pub trait BucketClient: Send + Sync {
    async fn put(&self, path: &ObjectPath, content: Bytes) -> object_store::Result<()>;
    async fn head(&self, path: &ObjectPath) -> object_store::Result<ObjectMeta>;
    async fn get(&self, path: &ObjectPath) -> object_store::Result<Bytes>;
}

#[async_trait]
impl BucketClient for Arc<dyn ObjectStore> {
    async fn put(&self, path: &ObjectPath, content: Bytes) -> object_store::Result<()> {
        ObjectStore::put(&**self, path, content.into())
            .await
            .map(|_| ())
    }

    async fn head(&self, path: &ObjectPath) -> object_store::Result<ObjectMeta> {
        ObjectStore::head(&**self, path).await
    }

    async fn get(&self, path: &ObjectPath) -> object_store::Result<Bytes> {
        ObjectStore::get(&**self, path).await?.bytes().await
    }
}

pub struct GcsStorage {
    bucket: String,
    client: Box<dyn BucketClient>,
}

impl GcsStorage {
    pub fn new(config: &GcsConfig) -> Result<Self, ConfigError> {
        let mut builder = GoogleCloudStorageBuilder::new().with_bucket_name(&config.bucket);

        builder = match &config.auth {
            GcsAuth::KeyFile(path) => {
                builder.with_service_account_path(path.to_string_lossy().into_owned())
            }
            GcsAuth::AccessToken { token, project_id } => {
                if let Some(project_id) = project_id {
                    tracing::info!(project_id = %project_id, "access token scoped to project");
                }
                let credential = StaticCredentialProvider::new(GcpCredential {
                    bearer: token.clone(),
                });
                builder.with_credentials(Arc::new(credential))
            }
            // Left to application default credentials / the metadata server.
            GcsAuth::SelfAccess => builder,
        };

        let store = builder
            .build()
            .map_err(|e| ConfigError::Client(format!("GCS: {e}")))?;

        tracing::info!(
            bucket = %config.bucket,
            auth = config.auth.strategy(),
            "google cloud storage backend ready"
        );
        Ok(Self::with_store(config.bucket.clone(), Arc::new(store)))
    }

    /// Wraps an already-built store, e.g. an in-memory one.
    pub fn with_store(bucket: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self::with_client(bucket, store)
    }

    pub fn with_client(bucket: impl Into<String>, client: impl BucketClient + 'static) -> Self {
        Self {
            bucket: bucket.into(),
            client: Box::new(client),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl StorageBackend for GcsStorage {
    fn kind(&self) -> &'static str {
        "gcs"
    }

    async fn set_item(&self, path: &str, content: Bytes) -> Result<bool> {
        let key = item_path(path)?;
        require_content(&content)?;

        match self.client.put(&key, content).await {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::error!(bucket = %self.bucket, path, "failed to store item: {e}");
                Ok(false)
            }
        }
    }

    async fn has_item(&self, path: &str) -> Result<bool> {
        let key = item_path(path)?;

        match self.client.head(&key).await {
            Ok(meta) if !meta.location.as_ref().is_empty() => {
                tracing::debug!("the item already exists: {path}");
                Ok(true)
            }
            Ok(_) => {
                tracing::debug!("the item doesn't exist: {path}");
                Ok(false)
            }
            Err(e) => match classify_error(&e) {
                ErrorClass::NotFound => {
                    tracing::debug!("the item doesn't exist: {path}");
                    Ok(false)
                }
                ErrorClass::Other => Err(e.into()),
            },
        }
    }

    async fn get_item(&self, path: &str) -> Result<Bytes> {
        let key = item_path(path)?;

        self.client.get(&key).await.map_err(|e| match classify_error(&e) {
            ErrorClass::NotFound => StorageError::NotFound(path.to_string()),
            ErrorClass::Other => StorageError::Backend(e),
        })
    }
}
