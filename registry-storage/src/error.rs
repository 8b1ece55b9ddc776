use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = StorageError> = std::result::Result<T, E>;

/// Faults detected while resolving configuration. All of them are fatal:
/// the process must not start serving with a half-configured backend.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Google storage requires REGISTRY_GCS_BUCKET.")]
    MissingBucket,

    #[error("invalid bucket name `{0}`")]
    InvalidBucket(String),

    #[error(
        "No valid authentication method provided. Ensure one of the following is set: \
         REGISTRY_GCS_KEYPATH, REGISTRY_GCS_ACCESS_TOKEN, or REGISTRY_GCS_SELF_ACCESS"
    )]
    NoCredentials,

    #[error("service account key file `{}` does not exist", .0.display())]
    KeyFileNotFound(PathBuf),

    #[error("unknown storage backend `{0}`, expected one of: file, gs")]
    UnknownBackend(String),

    #[error("storage root `{}` is unusable: {source}", path.display())]
    StorageRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // The object-storage client refused the assembled options.
    #[error("failed to build storage client: {0}")]
    Client(String),
}

/// Per-call faults raised by a storage backend.
#[derive(Error, Debug)]
pub enum StorageError {
    // Rejected before any I/O is attempted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("item not found: {0}")]
    NotFound(String),

    #[error("object store error: {0}")]
    Backend(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
