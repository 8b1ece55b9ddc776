//! Tarball storage for a module registry.
//!
//! The registry talks to one [`StorageBackend`] chosen at startup:
//! a local directory or a Google Cloud Storage bucket. Configuration is
//! read once (see [`config::validate_config`]) and handed to
//! [`storage::open`].

pub mod config;
pub mod error;
pub mod storage;
pub mod utils;

pub use config::{Config, GcsAuth, GcsConfig, StorageConfig};
pub use error::{ConfigError, StorageError};
pub use storage::driver::filesystem::FilesystemStorage;
pub use storage::driver::gcs::{BucketClient, ErrorClass, GcsStorage, classify_error};
pub use storage::{StorageBackend, open};
