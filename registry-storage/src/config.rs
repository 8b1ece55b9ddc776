use std::fmt;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::utils::cli::StorageArgs;
use crate::utils::validation::{is_valid_bucket_name, non_empty};

#[derive(Clone, Debug)]
pub struct Config {
    pub storage: StorageConfig,
}

/// The one backend selected for this process.
#[derive(Clone, Debug)]
pub enum StorageConfig {
    Filesystem { root: PathBuf },
    Gcs(GcsConfig),
}

#[derive(Clone, Debug)]
pub struct GcsConfig {
    pub bucket: String,
    pub auth: GcsAuth,
}

/// How the GCS client authenticates. Resolved once, first match wins, in
/// declaration order.
#[derive(Clone, PartialEq, Eq)]
pub enum GcsAuth {
    KeyFile(PathBuf),
    AccessToken {
        token: String,
        project_id: Option<String>,
    },
    SelfAccess,
}

impl fmt::Debug for GcsAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyFile(path) => f.debug_tuple("KeyFile").field(path).finish(),
            Self::AccessToken { project_id, .. } => f
                .debug_struct("AccessToken")
                .field("token", &"<redacted>")
                .field("project_id", project_id)
                .finish(),
            Self::SelfAccess => f.write_str("SelfAccess"),
        }
    }
}

impl GcsAuth {
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::KeyFile(_) => "key-file",
            Self::AccessToken { .. } => "access-token",
            Self::SelfAccess => "self-access",
        }
    }
}

pub fn validate_config(args: &StorageArgs) -> Result<Config, ConfigError> {
    let storage = match args.storage.trim().to_ascii_lowercase().as_str() {
        "file" | "filesystem" => StorageConfig::Filesystem {
            root: args.storage_path.clone(),
        },
        "gs" | "gcs" => StorageConfig::Gcs(resolve_gcs(args)?),
        _ => return Err(ConfigError::UnknownBackend(args.storage.clone())),
    };
    Ok(Config { storage })
}

fn resolve_gcs(args: &StorageArgs) -> Result<GcsConfig, ConfigError> {
    let bucket = non_empty(&args.gcs_bucket).ok_or(ConfigError::MissingBucket)?;
    if !is_valid_bucket_name(bucket) {
        return Err(ConfigError::InvalidBucket(bucket.to_string()));
    }

    let auth = resolve_auth(args)?;
    Ok(GcsConfig {
        bucket: bucket.to_string(),
        auth,
    })
}

fn resolve_auth(args: &StorageArgs) -> Result<GcsAuth, ConfigError> {
    let keypath = non_empty(&args.gcs_keypath);
    let token = non_empty(&args.gcs_access_token);

    let candidates = [keypath.is_some(), token.is_some(), args.gcs_self_access];
    if candidates.iter().filter(|set| **set).count() > 1 {
        tracing::warn!(
            "several GCS credential strategies are configured; using the first of key file, access token, self access"
        );
    }

    if let Some(path) = keypath {
        let path = PathBuf::from(path);
        if !path.is_file() {
            return Err(ConfigError::KeyFileNotFound(path));
        }
        return Ok(GcsAuth::KeyFile(path));
    }
    if let Some(token) = token {
        return Ok(GcsAuth::AccessToken {
            token: token.to_string(),
            project_id: non_empty(&args.gcp_project_id).map(str::to_string),
        });
    }
    if args.gcs_self_access {
        return Ok(GcsAuth::SelfAccess);
    }
    Err(ConfigError::NoCredentials)
}
