use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "registry-storage", version, about = "Inspect and populate registry tarball storage", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Tracing filter, e.g. `info` or `registry_storage=debug`
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Process-wide storage settings. Every flag falls back to an environment
/// variable; empty values count as unset.
#[derive(Args, Debug, Clone, Default)]
pub struct StorageArgs {
    /// Storage backend type (`file` or `gs`)
    #[arg(long, env = "REGISTRY_STORAGE", default_value = "file", global = true)]
    pub storage: String,

    /// Root directory of the filesystem backend
    #[arg(
        long,
        env = "REGISTRY_STORAGE_PATH",
        default_value = "/var/lib/registry/modules",
        global = true
    )]
    pub storage_path: PathBuf,

    /// Google Cloud Storage bucket
    #[arg(long, env = "REGISTRY_GCS_BUCKET", global = true)]
    pub gcs_bucket: Option<String>,

    /// Service account key file
    #[arg(long, env = "REGISTRY_GCS_KEYPATH", global = true)]
    pub gcs_keypath: Option<String>,

    /// Static OAuth2 access token
    #[arg(long, env = "REGISTRY_GCS_ACCESS_TOKEN", hide_env_values = true, global = true)]
    pub gcs_access_token: Option<String>,

    /// Project paired with the access token
    #[arg(long, env = "GCP_PROJECT_ID", global = true)]
    pub gcp_project_id: Option<String>,

    /// Authenticate with the ambient identity (application default credentials)
    #[arg(
        long,
        env = "REGISTRY_GCS_SELF_ACCESS",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new(),
        global = true
    )]
    pub gcs_self_access: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Print the configured backend kind")]
    Kind,
    #[command(about = "Store FILE under KEY, overwriting any existing item")]
    Put {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    #[command(about = "Check whether KEY exists")]
    Has {
        #[arg(value_name = "KEY")]
        key: String,
    },
    #[command(about = "Fetch KEY to stdout or to --output")]
    Get {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },
}
