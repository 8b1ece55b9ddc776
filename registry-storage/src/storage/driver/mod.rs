pub mod filesystem;
pub mod gcs;
