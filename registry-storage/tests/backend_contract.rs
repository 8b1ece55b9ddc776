use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use object_store::memory::InMemory;
use registry_storage::config::validate_config;
use registry_storage::utils::cli::StorageArgs;
use registry_storage::{
    ConfigError, FilesystemStorage, GcsStorage, StorageBackend, StorageConfig, StorageError, open,
};
use tempfile::TempDir;

const KEY: &str = "modules/terraform-aws-modules/vpc/aws/5.1.0/vpc-5.1.0.tar.gz";

fn gcs() -> Arc<dyn StorageBackend> {
    Arc::new(GcsStorage::with_store(
        "registry-modules",
        Arc::new(InMemory::new()),
    ))
}

fn filesystem() -> (TempDir, Arc<dyn StorageBackend>) {
    let dir = tempfile::tempdir().unwrap();
    let storage = FilesystemStorage::new(dir.path().join("modules")).unwrap();
    (dir, Arc::new(storage))
}

async fn round_trip(storage: &dyn StorageBackend) {
    let tarball = Bytes::from((0..=255u8).cycle().take(64 * 1024).collect::<Vec<_>>());

    assert!(storage.set_item(KEY, tarball.clone()).await.unwrap());
    assert_eq!(storage.get_item(KEY).await.unwrap(), tarball);
}

async fn rejects_missing_arguments(storage: &dyn StorageBackend) {
    assert!(matches!(
        storage.set_item("", Bytes::from_static(b"tarball")).await,
        Err(StorageError::InvalidArgument(_))
    ));
    assert!(matches!(
        storage.set_item(KEY, Bytes::new()).await,
        Err(StorageError::InvalidArgument(_))
    ));
    assert!(!storage.has_item(KEY).await.unwrap());
}

async fn rejects_keys_that_would_be_rewritten(storage: &dyn StorageBackend) {
    let leading = format!("/{KEY}");
    for key in ["/", leading.as_str(), "modules/ns/"] {
        assert!(
            matches!(
                storage.set_item(key, Bytes::from_static(b"tarball")).await,
                Err(StorageError::InvalidArgument(_))
            ),
            "{key:?} should be rejected by set_item"
        );
        assert!(matches!(
            storage.has_item(key).await,
            Err(StorageError::InvalidArgument(_))
        ));
        assert!(matches!(
            storage.get_item(key).await,
            Err(StorageError::InvalidArgument(_))
        ));
    }
    assert!(!storage.has_item(KEY).await.unwrap());
}

async fn existence_follows_writes(storage: &dyn StorageBackend) {
    assert!(!storage.has_item(KEY).await.unwrap());
    assert!(storage.set_item(KEY, Bytes::from_static(b"v1")).await.unwrap());
    assert!(storage.has_item(KEY).await.unwrap());
    assert!(!storage.has_item("modules/never/written.tar.gz").await.unwrap());
}

async fn last_writer_wins(storage: &dyn StorageBackend) {
    storage.set_item(KEY, Bytes::from_static(b"A")).await.unwrap();
    storage.set_item(KEY, Bytes::from_static(b"B")).await.unwrap();
    assert_eq!(storage.get_item(KEY).await.unwrap(), Bytes::from_static(b"B"));
}

async fn missing_item_is_not_found(storage: &dyn StorageBackend) {
    assert!(matches!(
        storage.get_item("modules/never/written.tar.gz").await,
        Err(StorageError::NotFound(_))
    ));
}

async fn concurrent_writes_all_land(storage: Arc<dyn StorageBackend>) {
    let writes = (0..16).map(|i| {
        let storage = storage.clone();
        async move {
            let key = format!("modules/ns/mod{i}/aws/1.0.{i}/mod.tar.gz");
            storage
                .set_item(&key, Bytes::from(format!("tarball-{i}")))
                .await
                .unwrap()
        }
    });
    assert!(join_all(writes).await.into_iter().all(|stored| stored));

    for i in 0..16 {
        let key = format!("modules/ns/mod{i}/aws/1.0.{i}/mod.tar.gz");
        assert_eq!(
            storage.get_item(&key).await.unwrap(),
            Bytes::from(format!("tarball-{i}"))
        );
    }
}

#[tokio::test]
async fn gcs_contract() {
    round_trip(gcs().as_ref()).await;
    rejects_missing_arguments(gcs().as_ref()).await;
    rejects_keys_that_would_be_rewritten(gcs().as_ref()).await;
    existence_follows_writes(gcs().as_ref()).await;
    last_writer_wins(gcs().as_ref()).await;
    missing_item_is_not_found(gcs().as_ref()).await;
    concurrent_writes_all_land(gcs()).await;
}

#[tokio::test]
async fn filesystem_contract() {
    let (_dir, storage) = filesystem();
    round_trip(storage.as_ref()).await;

    let (_dir, storage) = filesystem();
    rejects_missing_arguments(storage.as_ref()).await;

    let (_dir, storage) = filesystem();
    rejects_keys_that_would_be_rewritten(storage.as_ref()).await;

    let (_dir, storage) = filesystem();
    existence_follows_writes(storage.as_ref()).await;

    let (_dir, storage) = filesystem();
    last_writer_wins(storage.as_ref()).await;

    let (_dir, storage) = filesystem();
    missing_item_is_not_found(storage.as_ref()).await;

    let (_dir, storage) = filesystem();
    concurrent_writes_all_land(storage).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_writers_leave_one_complete_tarball() {
    let (_dir, storage) = filesystem();
    let a = Bytes::from(vec![b'a'; 256 * 1024]);
    let b = Bytes::from(vec![b'b'; 256 * 1024]);

    let (sa, sb) = (storage.clone(), storage.clone());
    let (ra, rb) = tokio::join!(
        tokio::spawn({
            let a = a.clone();
            async move { sa.set_item(KEY, a).await.unwrap() }
        }),
        tokio::spawn({
            let b = b.clone();
            async move { sb.set_item(KEY, b).await.unwrap() }
        }),
    );
    assert!(ra.unwrap() && rb.unwrap());

    let stored = storage.get_item(KEY).await.unwrap();
    assert!(stored == a || stored == b);
}

#[test]
fn startup_selects_backend_from_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let args = StorageArgs {
        storage: "file".into(),
        storage_path: dir.path().join("modules"),
        ..Default::default()
    };
    let config = validate_config(&args).unwrap();
    assert!(matches!(config.storage, StorageConfig::Filesystem { .. }));
    assert_eq!(open(&config.storage).unwrap().kind(), "file");
}

#[test]
fn startup_fails_before_any_operation_without_bucket() {
    let args = StorageArgs {
        storage: "gs".into(),
        gcs_self_access: true,
        ..Default::default()
    };
    assert!(matches!(
        validate_config(&args),
        Err(ConfigError::MissingBucket)
    ));
}

#[test]
fn startup_fails_without_credentials() {
    let args = StorageArgs {
        storage: "gs".into(),
        gcs_bucket: Some("registry-modules".into()),
        ..Default::default()
    };
    let err = validate_config(&args).unwrap_err();
    assert!(matches!(err, ConfigError::NoCredentials));
    assert!(err.to_string().contains("REGISTRY_GCS_SELF_ACCESS"));
}
