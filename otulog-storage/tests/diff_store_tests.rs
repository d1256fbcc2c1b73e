use otulog_diff::diff;
use otulog_storage::{DiffStore, FsDiffStore, MemoryDiffStore, StoreError};
use otulog_types::{OtuId, OtuVersion};
use serde_json::json;

fn sample_delta() -> otulog_diff::Delta {
    diff(
        &json!({"name": "A", "isolates": []}),
        &json!({"name": "B", "isolates": [{"id": "iso_1"}]}),
    )
}

// ── Filesystem store ────────────────────────────────────────────

#[tokio::test]
async fn fs_write_then_read() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsDiffStore::new(dir.path()).unwrap();
    let otu_id = OtuId::from_string("abc123");
    let delta = sample_delta();

    store
        .write_diff(&otu_id, OtuVersion::Finite(3), &delta)
        .await
        .unwrap();
    let loaded = store
        .read_diff(&otu_id, OtuVersion::Finite(3))
        .await
        .unwrap();
    assert_eq!(loaded, delta);
}

#[tokio::test]
async fn fs_uses_one_file_per_version() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsDiffStore::new(dir.path()).unwrap();
    let otu_id = OtuId::from_string("abc123");

    store
        .write_diff(&otu_id, OtuVersion::Finite(1), &sample_delta())
        .await
        .unwrap();
    store
        .write_diff(&otu_id, OtuVersion::Finite(2), &sample_delta())
        .await
        .unwrap();

    assert!(dir.path().join("abc123_1.json").exists());
    assert!(dir.path().join("abc123_2.json").exists());
}

#[tokio::test]
async fn fs_missing_blob_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsDiffStore::new(dir.path()).unwrap();

    let err = store
        .read_diff(&OtuId::from_string("abc123"), OtuVersion::Finite(7))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingDiff { .. }));
}

#[tokio::test]
async fn fs_creates_root_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("history").join("diffs");
    let store = FsDiffStore::new(&nested).unwrap();

    store
        .write_diff(&OtuId::from_string("abc123"), OtuVersion::Finite(0), &sample_delta())
        .await
        .unwrap();
    assert!(nested.join("abc123_0.json").exists());
}

// ── Memory store ────────────────────────────────────────────────

#[tokio::test]
async fn memory_write_then_read() {
    let store = MemoryDiffStore::new();
    let otu_id = OtuId::from_string("abc123");
    let delta = sample_delta();

    store
        .write_diff(&otu_id, OtuVersion::Finite(1), &delta)
        .await
        .unwrap();
    assert_eq!(
        store.read_diff(&otu_id, OtuVersion::Finite(1)).await.unwrap(),
        delta
    );
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn memory_missing_blob_is_fatal() {
    let store = MemoryDiffStore::new();
    let err = store
        .read_diff(&OtuId::from_string("abc123"), OtuVersion::Finite(1))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingDiff { .. }));
}

#[tokio::test]
async fn keys_are_scoped_by_otu_and_version() {
    let store = MemoryDiffStore::new();
    let a = OtuId::from_string("aaaaaaaa");
    let b = OtuId::from_string("bbbbbbbb");

    store
        .write_diff(&a, OtuVersion::Finite(1), &sample_delta())
        .await
        .unwrap();

    assert!(store.read_diff(&b, OtuVersion::Finite(1)).await.is_err());
    assert!(store.read_diff(&a, OtuVersion::Finite(2)).await.is_err());
}
