use chrono::Utc;
use futures::StreamExt;
use otulog_storage::{ChangeFilter, ChangeStore, MemoryChangeStore, StoreError};
use otulog_types::{
    ChangeDiff, ChangeId, ChangeMethod, ChangeRecord, IndexRef, OtuId, OtuRef, OtuVersion,
    ReferenceRef, UserRef,
};
use serde_json::json;

fn make_record(otu_id: &OtuId, version: OtuVersion, user: &str) -> ChangeRecord {
    let method = match version {
        OtuVersion::Finite(0) => ChangeMethod::Create,
        OtuVersion::Removed => ChangeMethod::Remove,
        _ => ChangeMethod::Modify,
    };
    ChangeRecord {
        id: ChangeId::new(otu_id, version),
        method,
        otu: OtuRef {
            id: otu_id.clone(),
            name: "Test virus".to_string(),
            version,
        },
        reference: ReferenceRef {
            id: "ref_1".to_string(),
        },
        index: IndexRef::unbuilt(),
        diff: ChangeDiff::Snapshot(json!({"name": "Test virus"})),
        description: format!("change {version}"),
        created_at: Utc::now(),
        user: UserRef {
            id: user.to_string(),
        },
    }
}

async fn scan_versions(store: &MemoryChangeStore, otu_id: &OtuId) -> Vec<OtuVersion> {
    store
        .scan_descending(otu_id)
        .map(|record| record.unwrap().otu.version)
        .collect()
        .await
}

// ── Insert and lookup ───────────────────────────────────────────

#[tokio::test]
async fn insert_and_get() {
    let store = MemoryChangeStore::new();
    let otu_id = OtuId::from_string("abc123");
    let record = make_record(&otu_id, OtuVersion::Finite(0), "bob");

    let id = store.insert(record.clone()).await.unwrap();
    assert_eq!(id.as_str(), "abc123.0");

    let found = store.get(&id).await.unwrap().unwrap();
    assert_eq!(found, record);
}

#[tokio::test]
async fn get_missing_returns_none() {
    let store = MemoryChangeStore::new();
    let id: ChangeId = "abc123.0".parse().unwrap();
    assert!(store.get(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_insert_fails() {
    let store = MemoryChangeStore::new();
    let otu_id = OtuId::from_string("abc123");

    store
        .insert(make_record(&otu_id, OtuVersion::Finite(0), "bob"))
        .await
        .unwrap();
    let err = store
        .insert(make_record(&otu_id, OtuVersion::Finite(0), "bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateId(_)));
    assert_eq!(store.len().await, 1);
}

// ── Descending scan ─────────────────────────────────────────────

#[tokio::test]
async fn scan_orders_by_version_descending() {
    let store = MemoryChangeStore::new();
    let otu_id = OtuId::from_string("abc123");

    // Insert out of order.
    for version in [1, 0, 2] {
        store
            .insert(make_record(&otu_id, OtuVersion::Finite(version), "bob"))
            .await
            .unwrap();
    }

    assert_eq!(
        scan_versions(&store, &otu_id).await,
        vec![
            OtuVersion::Finite(2),
            OtuVersion::Finite(1),
            OtuVersion::Finite(0),
        ]
    );
}

#[tokio::test]
async fn scan_puts_removed_first() {
    let store = MemoryChangeStore::new();
    let otu_id = OtuId::from_string("abc123");

    store
        .insert(make_record(&otu_id, OtuVersion::Finite(0), "bob"))
        .await
        .unwrap();
    store
        .insert(make_record(&otu_id, OtuVersion::Removed, "bob"))
        .await
        .unwrap();
    store
        .insert(make_record(&otu_id, OtuVersion::Finite(1), "bob"))
        .await
        .unwrap();

    assert_eq!(
        scan_versions(&store, &otu_id).await,
        vec![
            OtuVersion::Removed,
            OtuVersion::Finite(1),
            OtuVersion::Finite(0),
        ]
    );
}

#[tokio::test]
async fn scan_is_scoped_to_one_otu() {
    let store = MemoryChangeStore::new();
    let a = OtuId::from_string("aaaaaaaa");
    let b = OtuId::from_string("bbbbbbbb");

    store
        .insert(make_record(&a, OtuVersion::Finite(0), "bob"))
        .await
        .unwrap();
    store
        .insert(make_record(&b, OtuVersion::Finite(0), "bob"))
        .await
        .unwrap();

    assert_eq!(scan_versions(&store, &a).await.len(), 1);
}

#[tokio::test]
async fn scan_of_unknown_otu_is_empty() {
    let store = MemoryChangeStore::new();
    assert!(scan_versions(&store, &OtuId::from_string("nothing")).await.is_empty());
}

#[tokio::test]
async fn scan_is_restartable() {
    let store = MemoryChangeStore::new();
    let otu_id = OtuId::from_string("abc123");
    store
        .insert(make_record(&otu_id, OtuVersion::Finite(0), "bob"))
        .await
        .unwrap();

    assert_eq!(scan_versions(&store, &otu_id).await.len(), 1);
    assert_eq!(scan_versions(&store, &otu_id).await.len(), 1);
}

// ── Deletion ────────────────────────────────────────────────────

#[tokio::test]
async fn delete_many_removes_only_named_ids() {
    let store = MemoryChangeStore::new();
    let otu_id = OtuId::from_string("abc123");
    for version in 0..3 {
        store
            .insert(make_record(&otu_id, OtuVersion::Finite(version), "bob"))
            .await
            .unwrap();
    }

    let ids: Vec<ChangeId> = vec!["abc123.1".parse().unwrap(), "abc123.2".parse().unwrap()];
    let removed = store.delete_many(&ids).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(scan_versions(&store, &otu_id).await, vec![OtuVersion::Finite(0)]);
}

#[tokio::test]
async fn delete_many_is_best_effort() {
    let store = MemoryChangeStore::new();
    let otu_id = OtuId::from_string("abc123");
    store
        .insert(make_record(&otu_id, OtuVersion::Finite(0), "bob"))
        .await
        .unwrap();

    let ids: Vec<ChangeId> = vec!["abc123.0".parse().unwrap(), "abc123.9".parse().unwrap()];
    let removed = store.delete_many(&ids).await.unwrap();
    assert_eq!(removed, 1);
}

// ── Aggregation ─────────────────────────────────────────────────

#[tokio::test]
async fn count_by_user_groups_and_counts() {
    let store = MemoryChangeStore::new();
    let a = OtuId::from_string("aaaaaaaa");
    let b = OtuId::from_string("bbbbbbbb");

    store
        .insert(make_record(&a, OtuVersion::Finite(0), "bob"))
        .await
        .unwrap();
    store
        .insert(make_record(&a, OtuVersion::Finite(1), "alice"))
        .await
        .unwrap();
    store
        .insert(make_record(&b, OtuVersion::Finite(0), "bob"))
        .await
        .unwrap();

    let contributors = store.count_by_user(&ChangeFilter::any()).await.unwrap();
    assert_eq!(contributors.len(), 2);
    assert_eq!(contributors[0].id, "alice");
    assert_eq!(contributors[0].count, 1);
    assert_eq!(contributors[1].id, "bob");
    assert_eq!(contributors[1].count, 2);
}

#[tokio::test]
async fn count_by_user_honors_otu_filter() {
    let store = MemoryChangeStore::new();
    let a = OtuId::from_string("aaaaaaaa");
    let b = OtuId::from_string("bbbbbbbb");

    store
        .insert(make_record(&a, OtuVersion::Finite(0), "bob"))
        .await
        .unwrap();
    store
        .insert(make_record(&b, OtuVersion::Finite(0), "bob"))
        .await
        .unwrap();

    let contributors = store
        .count_by_user(&ChangeFilter::for_otu(a))
        .await
        .unwrap();
    assert_eq!(contributors, vec![otulog_storage::Contributor { id: "bob".to_string(), count: 1 }]);
}

#[tokio::test]
async fn count_by_user_honors_reference_filter() {
    let store = MemoryChangeStore::new();
    let otu_id = OtuId::from_string("abc123");
    store
        .insert(make_record(&otu_id, OtuVersion::Finite(0), "bob"))
        .await
        .unwrap();

    let contributors = store
        .count_by_user(&ChangeFilter::for_reference("other_ref"))
        .await
        .unwrap();
    assert!(contributors.is_empty());
}
