//! Scan → transform → batch write pipelines over the in-memory store.

use std::sync::Arc;
use strata_commons::normalize::unwrap_item_numbers;
use strata_commons::{AttributeValue, Item};
use strata_store::test_utils::{numbered_rows, seeded_store, RecordingStore};
use strata_store::{
    run_ops_on_item_set, BatchOperation, DocumentStore, MutationDecision, ReadConsistency,
    ScanIterator, ScanParams, StorageError,
};

fn key(id: &str) -> Item {
    Item::from([("id".to_string(), AttributeValue::from(id))])
}

#[tokio::test]
async fn test_thirty_scanned_items_cause_two_flushes() {
    let store = Arc::new(RecordingStore::new(seeded_store("users", numbered_rows(30)).await));
    let client: Arc<dyn DocumentStore> = store.clone();

    let source = ScanIterator::new(client.clone(), ScanParams::new("users").page_size(7)).into_stream();
    let progress = run_ops_on_item_set(
        client.as_ref(),
        BatchOperation::Put,
        |mut item| async move {
            unwrap_item_numbers(&mut item);
            item.insert("touched".to_string(), AttributeValue::from(true));
            Ok::<_, StorageError>(MutationDecision::changed(item))
        },
        source,
        "users",
        None,
        true,
    )
    .await
    .unwrap();

    assert_eq!(store.batch_sizes(), vec![25, 5]);
    assert_eq!(progress.read, 30);
    assert_eq!(progress.written, 30);

    let row = store
        .get_item("users", &key("id-029"), ReadConsistency::Strong)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row["touched"], AttributeValue::from(true));
}

#[tokio::test]
async fn test_filtered_scan_deletes_matching_rows() {
    let mut rows = numbered_rows(12);
    for row in rows.iter_mut().step_by(3) {
        row.insert(
            "clients".to_string(),
            AttributeValue::List(vec![AttributeValue::from("web")]),
        );
    }
    let store = Arc::new(RecordingStore::new(seeded_store("users", rows).await));
    let client: Arc<dyn DocumentStore> = store.clone();

    let source = ScanIterator::new(
        client.clone(),
        ScanParams::new("users")
            .filter("attribute_exists(clients)")
            .page_size(5),
    )
    .into_stream();

    run_ops_on_item_set(
        client.as_ref(),
        BatchOperation::Delete,
        |item| async move { Ok::<_, StorageError>(MutationDecision::changed(item)) },
        source,
        "users",
        Some("id"),
        true,
    )
    .await
    .unwrap();

    assert_eq!(store.batch_sizes(), vec![4]);
    assert_eq!(store.inner_len("users"), 8);
    assert!(store
        .get_item("users", &key("id-000"), ReadConsistency::Strong)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_failed_flush_halts_the_run() {
    let store = Arc::new(RecordingStore::new(seeded_store("users", numbered_rows(10)).await));
    store.fail_batches_with(StorageError::Throttled("capacity exceeded".to_string()));
    let client: Arc<dyn DocumentStore> = store.clone();

    let source = ScanIterator::new(client.clone(), ScanParams::new("users")).into_stream();
    let err = run_ops_on_item_set(
        client.as_ref(),
        BatchOperation::Put,
        |item| async move { Ok::<_, StorageError>(MutationDecision::changed(item)) },
        source,
        "users",
        None,
        false,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, StorageError::Throttled(_)));
}
