//! Test utilities for strata-store.
//!
//! Provides a recording wrapper around the in-memory store and seeding helpers
//! so tests in this and dependent crates can assert on store traffic.

use crate::memory_impl::InMemoryStore;
use crate::storage_trait::{
    BatchWriteInput, DocumentStore, Page, QueryInput, ReadConsistency, Result, ScanInput,
    StorageError, WriteRequest,
};
use crate::table::TableDefinition;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use strata_commons::{AttributeValue, Item};

/// Creates an in-memory store with one table keyed by `id` and puts `rows` in it.
pub async fn seeded_store(table: &str, rows: Vec<Item>) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    seed(store.as_ref(), TableDefinition::new(table, "id"), rows)
        .await
        .unwrap_or_else(|e| panic!("seeding '{}' failed: {}", table, e));
    store
}

/// Declares `definition` on `store` and puts every row.
pub async fn seed(
    store: &dyn DocumentStore,
    definition: TableDefinition,
    rows: Vec<Item>,
) -> Result<()> {
    let table = definition.name.clone();
    store.create_table(definition).await?;
    for row in rows {
        store.put_item(&table, row).await?;
    }
    Ok(())
}

/// Rows `id-000`, `id-001`, ... with a numeric `n` attribute.
pub fn numbered_rows(count: usize) -> Vec<Item> {
    (0..count)
        .map(|i| {
            Item::from([
                ("id".to_string(), AttributeValue::from(format!("id-{:03}", i))),
                ("n".to_string(), AttributeValue::from(i as i64)),
            ])
        })
        .collect()
}

/// Store wrapper that records the calls made through it.
///
/// Every call is forwarded to the wrapped [`InMemoryStore`].
pub struct RecordingStore {
    inner: Arc<InMemoryStore>,
    batches: Mutex<Vec<Vec<WriteRequest>>>,
    queries: Mutex<Vec<QueryInput>>,
    gets: Mutex<Vec<ReadConsistency>>,
    puts: AtomicUsize,
    scans: AtomicUsize,
    batch_failure: Mutex<Option<StorageError>>,
}

impl RecordingStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            batches: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            gets: Mutex::new(Vec::new()),
            puts: AtomicUsize::new(0),
            scans: AtomicUsize::new(0),
            batch_failure: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &Arc<InMemoryStore> {
        &self.inner
    }

    /// Size of every batch write received, in order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().iter().map(Vec::len).collect()
    }

    pub fn last_batch(&self) -> Option<Vec<WriteRequest>> {
        self.batches.lock().last().cloned()
    }

    pub fn query_inputs(&self) -> Vec<QueryInput> {
        self.queries.lock().clone()
    }

    pub fn get_count(&self) -> usize {
        self.gets.lock().len()
    }

    /// Consistency requested by every point read, in order.
    pub fn get_consistencies(&self) -> Vec<ReadConsistency> {
        self.gets.lock().clone()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    /// Rows currently in `table` of the wrapped store.
    pub fn inner_len(&self, table: &str) -> usize {
        self.inner.len(table).unwrap_or(0)
    }

    /// Makes every following batch write fail with `error`.
    pub fn fail_batches_with(&self, error: StorageError) {
        *self.batch_failure.lock() = Some(error);
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn create_table(&self, definition: TableDefinition) -> Result<()> {
        self.inner.create_table(definition).await
    }

    async fn describe_table(&self, table: &str) -> Result<TableDefinition> {
        self.inner.describe_table(table).await
    }

    async fn get_item(
        &self,
        table: &str,
        key: &Item,
        consistency: ReadConsistency,
    ) -> Result<Option<Item>> {
        self.gets.lock().push(consistency);
        self.inner.get_item(table, key, consistency).await
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<Item> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put_item(table, item).await
    }

    async fn delete_item(&self, table: &str, key: &Item) -> Result<()> {
        self.inner.delete_item(table, key).await
    }

    async fn query(&self, input: QueryInput) -> Result<Page> {
        self.queries.lock().push(input.clone());
        self.inner.query(input).await
    }

    async fn scan(&self, input: ScanInput) -> Result<Page> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.inner.scan(input).await
    }

    async fn batch_write(&self, input: BatchWriteInput) -> Result<()> {
        let failure = self.batch_failure.lock().clone();
        if let Some(error) = failure {
            return Err(error);
        }
        self.batches.lock().push(input.requests.clone());
        self.inner.batch_write(input).await
    }
}
