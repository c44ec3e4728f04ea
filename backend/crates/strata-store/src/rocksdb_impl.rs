//! RocksDB implementation of DocumentStore.
//!
//! Each table maps to a RocksDB column family. Row keys are the encoded primary
//! key; row values are JSON-encoded items in wire form. Table definitions are
//! persisted in a dedicated column family so a reopened database knows its
//! tables again.
//!
//! RocksDB calls block, so every operation runs on tokio's blocking pool.

use crate::paging::{query_page, resolve_batch, scan_page, to_wire, ResolvedWrite};
use crate::storage_trait::{
    BatchWriteInput, DocumentStore, Page, QueryInput, ReadConsistency, Result, ScanInput,
    StorageError,
};
use crate::table::TableDefinition;
use async_trait::async_trait;
use parking_lot::RwLock;
use rocksdb::{
    BoundColumnFamily, DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options,
    WriteBatch,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use strata_commons::Item;

type Db = DBWithThreadMode<MultiThreaded>;

/// Column family holding table definitions.
const TABLES_CF: &str = "__strata_tables";

/// RocksDB-backed document store.
///
/// ## Example
///
/// ```rust,ignore
/// use strata_store::{DocumentStore, RocksDbStore, TableDefinition};
///
/// let store = RocksDbStore::open("/tmp/strata")?;
/// store.create_table(TableDefinition::new("users", "id")).await?;
/// ```
pub struct RocksDbStore {
    db: Arc<Db>,
    definitions: RwLock<HashMap<String, TableDefinition>>,
}

fn io(e: rocksdb::Error) -> StorageError {
    StorageError::IoError(e.to_string())
}

fn encode_item(item: &Item) -> Result<Vec<u8>> {
    serde_json::to_vec(item).map_err(|e| StorageError::SerializationError(e.to_string()))
}

fn decode_item(bytes: &[u8]) -> Result<Item> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::SerializationError(e.to_string()))
}

fn cf<'a>(db: &'a Db, table: &str) -> Result<Arc<BoundColumnFamily<'a>>> {
    db.cf_handle(table)
        .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Other(format!("blocking task failed: {}", e)))?
}

impl RocksDbStore {
    /// Opens (or creates) a database at `path`, reloading declared tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let mut families = Db::list_cf(&opts, path).unwrap_or_else(|_| vec!["default".to_string()]);
        if !families.iter().any(|f| f == TABLES_CF) {
            families.push(TABLES_CF.to_string());
        }

        let db = Db::open_cf(&opts, path, &families).map_err(io)?;

        let mut definitions = HashMap::new();
        {
            let tables = cf(&db, TABLES_CF)?;
            for entry in db.iterator_cf(&tables, IteratorMode::Start) {
                let (_, value) = entry.map_err(io)?;
                let definition: TableDefinition = serde_json::from_slice(&value)
                    .map_err(|e| StorageError::SerializationError(e.to_string()))?;
                definitions.insert(definition.name.clone(), definition);
            }
        }
        log::info!(
            "Opened RocksDB store at {} with {} table(s)",
            path.display(),
            definitions.len()
        );

        Ok(Self {
            db: Arc::new(db),
            definitions: RwLock::new(definitions),
        })
    }

    fn definition(&self, table: &str) -> Result<TableDefinition> {
        self.definitions
            .read()
            .get(table)
            .cloned()
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }
}

#[async_trait]
impl DocumentStore for RocksDbStore {
    async fn create_table(&self, definition: TableDefinition) -> Result<()> {
        if let Some(existing) = self.definitions.read().get(&definition.name) {
            if *existing == definition {
                return Ok(());
            }
            return Err(StorageError::Validation(format!(
                "table '{}' already exists with a different definition",
                definition.name
            )));
        }

        let db = self.db.clone();
        let def = definition.clone();
        blocking(move || {
            if db.cf_handle(&def.name).is_none() {
                db.create_cf(&def.name, &Options::default()).map_err(io)?;
            }
            let tables = cf(&db, TABLES_CF)?;
            let bytes = serde_json::to_vec(&def)
                .map_err(|e| StorageError::SerializationError(e.to_string()))?;
            db.put_cf(&tables, def.name.as_bytes(), bytes).map_err(io)
        })
        .await?;

        log::debug!("Created RocksDB table '{}'", definition.name);
        self.definitions
            .write()
            .insert(definition.name.clone(), definition);
        Ok(())
    }

    async fn describe_table(&self, table: &str) -> Result<TableDefinition> {
        self.definition(table)
    }

    async fn get_item(
        &self,
        table: &str,
        key: &Item,
        _consistency: ReadConsistency,
    ) -> Result<Option<Item>> {
        let definition = self.definition(table)?;
        let encoded = definition.key.encode(key)?;
        let db = self.db.clone();
        blocking(move || {
            let handle = cf(&db, &definition.name)?;
            match db.get_cf(&handle, encoded.as_bytes()).map_err(io)? {
                Some(bytes) => decode_item(&bytes).map(Some),
                None => Ok(None),
            }
        })
        .await
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<Item> {
        let definition = self.definition(table)?;
        definition.key.key_of(&item)?;
        let encoded = definition.key.encode(&item)?;
        let stored = to_wire(item);
        let bytes = encode_item(&stored)?;
        let db = self.db.clone();
        blocking(move || {
            let handle = cf(&db, &definition.name)?;
            db.put_cf(&handle, encoded.as_bytes(), bytes).map_err(io)
        })
        .await?;
        Ok(stored)
    }

    async fn delete_item(&self, table: &str, key: &Item) -> Result<()> {
        let definition = self.definition(table)?;
        let encoded = definition.key.encode(key)?;
        let db = self.db.clone();
        blocking(move || {
            let handle = cf(&db, &definition.name)?;
            db.delete_cf(&handle, encoded.as_bytes()).map_err(io)
        })
        .await
    }

    async fn query(&self, input: QueryInput) -> Result<Page> {
        let definition = self.definition(&input.table_name)?;
        let db = self.db.clone();
        blocking(move || {
            let handle = cf(&db, &definition.name)?;
            let mut rows = Vec::new();
            for entry in db.iterator_cf(&handle, IteratorMode::Start) {
                let (_, value) = entry.map_err(io)?;
                rows.push(decode_item(&value)?);
            }
            query_page(&definition, rows.iter(), &input)
        })
        .await
    }

    async fn scan(&self, input: ScanInput) -> Result<Page> {
        let definition = self.definition(&input.table_name)?;
        let start = input
            .exclusive_start_key
            .as_ref()
            .map(|cursor| definition.key.encode(cursor.as_item()))
            .transpose()?;
        let db = self.db.clone();
        blocking(move || {
            let handle = cf(&db, &definition.name)?;
            let mode = match &start {
                Some(key) => IteratorMode::From(key.as_bytes(), Direction::Forward),
                None => IteratorMode::Start,
            };
            // The cursor row itself plus one lookahead row beyond the limit.
            let wanted = input.limit.map(|l| l.saturating_add(2)).unwrap_or(usize::MAX);

            let mut rows: Vec<(String, Item)> = Vec::new();
            for entry in db.iterator_cf(&handle, mode).take(wanted) {
                let (key, value) = entry.map_err(io)?;
                let key = String::from_utf8(key.to_vec())
                    .map_err(|e| StorageError::SerializationError(e.to_string()))?;
                rows.push((key, decode_item(&value)?));
            }
            scan_page(&definition, rows.iter().map(|(k, v)| (k, v)), &input)
        })
        .await
    }

    async fn batch_write(&self, input: BatchWriteInput) -> Result<()> {
        let definition = self.definition(&input.table_name)?;
        let writes = resolve_batch(&definition, input)?;
        let db = self.db.clone();
        blocking(move || {
            let handle = cf(&db, &definition.name)?;
            let mut batch = WriteBatch::default();
            for write in writes {
                match write {
                    ResolvedWrite::Put { encoded, item } => {
                        batch.put_cf(&handle, encoded.as_bytes(), encode_item(&item)?);
                    }
                    ResolvedWrite::Delete { encoded } => {
                        batch.delete_cf(&handle, encoded.as_bytes());
                    }
                }
            }
            db.write(batch).map_err(io)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage_trait::WriteRequest;
    use strata_commons::{AttributeValue, NumberValue};
    use tempfile::TempDir;

    fn row(id: &str, n: i64) -> Item {
        Item::from([
            ("id".to_string(), AttributeValue::from(id)),
            ("n".to_string(), AttributeValue::from(n)),
        ])
    }

    #[tokio::test]
    async fn test_rocksdb_put_get_roundtrip_boxes_numbers() {
        let temp_dir = TempDir::new().unwrap();
        let store = RocksDbStore::open(temp_dir.path()).unwrap();
        store
            .create_table(TableDefinition::new("things", "id"))
            .await
            .unwrap();

        store.put_item("things", row("a", 7)).await.unwrap();
        let found = store
            .get_item("things", &row("a", 0), ReadConsistency::Strong)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["n"], AttributeValue::Boxed(NumberValue::new("7")));
    }

    #[tokio::test]
    async fn test_rocksdb_tables_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = RocksDbStore::open(temp_dir.path()).unwrap();
            store
                .create_table(TableDefinition::new("things", "id"))
                .await
                .unwrap();
            store
                .batch_write(BatchWriteInput {
                    table_name: "things".to_string(),
                    requests: (0..3)
                        .map(|i| WriteRequest::Put {
                            item: row(&format!("r{}", i), i),
                        })
                        .collect(),
                })
                .await
                .unwrap();
        }

        let store = RocksDbStore::open(temp_dir.path()).unwrap();
        let page = store
            .scan(ScanInput {
                table_name: "things".to_string(),
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);

        let rest = store
            .scan(ScanInput {
                table_name: "things".to_string(),
                limit: Some(2),
                exclusive_start_key: page.last_evaluated_key,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(rest.items.len(), 1);
        assert!(rest.last_evaluated_key.is_none());
    }
}
