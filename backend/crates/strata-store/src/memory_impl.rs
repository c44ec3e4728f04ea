//! In-memory implementation of DocumentStore.
//!
//! Rows live in a `BTreeMap` per table keyed by encoded primary key, behind a
//! single `parking_lot::RwLock`. Items are stored in wire form, so reads hand
//! numbers back boxed exactly as a remote store would.
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use strata_store::{DocumentStore, InMemoryStore, ReadConsistency, TableDefinition};
//! use strata_commons::{AttributeValue, Item};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! rt.block_on(async {
//!     let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
//!     store.create_table(TableDefinition::new("users", "id")).await.unwrap();
//!
//!     let item = Item::from([("id".to_string(), AttributeValue::from("u1"))]);
//!     store.put_item("users", item.clone()).await.unwrap();
//!     let found = store.get_item("users", &item, ReadConsistency::Strong).await.unwrap();
//!     assert!(found.is_some());
//! });
//! ```

use crate::paging::{query_page, resolve_batch, scan_page, to_wire, ResolvedWrite};
use crate::storage_trait::{
    BatchWriteInput, DocumentStore, Page, QueryInput, ReadConsistency, Result, ScanInput,
    StorageError,
};
use crate::table::TableDefinition;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use strata_commons::Item;

struct MemoryTable {
    definition: TableDefinition,
    rows: BTreeMap<String, Item>,
}

/// Process-local document store.
///
/// Every read is strongly consistent; the requested consistency is accepted and
/// ignored.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, MemoryTable>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored in `table`.
    pub fn len(&self, table: &str) -> Result<usize> {
        let tables = self.tables.read();
        let table = tables
            .get(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        Ok(table.rows.len())
    }

    pub fn is_empty(&self, table: &str) -> Result<bool> {
        Ok(self.len(table)? == 0)
    }
}

fn missing(table: &str) -> StorageError {
    StorageError::TableNotFound(table.to_string())
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create_table(&self, definition: TableDefinition) -> Result<()> {
        let mut tables = self.tables.write();
        match tables.get(&definition.name) {
            Some(existing) if existing.definition != definition => {
                Err(StorageError::Validation(format!(
                    "table '{}' already exists with a different definition",
                    definition.name
                )))
            }
            Some(_) => Ok(()),
            None => {
                log::debug!("Creating in-memory table '{}'", definition.name);
                tables.insert(
                    definition.name.clone(),
                    MemoryTable {
                        definition,
                        rows: BTreeMap::new(),
                    },
                );
                Ok(())
            }
        }
    }

    async fn describe_table(&self, table: &str) -> Result<TableDefinition> {
        let tables = self.tables.read();
        tables
            .get(table)
            .map(|t| t.definition.clone())
            .ok_or_else(|| missing(table))
    }

    async fn get_item(
        &self,
        table: &str,
        key: &Item,
        _consistency: ReadConsistency,
    ) -> Result<Option<Item>> {
        let tables = self.tables.read();
        let table = tables.get(table).ok_or_else(|| missing(table))?;
        let encoded = table.definition.key.encode(key)?;
        Ok(table.rows.get(&encoded).cloned())
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<Item> {
        let mut tables = self.tables.write();
        let table = tables.get_mut(table).ok_or_else(|| missing(table))?;
        table.definition.key.key_of(&item)?;
        let encoded = table.definition.key.encode(&item)?;
        let stored = to_wire(item);
        table.rows.insert(encoded, stored.clone());
        Ok(stored)
    }

    async fn delete_item(&self, table: &str, key: &Item) -> Result<()> {
        let mut tables = self.tables.write();
        let table = tables.get_mut(table).ok_or_else(|| missing(table))?;
        let encoded = table.definition.key.encode(key)?;
        table.rows.remove(&encoded);
        Ok(())
    }

    async fn query(&self, input: QueryInput) -> Result<Page> {
        let tables = self.tables.read();
        let table = tables
            .get(&input.table_name)
            .ok_or_else(|| missing(&input.table_name))?;
        query_page(&table.definition, table.rows.values(), &input)
    }

    async fn scan(&self, input: ScanInput) -> Result<Page> {
        let tables = self.tables.read();
        let table = tables
            .get(&input.table_name)
            .ok_or_else(|| missing(&input.table_name))?;
        scan_page(&table.definition, table.rows.iter(), &input)
    }

    async fn batch_write(&self, input: BatchWriteInput) -> Result<()> {
        let mut tables = self.tables.write();
        let table_name = input.table_name.clone();
        let table = tables
            .get_mut(&table_name)
            .ok_or_else(|| missing(&table_name))?;

        // Validate the whole batch before applying any of it.
        let writes = resolve_batch(&table.definition, input)?;
        for write in writes {
            match write {
                ResolvedWrite::Put { encoded, item } => {
                    table.rows.insert(encoded, item);
                }
                ResolvedWrite::Delete { encoded } => {
                    table.rows.remove(&encoded);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage_trait::WriteRequest;
    use crate::table::IndexDefinition;
    use strata_commons::{AttributeValue, NumberValue};

    fn row(id: &str, user: &str, n: i64) -> Item {
        Item::from([
            ("id".to_string(), AttributeValue::from(id)),
            ("userId".to_string(), AttributeValue::from(user)),
            ("n".to_string(), AttributeValue::from(n)),
        ])
    }

    fn key(id: &str) -> Item {
        Item::from([("id".to_string(), AttributeValue::from(id))])
    }

    async fn store_with_table() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .create_table(
                TableDefinition::new("things", "id")
                    .with_index(IndexDefinition::new("byUser", "userId")),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = store_with_table().await;

        let stored = store.put_item("things", row("a", "u1", 5)).await.unwrap();
        assert_eq!(stored["n"], AttributeValue::Boxed(NumberValue::new("5")));

        let found = store
            .get_item("things", &key("a"), ReadConsistency::Eventual)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found["userId"], AttributeValue::from("u1"));

        store.delete_item("things", &key("a")).await.unwrap();
        assert!(store
            .get_item("things", &key("a"), ReadConsistency::Strong)
            .await
            .unwrap()
            .is_none());

        // Deleting again is fine
        store.delete_item("things", &key("a")).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let store = InMemoryStore::new();
        let err = store.put_item("nope", row("a", "u", 1)).await.unwrap_err();
        assert_eq!(err, StorageError::TableNotFound("nope".to_string()));
    }

    #[tokio::test]
    async fn test_put_requires_key() {
        let store = store_with_table().await;
        let err = store.put_item("things", Item::new()).await.unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_table_is_idempotent() {
        let store = store_with_table().await;
        store
            .create_table(
                TableDefinition::new("things", "id")
                    .with_index(IndexDefinition::new("byUser", "userId")),
            )
            .await
            .unwrap();
        assert!(store
            .create_table(TableDefinition::new("things", "other"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_query_index_paginates() {
        let store = store_with_table().await;
        for i in 0..5 {
            store
                .put_item("things", row(&format!("t{}", i), "u1", i))
                .await
                .unwrap();
        }
        store.put_item("things", row("x", "u2", 9)).await.unwrap();

        let mut input = QueryInput {
            table_name: "things".to_string(),
            index_name: Some("byUser".to_string()),
            key_condition_expression: "userId = :pkey".to_string(),
            expression_attribute_values: Item::from([(
                ":pkey".to_string(),
                AttributeValue::from("u1"),
            )]),
            limit: Some(2),
            exclusive_start_key: None,
            consistency: ReadConsistency::Eventual,
        };

        let mut seen = Vec::new();
        loop {
            let page = store.query(input.clone()).await.unwrap();
            seen.extend(page.items.iter().map(|i| i["id"].clone()));
            match page.last_evaluated_key {
                Some(cursor) => input.exclusive_start_key = Some(cursor),
                None => break,
            }
        }

        let ids: Vec<_> = seen.iter().filter_map(|v| v.as_str()).collect();
        assert_eq!(ids, vec!["t0", "t1", "t2", "t3", "t4"]);
    }

    #[tokio::test]
    async fn test_scan_limit_applies_before_filter() {
        let store = store_with_table().await;
        for i in 0..4 {
            let mut item = row(&format!("r{}", i), "u", i);
            if i == 3 {
                item.insert("clients".to_string(), AttributeValue::List(vec![]));
            }
            store.put_item("things", item).await.unwrap();
        }

        let page = store
            .scan(ScanInput {
                table_name: "things".to_string(),
                filter_expression: Some("attribute_exists(clients)".to_string()),
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(page.last_evaluated_key.is_some());
    }

    #[tokio::test]
    async fn test_batch_write_rejects_oversized_and_duplicates() {
        let store = store_with_table().await;

        let requests: Vec<_> = (0..26)
            .map(|i| WriteRequest::Put {
                item: row(&format!("b{}", i), "u", i),
            })
            .collect();
        let err = store
            .batch_write(BatchWriteInput {
                table_name: "things".to_string(),
                requests,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));

        let err = store
            .batch_write(BatchWriteInput {
                table_name: "things".to_string(),
                requests: vec![
                    WriteRequest::Put { item: row("d", "u", 1) },
                    WriteRequest::Delete { key: key("d") },
                ],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
        assert!(store.is_empty("things").unwrap());
    }
}
