//! Persistent entity base.
//!
//! Typed records over a [`DocumentStore`] table, with the common lifecycle
//! attributes every record carries.
//!
//! ## Architecture
//!
//! ```text
//! EntityStore<E>           ← typed get/save/soft-delete/hard-delete (this file)
//!     ↓
//! KeyQuery / QueryPaginator← indexed lookups (query.rs)
//!     ↓
//! DocumentStore            ← item-level operations (storage_trait.rs)
//! ```
//!
//! ## Lifecycle
//!
//! `new` → `persisted` → `soft-deleted` (restorable) → `purged`.
//! [`EntityStore::hard_delete`] consumes the entity, so nothing can be done with
//! it afterwards.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use strata_store::{Entity, EntityMeta, EntityStore, EntityTable, TableDefinition};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Widget {
//!     #[serde(flatten)]
//!     meta: EntityMeta,
//!     colour: String,
//! }
//!
//! impl Entity for Widget {
//!     fn meta(&self) -> &EntityMeta { &self.meta }
//!     fn meta_mut(&mut self) -> &mut EntityMeta { &mut self.meta }
//! }
//!
//! let widgets = EntityTable::<Widget>::create(store, TableDefinition::new("widgets", "id")).await?;
//! let mut w = Widget::from_partial(&item)?;
//! widgets.save(&mut w).await?;
//! ```

use crate::query::{KeyQuery, QueryPaginator};
use crate::storage_trait::{DocumentStore, ReadConsistency, StorageError};
use crate::table::TableDefinition;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use strata_commons::normalize::unwrap_item_numbers;
use strata_commons::serialization::{from_item, to_item};
use strata_commons::time::now_millis;
use strata_commons::{AttributeValue, CommonError, Item};
use thiserror::Error;

/// Errors raised by entity operations.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Store(#[from] StorageError),
}

impl EntityError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EntityError::NotFound(_))
    }
}

impl From<CommonError> for EntityError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::Serialization(msg) => EntityError::Serialization(msg),
            CommonError::InvalidInput(msg) => EntityError::Store(StorageError::Validation(msg)),
        }
    }
}

pub type Result<T> = std::result::Result<T, EntityError>;

/// Attributes every stored record carries.
///
/// `created_at` and `updated_at` are epoch milliseconds; zero means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMeta {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_reason: Option<String>,
}

impl EntityMeta {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A typed record stored in one table.
///
/// Implementors flatten an [`EntityMeta`] into their serde representation.
pub trait Entity: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static {
    fn meta(&self) -> &EntityMeta;

    fn meta_mut(&mut self) -> &mut EntityMeta;

    fn id(&self) -> &str {
        &self.meta().id
    }

    /// Fills attributes that default at write time. Called by every save.
    fn apply_defaults(&mut self, _now: i64) {}

    /// New instance with `partial` deep-copied over the defaults.
    fn from_partial(partial: &Item) -> Result<Self> {
        let mut item = to_item(&Self::default())?;
        item.extend(partial.iter().map(|(k, v)| (k.clone(), v.clone())));
        unwrap_item_numbers(&mut item);
        Ok(from_item(&item)?)
    }
}

fn decode<E: Entity>(mut item: Item) -> Result<E> {
    unwrap_item_numbers(&mut item);
    Ok(from_item(&item)?)
}

/// Typed CRUD over an entity table.
///
/// ## Required Methods
/// - `backend()`: the store holding the table
/// - `table()`: the table's declaration
///
/// Everything else is provided.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    fn backend(&self) -> &Arc<dyn DocumentStore>;

    fn table(&self) -> &TableDefinition;

    fn table_name(&self) -> &str {
        &self.table().name
    }

    /// Loads an entity by key fields.
    ///
    /// Without an index this is a direct key lookup and a missing row is
    /// [`EntityError::NotFound`]. Through an index, every matching row is read
    /// and the last one wins; no match yields a default instance.
    async fn get(
        &self,
        key: &Item,
        index_name: Option<&str>,
        consistency: ReadConsistency,
    ) -> Result<E> {
        let Some(index_name) = index_name else {
            let found = self
                .backend()
                .get_item(self.table_name(), key, consistency)
                .await?;
            return match found {
                Some(item) => decode(item),
                None => Err(EntityError::NotFound(format!(
                    "{} in {}",
                    describe_key(key),
                    self.table_name()
                ))),
            };
        };

        let index = self.table().index(index_name)?;
        let hash_value = key.get(&index.key.hash_key).cloned().ok_or_else(|| {
            StorageError::Validation(format!(
                "key is missing index hash attribute '{}'",
                index.key.hash_key
            ))
        })?;
        let mut query = KeyQuery::new(self.table_name(), &index.key.hash_key, hash_value)
            .index(index_name)
            .consistency(consistency);
        if let Some(range_key) = &index.key.range_key {
            if let Some(value) = key.get(range_key) {
                query = query.range(range_key, value.clone());
            }
        }

        let mut rows = QueryPaginator::new(self.backend().clone(), &query);
        let mut last = None;
        let mut matched = 0usize;
        while let Some(item) = rows.next_item().await? {
            matched += 1;
            last = Some(item);
        }
        if matched > 1 {
            log::debug!(
                "Index '{}' on '{}' matched {} rows for {}; keeping the last",
                index_name,
                self.table_name(),
                matched,
                describe_key(key)
            );
        }

        match last {
            Some(item) => decode(item),
            None => Ok(E::default()),
        }
    }

    /// Loads an entity by id with eventual consistency.
    async fn get_by_id(&self, id: &str) -> Result<E> {
        let key = Item::from([(self.table().key.hash_key.clone(), AttributeValue::from(id))]);
        self.get(&key, None, ReadConsistency::Eventual).await
    }

    /// Upserts the whole entity.
    ///
    /// Sets `updated_at` (strictly later than its previous value), defaults
    /// `created_at`, writes, and merges the persisted item back into `entity`.
    async fn save(&self, entity: &mut E) -> Result<()> {
        let now = now_millis();
        {
            let meta = entity.meta_mut();
            if meta.created_at == 0 {
                meta.created_at = now;
            }
            meta.updated_at = now.max(meta.updated_at.saturating_add(1));
        }
        entity.apply_defaults(now);

        let mut item = to_item(&*entity)?;
        let stored = self
            .backend()
            .put_item(self.table_name(), item.clone())
            .await?;
        item.extend(stored);
        *entity = decode(item)?;
        Ok(())
    }

    /// Marks the entity deleted and saves it. The row stays readable.
    async fn soft_delete(&self, entity: &mut E, reason: Option<String>) -> Result<()> {
        {
            let meta = entity.meta_mut();
            meta.deleted_at = Some(now_millis());
            meta.deleted_reason = reason;
        }
        self.save(entity).await
    }

    /// Clears the soft-delete attributes and saves.
    async fn restore(&self, entity: &mut E) -> Result<()> {
        {
            let meta = entity.meta_mut();
            meta.deleted_at = None;
            meta.deleted_reason = None;
        }
        self.save(entity).await
    }

    /// Physically removes the entity's row.
    async fn hard_delete(&self, entity: E) -> Result<()> {
        let key = self.table().key.key_of(&to_item(&entity)?)?;
        self.backend().delete_item(self.table_name(), &key).await?;
        log::debug!("Purged '{}' from '{}'", entity.id(), self.table_name());
        Ok(())
    }
}

fn describe_key(key: &Item) -> String {
    key.iter()
        .map(|(k, v)| format!("{}={}", k, v.to_json()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Default [`EntityStore`] over one table.
pub struct EntityTable<E> {
    backend: Arc<dyn DocumentStore>,
    table: TableDefinition,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> EntityTable<E> {
    /// Wraps an already declared table.
    pub fn new(backend: Arc<dyn DocumentStore>, table: TableDefinition) -> Self {
        Self {
            backend,
            table,
            _entity: PhantomData,
        }
    }

    /// Declares the table on the store, then wraps it.
    pub async fn create(
        backend: Arc<dyn DocumentStore>,
        table: TableDefinition,
    ) -> std::result::Result<Self, StorageError> {
        backend.create_table(table.clone()).await?;
        Ok(Self::new(backend, table))
    }
}

impl<E: Entity> EntityStore<E> for EntityTable<E> {
    fn backend(&self) -> &Arc<dyn DocumentStore> {
        &self.backend
    }

    fn table(&self) -> &TableDefinition {
        &self.table
    }
}
