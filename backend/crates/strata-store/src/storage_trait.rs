//! Document store abstraction.
//!
//! This module defines the narrow interface the rest of Strata consumes from a
//! managed key-value store: single-item get/put/delete, page-oriented query and
//! scan, and capped batch writes.
//!
//! ## Data Model
//!
//! - **Table**: a named collection declared with a [`TableDefinition`] (hash key,
//!   optional range key, optional secondary indexes)
//! - **Item**: one record, an attribute map
//! - **Page**: the items of one request plus a [`Cursor`] when more remain
//!
//! ## Implementing a Custom Store
//!
//! ```rust,ignore
//! use strata_store::storage_trait::{DocumentStore, Result};
//!
//! pub struct MyStore { /* connection */ }
//!
//! #[async_trait::async_trait]
//! impl DocumentStore for MyStore {
//!     async fn get_item(&self, table: &str, key: &Item, consistency: ReadConsistency)
//!         -> Result<Option<Item>> {
//!         todo!()
//!     }
//!     // ... implement the other required methods
//! }
//! ```

use crate::table::TableDefinition;
use std::fmt;
use strata_commons::{Cursor, Item};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Maximum number of write requests a store accepts in one batch call.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Table was never declared
    TableNotFound(String),

    /// Malformed request (bad key, bad expression, oversized batch)
    Validation(String),

    /// Request rate exceeded
    Throttled(String),

    /// Generic I/O error from underlying storage
    IoError(String),

    /// Serialization/deserialization error
    SerializationError(String),

    /// Operation not supported by this store
    Unsupported(String),

    /// Lock poisoning error (internal concurrency issue)
    LockPoisoned(String),

    /// Other errors
    Other(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::TableNotFound(t) => write!(f, "Table not found: {}", t),
            StorageError::Validation(msg) => write!(f, "Validation error: {}", msg),
            StorageError::Throttled(msg) => write!(f, "Throttled: {}", msg),
            StorageError::IoError(msg) => write!(f, "I/O error: {}", msg),
            StorageError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            StorageError::Unsupported(msg) => write!(f, "Unsupported operation: {}", msg),
            StorageError::LockPoisoned(msg) => write!(f, "Lock poisoned: {}", msg),
            StorageError::Other(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<strata_commons::CommonError> for StorageError {
    fn from(err: strata_commons::CommonError) -> Self {
        match err {
            strata_commons::CommonError::InvalidInput(msg) => StorageError::Validation(msg),
            strata_commons::CommonError::Serialization(msg) => StorageError::SerializationError(msg),
        }
    }
}

/// Read consistency requested for a lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadConsistency {
    /// May miss the most recent writes; cheaper and the default
    #[default]
    Eventual,
    /// Observes every write acknowledged before the read
    Strong,
}

impl ReadConsistency {
    pub fn from_strong(strong: bool) -> Self {
        if strong {
            ReadConsistency::Strong
        } else {
            ReadConsistency::Eventual
        }
    }
}

/// A single page-oriented query request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryInput {
    pub table_name: String,
    /// Secondary index to query instead of the table's own key
    pub index_name: Option<String>,
    /// Equality conditions on the hash key and optionally the range key,
    /// e.g. `id = :pkey and sort = :skey`
    pub key_condition_expression: String,
    /// Values for the `:placeholder`s in the expression
    pub expression_attribute_values: Item,
    /// Maximum number of rows evaluated for this page
    pub limit: Option<usize>,
    pub exclusive_start_key: Option<Cursor>,
    pub consistency: ReadConsistency,
}

/// A single page-oriented full-table scan request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanInput {
    pub table_name: String,
    /// Conditions a row must satisfy to be returned, e.g. `attribute_exists(clients)`
    pub filter_expression: Option<String>,
    pub expression_attribute_values: Item,
    /// Maximum number of rows evaluated (before filtering) for this page
    pub limit: Option<usize>,
    pub exclusive_start_key: Option<Cursor>,
    pub consistency: ReadConsistency,
}

/// One page of results.
///
/// `last_evaluated_key` is present only when more rows remain; its absence means
/// the read is exhausted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Cursor>,
}

/// Represents a single request in a batch write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    /// Insert or replace an item
    Put { item: Item },

    /// Delete the item with this key
    Delete { key: Item },
}

/// A batch write against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchWriteInput {
    pub table_name: String,
    /// At most [`MAX_BATCH_WRITE_ITEMS`] requests
    pub requests: Vec<WriteRequest>,
}

/// Trait for pluggable document store implementations.
///
/// Implementations must be thread-safe (Send + Sync); they are shared behind
/// `Arc<dyn DocumentStore>`.
///
/// ## Error Handling
///
/// Implementations should:
/// - Return `TableNotFound` for undeclared tables
/// - Return `Validation` for malformed keys, expressions or batches
/// - Return `IoError` for underlying storage failures
///
/// Numbers in returned items are boxed, as a provider's wire format returns them.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Declares a table. Declaring an existing table again is a no-op.
    async fn create_table(&self, definition: TableDefinition) -> Result<()>;

    /// Returns the definition of a declared table.
    async fn describe_table(&self, table: &str) -> Result<TableDefinition>;

    /// Retrieves an item by its primary key.
    ///
    /// Returns `Ok(None)` if no item has this key.
    async fn get_item(
        &self,
        table: &str,
        key: &Item,
        consistency: ReadConsistency,
    ) -> Result<Option<Item>>;

    /// Stores an item, replacing any item with the same primary key.
    ///
    /// Returns the item as persisted.
    async fn put_item(&self, table: &str, item: Item) -> Result<Item>;

    /// Deletes an item by its primary key.
    ///
    /// Returns `Ok(())` even if the key doesn't exist (idempotent).
    async fn delete_item(&self, table: &str, key: &Item) -> Result<()>;

    /// Reads one page of rows matching a key condition.
    async fn query(&self, input: QueryInput) -> Result<Page>;

    /// Reads one page of a full-table scan.
    async fn scan(&self, input: ScanInput) -> Result<Page>;

    /// Applies up to [`MAX_BATCH_WRITE_ITEMS`] put/delete requests.
    async fn batch_write(&self, input: BatchWriteInput) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_commons::CommonError;

    #[test]
    fn test_error_display() {
        let err = StorageError::TableNotFound("users".to_string());
        assert_eq!(err.to_string(), "Table not found: users");

        let err = StorageError::IoError("disk full".to_string());
        assert_eq!(err.to_string(), "I/O error: disk full");
    }

    #[test]
    fn test_common_error_conversion() {
        let err: StorageError = CommonError::invalid_input("bad key").into();
        assert_eq!(err, StorageError::Validation("bad key".to_string()));
    }

    #[test]
    fn test_read_consistency_from_flag() {
        assert_eq!(ReadConsistency::from_strong(true), ReadConsistency::Strong);
        assert_eq!(ReadConsistency::from_strong(false), ReadConsistency::Eventual);
        assert_eq!(ReadConsistency::default(), ReadConsistency::Eventual);
    }
}
