//! # strata-store
//!
//! Data access over a managed key-value document store.
//!
//! ## Architecture
//!
//! ```text
//! EntityStore<E>  /  run_ops_on_item_set (typed records, bulk mutation)
//!     ↓
//! KeyQuery / ScanIterator / do_batch_op (pagination, capped batches)
//!     ↓
//! DocumentStore (storage_trait.rs)
//!     ↓
//! InMemoryStore / RocksDbStore
//! ```
//!
//! ## Store Limits
//!
//! - Batch writes carry at most 25 requests ([`MAX_BATCH_WRITE_ITEMS`])
//! - Query pages are capped at 300 rows ([`query::QUERY_PAGE_LIMIT`])
//! - Scan page limits apply before filtering, so pages may be empty yet carry a cursor

pub mod batch;
pub mod entity_store;
pub mod expression;
pub mod memory_impl;
pub mod mutation_driver;
mod pager;
mod paging;
pub mod query;
#[cfg(feature = "rocksdb")]
pub mod rocksdb_impl;
pub mod scan;
pub mod storage_trait;
pub mod table;

pub use batch::{do_batch_op, write_all, BatchOperation};
pub use entity_store::{Entity, EntityError, EntityMeta, EntityStore, EntityTable};
pub use memory_impl::InMemoryStore;
pub use mutation_driver::{
    run_ops_on_item_set, run_ops_with_sink, LogProgress, MutationDecision, MutationProgress,
    ProgressSink,
};
pub use query::{run_query, KeyQuery, QueryPaginator};
#[cfg(feature = "rocksdb")]
pub use rocksdb_impl::RocksDbStore;
pub use scan::{ScanIterator, ScanParams};
pub use storage_trait::{
    BatchWriteInput, DocumentStore, Page, QueryInput, ReadConsistency, ScanInput, StorageError,
    WriteRequest, MAX_BATCH_WRITE_ITEMS,
};
pub use table::{IndexDefinition, KeySchema, TableDefinition};

// Make test_utils available for testing in dependent crates
pub mod test_utils;
