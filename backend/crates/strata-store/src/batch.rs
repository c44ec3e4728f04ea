//! Batch mutation engine.
//!
//! Turns a list of items into one batch write request against a table and
//! pauses briefly after every call so bulk jobs stay under provisioned
//! throughput.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use strata_store::batch::{do_batch_op, BatchOperation};
//!
//! // delete up to 25 rows keyed by "id"
//! let count = do_batch_op(store.as_ref(), BatchOperation::Delete, rows, "users", Some("id")).await?;
//! ```

use crate::storage_trait::{
    BatchWriteInput, DocumentStore, Result, StorageError, WriteRequest, MAX_BATCH_WRITE_ITEMS,
};
use std::fmt;
use std::time::Duration;
use strata_commons::Item;

/// Pause after every batch call.
pub const BATCH_PAUSE: Duration = Duration::from_millis(10);

/// Kind of batch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperation {
    /// No write; the driver only reports progress
    Read,
    Put,
    Delete,
}

impl fmt::Display for BatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOperation::Read => write!(f, "read"),
            BatchOperation::Put => write!(f, "put"),
            BatchOperation::Delete => write!(f, "delete"),
        }
    }
}

/// Builds the write requests for one batch.
///
/// Deletes need `key_name`; every item must carry that attribute.
pub fn build_requests(
    operation: BatchOperation,
    items: Vec<Item>,
    key_name: Option<&str>,
) -> Result<Vec<WriteRequest>> {
    match operation {
        BatchOperation::Read => Ok(Vec::new()),
        BatchOperation::Put => Ok(items
            .into_iter()
            .map(|item| WriteRequest::Put { item })
            .collect()),
        BatchOperation::Delete => {
            let key_name = key_name.ok_or_else(|| {
                StorageError::Validation("delete batches require a key attribute name".to_string())
            })?;
            items
                .into_iter()
                .map(|item| {
                    let value = item.get(key_name).cloned().ok_or_else(|| {
                        StorageError::Validation(format!(
                            "item is missing key attribute '{}'",
                            key_name
                        ))
                    })?;
                    Ok(WriteRequest::Delete {
                        key: Item::from([(key_name.to_string(), value)]),
                    })
                })
                .collect()
        }
    }
}

/// Applies one batch of at most [`MAX_BATCH_WRITE_ITEMS`] items.
///
/// Issues a single batch write for `Put`/`Delete` and nothing for `Read`, then
/// waits [`BATCH_PAUSE`]. Returns the number of input items. Failures from the
/// store propagate unchanged; nothing is retried.
pub async fn do_batch_op(
    client: &dyn DocumentStore,
    operation: BatchOperation,
    items: Vec<Item>,
    table_name: &str,
    key_name: Option<&str>,
) -> Result<usize> {
    let count = items.len();
    if operation != BatchOperation::Read && count > 0 {
        let requests = build_requests(operation, items, key_name)?;
        client
            .batch_write(BatchWriteInput {
                table_name: table_name.to_string(),
                requests,
            })
            .await?;
        log::trace!("Batch {} of {} item(s) on '{}'", operation, count, table_name);
    }
    tokio::time::sleep(BATCH_PAUSE).await;
    Ok(count)
}

/// Applies any number of items in chunks of [`MAX_BATCH_WRITE_ITEMS`].
///
/// Returns the total number of items processed. Stops at the first failed chunk.
pub async fn write_all(
    client: &dyn DocumentStore,
    operation: BatchOperation,
    items: Vec<Item>,
    table_name: &str,
    key_name: Option<&str>,
) -> Result<usize> {
    let mut total = 0;
    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        let chunk: Vec<Item> = items.by_ref().take(MAX_BATCH_WRITE_ITEMS).collect();
        total += do_batch_op(client, operation, chunk, table_name, key_name).await?;
    }
    Ok(total)
}
