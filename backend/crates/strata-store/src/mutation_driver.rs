//! Mutation driver.
//!
//! Streams items from any source, runs each through an async transform, buffers
//! the changed ones and flushes them through [`do_batch_op`] in batches of
//! [`MAX_BATCH_WRITE_ITEMS`]. Flushes happen strictly one after another, and a
//! failing read, transform or flush stops the run with that error.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use strata_store::mutation_driver::{run_ops_on_item_set, MutationDecision};
//! use strata_store::{BatchOperation, ScanIterator, ScanParams};
//!
//! let rows = ScanIterator::new(store.clone(), ScanParams::new("users")).into_stream();
//! run_ops_on_item_set(
//!     store.as_ref(),
//!     BatchOperation::Put,
//!     |mut item| async move {
//!         item.insert("touched".into(), true.into());
//!         Ok::<_, StorageError>(MutationDecision::changed(item))
//!     },
//!     rows,
//!     "users",
//!     None,
//!     false,
//! )
//! .await?;
//! ```

use crate::batch::{do_batch_op, BatchOperation};
use crate::storage_trait::{DocumentStore, StorageError, MAX_BATCH_WRITE_ITEMS};
use futures_util::{pin_mut, Stream, StreamExt};
use std::future::Future;
use strata_commons::Item;

/// Outcome of transforming one item.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationDecision {
    /// Whether `payload` should be written
    pub changed: bool,
    pub payload: Item,
}

impl MutationDecision {
    pub fn changed(payload: Item) -> Self {
        Self {
            changed: true,
            payload,
        }
    }

    pub fn unchanged(payload: Item) -> Self {
        Self {
            changed: false,
            payload,
        }
    }
}

/// Running totals of a mutation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationProgress {
    pub read: usize,
    pub written: usize,
}

/// Receives progress after every flush.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: MutationProgress);
}

/// Progress sink that writes to the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, progress: MutationProgress) {
        log::info!(
            "{} records read; {} records written",
            progress.read,
            progress.written
        );
    }
}

/// Runs `transform` over every item of `source` and batch-writes the changed
/// ones to `table_name`.
///
/// Progress goes to [`LogProgress`] unless `quiet` is set. Returns the final
/// totals.
pub async fn run_ops_on_item_set<S, F, Fut, E>(
    client: &dyn DocumentStore,
    operation: BatchOperation,
    transform: F,
    source: S,
    table_name: &str,
    key_name: Option<&str>,
    quiet: bool,
) -> Result<MutationProgress, E>
where
    S: Stream<Item = Result<Item, StorageError>>,
    F: FnMut(Item) -> Fut,
    Fut: Future<Output = Result<MutationDecision, E>>,
    E: From<StorageError>,
{
    let sink = LogProgress;
    let sink: Option<&dyn ProgressSink> = if quiet { None } else { Some(&sink) };
    run_ops_with_sink(client, operation, transform, source, table_name, key_name, sink).await
}

/// Same as [`run_ops_on_item_set`] with an explicit progress sink.
pub async fn run_ops_with_sink<S, F, Fut, E>(
    client: &dyn DocumentStore,
    operation: BatchOperation,
    mut transform: F,
    source: S,
    table_name: &str,
    key_name: Option<&str>,
    sink: Option<&dyn ProgressSink>,
) -> Result<MutationProgress, E>
where
    S: Stream<Item = Result<Item, StorageError>>,
    F: FnMut(Item) -> Fut,
    Fut: Future<Output = Result<MutationDecision, E>>,
    E: From<StorageError>,
{
    pin_mut!(source);
    let mut buffer: Vec<Item> = Vec::with_capacity(MAX_BATCH_WRITE_ITEMS);
    let mut progress = MutationProgress::default();

    while let Some(item) = source.next().await {
        let item = item?;
        progress.read += 1;

        let decision = transform(item).await?;
        if decision.changed {
            buffer.push(decision.payload);
        }

        if buffer.len() >= MAX_BATCH_WRITE_ITEMS {
            let batch = std::mem::take(&mut buffer);
            progress.written += do_batch_op(client, operation, batch, table_name, key_name).await?;
            if let Some(sink) = sink {
                sink.report(progress);
            }
        }
    }

    if !buffer.is_empty() {
        progress.written += do_batch_op(client, operation, buffer, table_name, key_name).await?;
        if let Some(sink) = sink {
            sink.report(progress);
        }
    }

    log::debug!(
        "Mutation run on '{}' finished: {} read, {} written",
        table_name,
        progress.read,
        progress.written
    );
    Ok(progress)
}
