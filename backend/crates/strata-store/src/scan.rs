//! Auto-paginating scan.
//!
//! [`ScanIterator`] walks every row of a table (optionally filtered) one item at
//! a time, following cursors until the store reports no more rows.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use strata_store::scan::{ScanIterator, ScanParams};
//!
//! let params = ScanParams::new("users").filter("attribute_exists(clients)");
//! let mut rows = ScanIterator::new(store.clone(), params);
//! while let Some(row) = rows.next_item().await? {
//!     // ...
//! }
//! ```

use crate::pager::{PageRequest, Pager};
use crate::storage_trait::{DocumentStore, ReadConsistency, Result, ScanInput};
use futures_util::stream::{self, Stream};
use std::sync::Arc;
use strata_commons::{AttributeValue, Cursor, Item};

/// Parameters of a full-table scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanParams {
    pub table_name: String,
    pub filter_expression: Option<String>,
    pub expression_attribute_values: Item,
    /// Rows evaluated per request; the store default when unset
    pub page_size: Option<usize>,
    /// Resume after this cursor instead of the start of the table
    pub exclusive_start_key: Option<Cursor>,
    pub consistency: ReadConsistency,
}

impl ScanParams {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filter_expression = Some(expression.into());
        self
    }

    pub fn value(mut self, placeholder: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.expression_attribute_values
            .insert(placeholder.into(), value.into());
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn start_after(mut self, cursor: Option<Cursor>) -> Self {
        self.exclusive_start_key = cursor;
        self
    }

    pub fn consistency(mut self, consistency: ReadConsistency) -> Self {
        self.consistency = consistency;
        self
    }

    fn into_input(self) -> ScanInput {
        ScanInput {
            table_name: self.table_name,
            filter_expression: self.filter_expression,
            expression_attribute_values: self.expression_attribute_values,
            limit: self.page_size,
            exclusive_start_key: self.exclusive_start_key,
            consistency: self.consistency,
        }
    }
}

/// Lazy, resumable sequence of scanned rows.
///
/// Not restartable: once exhausted it stays exhausted. To resume later, persist
/// [`last_evaluated_key`](Self::last_evaluated_key) and build a new iterator
/// with [`ScanParams::start_after`].
pub struct ScanIterator {
    pager: Pager,
}

impl ScanIterator {
    pub fn new(client: Arc<dyn DocumentStore>, params: ScanParams) -> Self {
        Self {
            pager: Pager::new(client, PageRequest::Scan(params.into_input())),
        }
    }

    /// Returns the next row, fetching pages as needed. `Ok(None)` at the end.
    pub async fn next_item(&mut self) -> Result<Option<Item>> {
        self.pager.next_item().await
    }

    /// Cursor returned with the most recently fetched page.
    ///
    /// Resuming from it continues after that page.
    pub fn last_evaluated_key(&self) -> Option<&Cursor> {
        self.pager.last_evaluated_key()
    }

    pub fn pages_fetched(&self) -> usize {
        self.pager.pages_fetched()
    }

    /// Drains the iterator into a vector.
    pub async fn collect_all(mut self) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        while let Some(item) = self.next_item().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Converts the iterator into a `Stream`, ending after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Item>> + Send {
        stream::try_unfold(self, |mut iter| async move {
            Ok(iter.next_item().await?.map(|item| (item, iter)))
        })
    }
}
