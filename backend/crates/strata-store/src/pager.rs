//! Item-at-a-time view over page-oriented reads.

use crate::storage_trait::{DocumentStore, Page, QueryInput, Result, ScanInput};
use std::collections::VecDeque;
use std::sync::Arc;
use strata_commons::{Cursor, Item};

#[derive(Debug, Clone)]
pub(crate) enum PageRequest {
    Scan(ScanInput),
    Query(QueryInput),
}

impl PageRequest {
    async fn fetch(&self, client: &dyn DocumentStore) -> Result<Page> {
        match self {
            PageRequest::Scan(input) => client.scan(input.clone()).await,
            PageRequest::Query(input) => client.query(input.clone()).await,
        }
    }

    fn resume_from(&mut self, cursor: Option<Cursor>) {
        match self {
            PageRequest::Scan(input) => input.exclusive_start_key = cursor,
            PageRequest::Query(input) => input.exclusive_start_key = cursor,
        }
    }
}

/// Buffers one page at a time and fetches the next when drained.
///
/// Pages that come back empty but still carry a cursor are skipped, so a
/// caller never sees a premature end of iteration.
pub(crate) struct Pager {
    client: Arc<dyn DocumentStore>,
    request: PageRequest,
    buffer: VecDeque<Item>,
    last_evaluated_key: Option<Cursor>,
    pages_fetched: usize,
    exhausted: bool,
}

impl Pager {
    pub(crate) fn new(client: Arc<dyn DocumentStore>, request: PageRequest) -> Self {
        Self {
            client,
            request,
            buffer: VecDeque::new(),
            last_evaluated_key: None,
            pages_fetched: 0,
            exhausted: false,
        }
    }

    pub(crate) async fn next_item(&mut self) -> Result<Option<Item>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some(item));
            }
            if self.exhausted {
                return Ok(None);
            }

            let page = self.request.fetch(self.client.as_ref()).await?;
            self.pages_fetched += 1;
            self.buffer.extend(page.items);
            self.last_evaluated_key = page.last_evaluated_key.clone();
            match page.last_evaluated_key {
                Some(cursor) => self.request.resume_from(Some(cursor)),
                None => self.exhausted = true,
            }
        }
    }

    pub(crate) fn last_evaluated_key(&self) -> Option<&Cursor> {
        self.last_evaluated_key.as_ref()
    }

    pub(crate) fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}
