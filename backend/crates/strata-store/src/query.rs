//! Key-equality queries.
//!
//! [`KeyQuery`] describes an equality lookup on a hash key and optionally a
//! range key, against the table or one of its secondary indexes. [`run_query`]
//! fetches one page of at most [`QUERY_PAGE_LIMIT`] rows; [`QueryPaginator`]
//! follows cursors across pages.

use crate::pager::{PageRequest, Pager};
use crate::storage_trait::{DocumentStore, Page, QueryInput, ReadConsistency, Result};
use futures_util::stream::{self, Stream};
use std::sync::Arc;
use strata_commons::{AttributeValue, Cursor, Item};

/// Maximum rows requested per query page.
pub const QUERY_PAGE_LIMIT: usize = 300;

const HASH_PLACEHOLDER: &str = ":pkey";
const RANGE_PLACEHOLDER: &str = ":skey";

/// An equality lookup by key.
///
/// A range value of `None` or [`AttributeValue::Null`] leaves the range key
/// unconstrained.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyQuery {
    pub table_name: String,
    pub hash_field: String,
    pub hash_value: AttributeValue,
    pub range_field: Option<String>,
    pub range_value: Option<AttributeValue>,
    pub index_name: Option<String>,
    pub exclusive_start_key: Option<Cursor>,
    pub consistency: ReadConsistency,
}

impl KeyQuery {
    pub fn new(
        table_name: impl Into<String>,
        hash_field: impl Into<String>,
        hash_value: impl Into<AttributeValue>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            hash_field: hash_field.into(),
            hash_value: hash_value.into(),
            range_field: None,
            range_value: None,
            index_name: None,
            exclusive_start_key: None,
            consistency: ReadConsistency::Eventual,
        }
    }

    pub fn range(mut self, field: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.range_field = Some(field.into());
        self.range_value = Some(value.into());
        self
    }

    pub fn index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
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

    /// Builds the store request for this query.
    pub fn to_input(&self) -> QueryInput {
        let mut expression = format!("{} = {}", self.hash_field, HASH_PLACEHOLDER);
        let mut values = Item::from([(HASH_PLACEHOLDER.to_string(), self.hash_value.clone())]);

        let range = match (&self.range_field, &self.range_value) {
            (Some(field), Some(value)) if !value.is_null() => Some((field, value)),
            _ => None,
        };
        if let Some((field, value)) = range {
            expression.push_str(&format!(" and {} = {}", field, RANGE_PLACEHOLDER));
            values.insert(RANGE_PLACEHOLDER.to_string(), value.clone());
        }

        QueryInput {
            table_name: self.table_name.clone(),
            index_name: self.index_name.clone(),
            key_condition_expression: expression,
            expression_attribute_values: values,
            limit: Some(QUERY_PAGE_LIMIT),
            exclusive_start_key: self.exclusive_start_key.clone(),
            consistency: self.consistency,
        }
    }
}

/// Fetches one page of a key query.
///
/// The returned page carries a cursor when more rows remain; store errors
/// propagate unchanged.
pub async fn run_query(client: &dyn DocumentStore, query: &KeyQuery) -> Result<Page> {
    client.query(query.to_input()).await
}

/// Follows a key query across all pages.
pub struct QueryPaginator {
    pager: Pager,
}

impl QueryPaginator {
    pub fn new(client: Arc<dyn DocumentStore>, query: &KeyQuery) -> Self {
        Self {
            pager: Pager::new(client, PageRequest::Query(query.to_input())),
        }
    }

    pub async fn next_item(&mut self) -> Result<Option<Item>> {
        self.pager.next_item().await
    }

    pub fn last_evaluated_key(&self) -> Option<&Cursor> {
        self.pager.last_evaluated_key()
    }

    pub async fn collect_all(mut self) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        while let Some(item) = self.next_item().await? {
            items.push(item);
        }
        Ok(items)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Item>> + Send {
        stream::try_unfold(self, |mut iter| async move {
            Ok(iter.next_item().await?.map(|item| (item, iter)))
        })
    }
}
