//! Page evaluation shared by the bundled stores.
//!
//! Both stores keep rows ordered by encoded primary key and hand this module an
//! iterator over them; query and scan semantics live here once.

use crate::expression::{values_equal, Condition, Expression};
use crate::storage_trait::{
    BatchWriteInput, Page, QueryInput, Result, ScanInput, StorageError, WriteRequest,
    MAX_BATCH_WRITE_ITEMS,
};
use crate::table::{compare_key_values, KeySchema, TableDefinition};
use std::cmp::Ordering;
use std::collections::HashSet;
use strata_commons::{AttributeValue, Cursor, Item};

/// Equality values extracted from a key condition.
struct KeyMatch {
    hash: AttributeValue,
    range: Option<AttributeValue>,
}

fn key_match(schema: &KeySchema, input: &QueryInput) -> Result<KeyMatch> {
    let expression = Expression::parse(&input.key_condition_expression)?;
    let mut hash = None;
    let mut range = None;

    for condition in expression.conditions() {
        let Condition::Equals { path, placeholder } = condition else {
            return Err(StorageError::Validation(
                "key conditions support only equality".to_string(),
            ));
        };
        let value = input
            .expression_attribute_values
            .get(placeholder)
            .cloned()
            .ok_or_else(|| {
                StorageError::Validation(format!(
                    "no value supplied for placeholder '{}'",
                    placeholder
                ))
            })?;

        if *path == schema.hash_key && hash.is_none() {
            hash = Some(value);
        } else if Some(path.as_str()) == schema.range_key.as_deref() && range.is_none() {
            range = Some(value);
        } else {
            return Err(StorageError::Validation(format!(
                "'{}' is not a key attribute of this table or index",
                path
            )));
        }
    }

    let hash = hash.ok_or_else(|| {
        StorageError::Validation(format!(
            "key condition must constrain hash key '{}'",
            schema.hash_key
        ))
    })?;
    Ok(KeyMatch { hash, range })
}

/// Sort order within a query: range key, then table key.
fn compare_rows(definition: &TableDefinition, schema: &KeySchema, a: &Item, b: &Item) -> Ordering {
    let by_range = match schema.range_key.as_deref() {
        Some(range) => compare_key_values(a.get(range), b.get(range)),
        None => Ordering::Equal,
    };
    by_range.then_with(|| {
        definition
            .key
            .attributes()
            .map(|attr| compare_key_values(a.get(attr), b.get(attr)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

fn page_limit(limit: Option<usize>) -> Result<usize> {
    match limit {
        Some(0) => Err(StorageError::Validation("limit must be positive".to_string())),
        Some(n) => Ok(n),
        None => Ok(usize::MAX),
    }
}

/// Evaluates one query page over `rows`.
pub(crate) fn query_page<'a>(
    definition: &TableDefinition,
    rows: impl Iterator<Item = &'a Item>,
    input: &QueryInput,
) -> Result<Page> {
    let index_name = input.index_name.as_deref();
    let schema = definition.key_for(index_name)?;
    let key = key_match(schema, input)?;
    let limit = page_limit(input.limit)?;

    let mut matches: Vec<&Item> = rows
        .filter(|row| values_equal(row.get(&schema.hash_key), Some(&key.hash)))
        .filter(|row| match (&key.range, schema.range_key.as_deref()) {
            (Some(value), Some(range)) => values_equal(row.get(range), Some(value)),
            _ => true,
        })
        .collect();
    matches.sort_by(|a, b| compare_rows(definition, schema, a, b));

    let start = match &input.exclusive_start_key {
        Some(cursor) => matches
            .iter()
            .position(|row| compare_rows(definition, schema, row, cursor.as_item()).is_gt())
            .unwrap_or(matches.len()),
        None => 0,
    };

    let remaining = &matches[start..];
    let taken: Vec<Item> = remaining.iter().take(limit).map(|row| (*row).clone()).collect();

    let last_evaluated_key = if remaining.len() > taken.len() {
        match taken.last() {
            Some(last) => Some(Cursor::new(definition.cursor_key(last, index_name)?)),
            None => None,
        }
    } else {
        None
    };

    Ok(Page {
        items: taken,
        last_evaluated_key,
    })
}

/// Evaluates one scan page over `rows`, which must be ordered by encoded key.
///
/// The limit bounds rows evaluated, not rows returned, so a filtered page may
/// come back empty while still carrying a cursor.
pub(crate) fn scan_page<'a>(
    definition: &TableDefinition,
    rows: impl Iterator<Item = (&'a String, &'a Item)>,
    input: &ScanInput,
) -> Result<Page> {
    let filter = input
        .filter_expression
        .as_deref()
        .map(Expression::parse)
        .transpose()?;
    let limit = page_limit(input.limit)?;
    let start_after = input
        .exclusive_start_key
        .as_ref()
        .map(|cursor| definition.key.encode(cursor.as_item()))
        .transpose()?;

    let mut rows = rows
        .filter(|(encoded, _)| match &start_after {
            Some(start) => encoded.as_str() > start.as_str(),
            None => true,
        })
        .peekable();

    let mut items = Vec::new();
    let mut evaluated = 0usize;
    let mut last_row: Option<&Item> = None;

    while evaluated < limit {
        let Some((_, row)) = rows.next() else { break };
        evaluated += 1;
        last_row = Some(row);
        let keep = match &filter {
            Some(expr) => expr.matches(row, &input.expression_attribute_values)?,
            None => true,
        };
        if keep {
            items.push(row.clone());
        }
    }

    let last_evaluated_key = match (rows.peek(), last_row) {
        (Some(_), Some(last)) => Some(Cursor::new(definition.key.key_of(last)?)),
        _ => None,
    };

    Ok(Page {
        items,
        last_evaluated_key,
    })
}

/// Validated form of a batch write: each request resolved to its encoded key.
pub(crate) enum ResolvedWrite {
    Put { encoded: String, item: Item },
    Delete { encoded: String },
}

/// Checks a batch against the store limits and resolves every key.
///
/// Rejects empty batches, batches over [`MAX_BATCH_WRITE_ITEMS`] and batches
/// that touch the same key twice.
pub(crate) fn resolve_batch(
    definition: &TableDefinition,
    input: BatchWriteInput,
) -> Result<Vec<ResolvedWrite>> {
    if input.requests.is_empty() {
        return Err(StorageError::Validation(
            "batch write requires at least one request".to_string(),
        ));
    }
    if input.requests.len() > MAX_BATCH_WRITE_ITEMS {
        return Err(StorageError::Validation(format!(
            "batch write accepts at most {} requests, got {}",
            MAX_BATCH_WRITE_ITEMS,
            input.requests.len()
        )));
    }

    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(input.requests.len());
    for request in input.requests {
        let write = match request {
            WriteRequest::Put { item } => {
                definition.key.key_of(&item)?;
                ResolvedWrite::Put {
                    encoded: definition.key.encode(&item)?,
                    item: to_wire(item),
                }
            }
            WriteRequest::Delete { key } => ResolvedWrite::Delete {
                encoded: definition.key.encode(&key)?,
            },
        };
        let encoded = match &write {
            ResolvedWrite::Put { encoded, .. } | ResolvedWrite::Delete { encoded } => encoded,
        };
        if !seen.insert(encoded.clone()) {
            return Err(StorageError::Validation(
                "batch write contains duplicate keys".to_string(),
            ));
        }
        resolved.push(write);
    }
    Ok(resolved)
}

/// Boxes every number in an item, as a store does when persisting it.
pub(crate) fn to_wire(item: Item) -> Item {
    item.into_iter().map(|(k, v)| (k, v.into_wire())).collect()
}
