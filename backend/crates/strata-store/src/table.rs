//! Table and index declarations.
//!
//! A table is keyed by a hash attribute and an optional range attribute.
//! Secondary indexes re-key the same rows by other attributes; a row that lacks
//! an index's hash attribute is simply absent from that index.

use crate::storage_trait::{Result, StorageError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strata_commons::{AttributeValue, Item};

/// Separator between hash and range text in an encoded key.
const KEY_SEPARATOR: char = '\u{1f}';

/// Hash attribute plus optional range attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySchema {
    pub hash_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_key: Option<String>,
}

impl KeySchema {
    pub fn new(hash_key: impl Into<String>) -> Self {
        Self {
            hash_key: hash_key.into(),
            range_key: None,
        }
    }

    pub fn with_range_key(mut self, range_key: impl Into<String>) -> Self {
        self.range_key = Some(range_key.into());
        self
    }

    /// Attribute names making up this key, hash first.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.hash_key.as_str()).chain(self.range_key.as_deref())
    }

    /// Extracts the key attributes from `item`.
    ///
    /// Fails when a key attribute is missing or is not a string or number.
    pub fn key_of(&self, item: &Item) -> Result<Item> {
        let mut key = Item::new();
        for attribute in self.attributes() {
            let value = item.get(attribute).ok_or_else(|| {
                StorageError::Validation(format!("missing key attribute '{}'", attribute))
            })?;
            if value.key_text().is_none() {
                return Err(StorageError::Validation(format!(
                    "key attribute '{}' must be a string or number",
                    attribute
                )));
            }
            key.insert(attribute.to_string(), value.clone());
        }
        Ok(key)
    }

    /// Like [`key_of`](Self::key_of) but returns `None` instead of failing.
    pub fn try_key_of(&self, item: &Item) -> Option<Item> {
        self.key_of(item).ok()
    }

    /// Encodes the key of `item` into a string that sorts like the key.
    pub fn encode(&self, item: &Item) -> Result<String> {
        let mut encoded = String::new();
        for (i, attribute) in self.attributes().enumerate() {
            if i > 0 {
                encoded.push(KEY_SEPARATOR);
            }
            let text = item
                .get(attribute)
                .and_then(AttributeValue::key_text)
                .ok_or_else(|| {
                    StorageError::Validation(format!("missing key attribute '{}'", attribute))
                })?;
            encoded.push_str(&text);
        }
        Ok(encoded)
    }
}

/// A named secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDefinition {
    pub name: String,
    #[serde(flatten)]
    pub key: KeySchema,
}

impl IndexDefinition {
    pub fn new(name: impl Into<String>, hash_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: KeySchema::new(hash_key),
        }
    }

    pub fn with_range_key(mut self, range_key: impl Into<String>) -> Self {
        self.key = self.key.with_range_key(range_key);
        self
    }
}

/// Declaration of a table.
///
/// ```rust
/// use strata_store::table::{IndexDefinition, TableDefinition};
///
/// let table = TableDefinition::new("userIdentifiers", "id")
///     .with_index(IndexDefinition::new("byUser", "userId"));
/// assert_eq!(table.key.hash_key, "id");
/// assert!(table.index("byUser").is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    pub name: String,
    #[serde(flatten)]
    pub key: KeySchema,
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, hash_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: KeySchema::new(hash_key),
            indexes: Vec::new(),
        }
    }

    pub fn with_range_key(mut self, range_key: impl Into<String>) -> Self {
        self.key = self.key.with_range_key(range_key);
        self
    }

    pub fn with_index(mut self, index: IndexDefinition) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn index(&self, name: &str) -> Result<&IndexDefinition> {
        self.indexes
            .iter()
            .find(|index| index.name == name)
            .ok_or_else(|| {
                StorageError::Validation(format!(
                    "table '{}' has no index named '{}'",
                    self.name, name
                ))
            })
    }

    /// Key schema used to read through `index_name`, or the table's own key.
    pub fn key_for(&self, index_name: Option<&str>) -> Result<&KeySchema> {
        match index_name {
            Some(name) => self.index(name).map(|index| &index.key),
            None => Ok(&self.key),
        }
    }

    /// Resume key for a row read through `index_name`.
    ///
    /// Carries the table key plus the index key so a paginated read can locate
    /// the row again.
    pub fn cursor_key(&self, item: &Item, index_name: Option<&str>) -> Result<Item> {
        let mut key = self.key.key_of(item)?;
        if index_name.is_some() {
            key.extend(self.key_for(index_name)?.key_of(item)?);
        }
        Ok(key)
    }
}

/// Orders two key values: numbers numerically, everything else by key text.
pub(crate) fn compare_key_values(a: Option<&AttributeValue>, b: Option<&AttributeValue>) -> Ordering {
    let as_number = |v: Option<&AttributeValue>| {
        v.and_then(|v| match v {
            AttributeValue::Number(n) => n.as_f64(),
            AttributeValue::Boxed(b) => b.value_of().and_then(|n| n.as_f64()),
            _ => None,
        })
    };
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => {
            let text = |v: Option<&AttributeValue>| v.and_then(AttributeValue::key_text);
            text(a).cmp(&text(b))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_commons::NumberValue;

    fn item(pairs: &[(&str, AttributeValue)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_key_of_extracts_hash_and_range() {
        let schema = KeySchema::new("pk").with_range_key("sk");
        let row = item(&[
            ("pk", AttributeValue::from("a")),
            ("sk", AttributeValue::from(3i64)),
            ("other", AttributeValue::from(true)),
        ]);

        let key = schema.key_of(&row).unwrap();
        assert_eq!(key.len(), 2);
        assert!(!key.contains_key("other"));
    }

    #[test]
    fn test_key_of_rejects_missing_or_invalid_attributes() {
        let schema = KeySchema::new("pk");
        assert!(matches!(
            schema.key_of(&Item::new()),
            Err(StorageError::Validation(_))
        ));
        assert!(schema
            .key_of(&item(&[("pk", AttributeValue::Bool(true))]))
            .is_err());
    }

    #[test]
    fn test_encoding_ignores_number_boxing() {
        let schema = KeySchema::new("pk");
        let plain = schema.encode(&item(&[("pk", AttributeValue::from(10i64))])).unwrap();
        let boxed = schema
            .encode(&item(&[("pk", AttributeValue::Boxed(NumberValue::new("10")))]))
            .unwrap();
        assert_eq!(plain, boxed);
    }

    #[test]
    fn test_unknown_index_is_rejected() {
        let table = TableDefinition::new("t", "id");
        assert!(table.key_for(Some("missing")).is_err());
        assert_eq!(table.key_for(None).unwrap().hash_key, "id");
    }

    #[test]
    fn test_compare_key_values_numeric() {
        let two = AttributeValue::from(2i64);
        let ten = AttributeValue::Boxed(NumberValue::new("10"));
        assert_eq!(compare_key_values(Some(&two), Some(&ten)), Ordering::Less);

        let a = AttributeValue::from("a");
        let b = AttributeValue::from("b");
        assert_eq!(compare_key_values(Some(&b), Some(&a)), Ordering::Greater);
    }
}
