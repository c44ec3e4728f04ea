//! Opaque pagination cursor.

use super::attribute_value::{AttributeValue, Item};
use serde::{Deserialize, Serialize};

/// Resume position of a paginated read.
///
/// A store returns the key attributes of the last row it evaluated; feeding the
/// cursor back continues strictly after that row. The cursor serializes with
/// serde so callers can persist it between runs and resume a scan later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(Item);

impl Cursor {
    pub fn new(key: Item) -> Self {
        Self(key)
    }

    pub fn get(&self, attribute: &str) -> Option<&AttributeValue> {
        self.0.get(attribute)
    }

    pub fn as_item(&self) -> &Item {
        &self.0
    }

    pub fn into_item(self) -> Item {
        self.0
    }
}
