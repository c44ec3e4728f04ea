//! Attribute values as exchanged with a document store.
//!
//! The store speaks in [`Item`]s. Numbers travel over the wire as decimal text and
//! come back as [`AttributeValue::Boxed`]; code that builds items locally uses
//! plain [`AttributeValue::Number`]. The serde representation is externally
//! tagged with short type descriptors (`S`, `N`, `M`, ...) so an encoded item
//! keeps the distinction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A single record: attribute name to value, ordered by name.
pub type Item = BTreeMap<String, AttributeValue>;

/// Provider-native boxed number.
///
/// Holds the decimal text exactly as the store returned it, so arbitrary
/// precision survives a read until the caller decides how to interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NumberValue(String);

impl NumberValue {
    /// Creates a boxed number from its decimal text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the raw decimal text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the plain numeric value, or `None` if the text is not a number.
    ///
    /// Integers are preferred over floats so `"42"` unboxes to `42`, not `42.0`.
    pub fn value_of(&self) -> Option<Number> {
        let text = self.0.trim();
        if let Ok(i) = text.parse::<i64>() {
            return Some(Number::from(i));
        }
        if let Ok(u) = text.parse::<u64>() {
            return Some(Number::from(u));
        }
        text.parse::<f64>().ok().and_then(Number::from_f64)
    }
}

impl From<&Number> for NumberValue {
    fn from(n: &Number) -> Self {
        Self(n.to_string())
    }
}

impl fmt::Display for NumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value stored under one attribute of an [`Item`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[serde(rename = "NULL")]
    Null,
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Plain number, as produced by local code or by normalization.
    #[serde(rename = "NUM")]
    Number(Number),
    /// Boxed number, as returned by a store.
    #[serde(rename = "N")]
    Boxed(NumberValue),
    #[serde(rename = "S")]
    String(String),
    #[serde(rename = "DATE")]
    Date(DateTime<Utc>),
    #[serde(rename = "L")]
    List(Vec<AttributeValue>),
    #[serde(rename = "M")]
    Map(Item),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view of a plain or boxed number.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Number(n) => n.as_i64(),
            AttributeValue::Boxed(b) => b.value_of().and_then(|n| n.as_i64()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Item> {
        match self {
            AttributeValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Canonical text of a key attribute.
    ///
    /// Only strings and numbers can be keys. Plain and boxed forms of the same
    /// number produce the same text.
    pub fn key_text(&self) -> Option<String> {
        match self {
            AttributeValue::String(s) => Some(s.clone()),
            AttributeValue::Number(n) => Some(n.to_string()),
            AttributeValue::Boxed(b) => Some(
                b.value_of()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| b.as_str().to_string()),
            ),
            _ => None,
        }
    }

    /// Converts every plain number into its boxed wire form.
    ///
    /// This is what a store does to a value on the way in; reading it back
    /// yields boxed numbers until the value is normalized.
    pub fn into_wire(self) -> AttributeValue {
        match self {
            AttributeValue::Number(n) => AttributeValue::Boxed(NumberValue::from(&n)),
            AttributeValue::List(values) => {
                AttributeValue::List(values.into_iter().map(AttributeValue::into_wire).collect())
            }
            AttributeValue::Map(item) => AttributeValue::Map(
                item.into_iter()
                    .map(|(k, v)| (k, v.into_wire()))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Builds an attribute value from a JSON value.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => AttributeValue::Null,
            Value::Bool(b) => AttributeValue::Bool(b),
            Value::Number(n) => AttributeValue::Number(n),
            Value::String(s) => AttributeValue::String(s),
            Value::Array(values) => {
                AttributeValue::List(values.into_iter().map(AttributeValue::from_json).collect())
            }
            Value::Object(map) => AttributeValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, AttributeValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Renders the value as JSON.
    ///
    /// Boxed numbers unbox when their text parses (otherwise they render as the
    /// raw string); dates render as RFC 3339 strings.
    pub fn to_json(&self) -> Value {
        match self {
            AttributeValue::Null => Value::Null,
            AttributeValue::Bool(b) => Value::Bool(*b),
            AttributeValue::Number(n) => Value::Number(n.clone()),
            AttributeValue::Boxed(b) => match b.value_of() {
                Some(n) => Value::Number(n),
                None => Value::String(b.as_str().to_string()),
            },
            AttributeValue::String(s) => Value::String(s.clone()),
            AttributeValue::Date(d) => Value::String(d.to_rfc3339()),
            AttributeValue::List(values) => {
                Value::Array(values.iter().map(AttributeValue::to_json).collect())
            }
            AttributeValue::Map(item) => Value::Object(
                item.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        AttributeValue::Number(Number::from(n))
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<NumberValue> for AttributeValue {
    fn from(n: NumberValue) -> Self {
        AttributeValue::Boxed(n)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(d: DateTime<Utc>) -> Self {
        AttributeValue::Date(d)
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(values: Vec<AttributeValue>) -> Self {
        AttributeValue::List(values)
    }
}

impl From<Item> for AttributeValue {
    fn from(item: Item) -> Self {
        AttributeValue::Map(item)
    }
}
