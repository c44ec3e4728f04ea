//! Conversion between typed values and [`Item`]s.
//!
//! Entities are plain serde types. Writing goes `T -> serde_json::Value -> Item`;
//! reading goes the other way, unboxing numbers along the way so a freshly read
//! item deserializes into integer fields.

use crate::errors::{CommonError, Result};
use crate::models::{AttributeValue, Item};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Serializes a value into an item. The value must serialize as a map.
pub fn to_item<T: Serialize>(value: &T) -> Result<Item> {
    let json = serde_json::to_value(value).map_err(|e| CommonError::serialization(e.to_string()))?;
    json_to_item(json)
}

/// Deserializes an item into a typed value.
pub fn from_item<T: DeserializeOwned>(item: &Item) -> Result<T> {
    serde_json::from_value(item_to_json(item)).map_err(|e| CommonError::serialization(e.to_string()))
}

/// Converts a JSON object into an item.
pub fn json_to_item(json: Value) -> Result<Item> {
    match AttributeValue::from_json(json) {
        AttributeValue::Map(item) => Ok(item),
        other => Err(CommonError::serialization(format!(
            "expected a map, got {}",
            other.to_json()
        ))),
    }
}

/// Renders an item as a JSON object.
pub fn item_to_json(item: &Item) -> Value {
    Value::Object(item.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NumberValue;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        id: String,
        created_at: i64,
        deleted_reason: Option<String>,
    }

    #[test]
    fn test_to_item_and_back() {
        let sample = Sample {
            id: "a".to_string(),
            created_at: 1_700_000_000_000,
            deleted_reason: None,
        };

        let item = to_item(&sample).unwrap();
        assert_eq!(item["createdAt"], AttributeValue::from(1_700_000_000_000i64));
        assert_eq!(item["deletedReason"], AttributeValue::Null);

        let back: Sample = from_item(&item).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn test_from_item_reads_boxed_numbers() {
        let item = Item::from([
            ("id".to_string(), AttributeValue::from("b")),
            (
                "createdAt".to_string(),
                AttributeValue::Boxed(NumberValue::new("99")),
            ),
        ]);

        let sample: Sample = from_item(&item).unwrap();
        assert_eq!(sample.created_at, 99);
        assert_eq!(sample.deleted_reason, None);
    }

    #[test]
    fn test_to_item_rejects_non_maps() {
        assert!(to_item(&"just a string").is_err());
    }
}
