//! Condition expressions.
//!
//! Key conditions and scan filters share one small grammar:
//!
//! ```text
//! expression := condition ( "and" condition )*
//! condition  := path "=" placeholder
//!             | path "<>" placeholder
//!             | "attribute_exists(" path ")"
//!             | "attribute_not_exists(" path ")"
//! path       := name ( "." name )*
//! placeholder:= ":" name
//! ```
//!
//! Tokens are separated by whitespace. `and` is case-insensitive.

use crate::storage_trait::{Result, StorageError};
use strata_commons::normalize::unwrap_numbers;
use strata_commons::{AttributeValue, Item};

/// One parsed condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Equals { path: String, placeholder: String },
    NotEquals { path: String, placeholder: String },
    AttributeExists(String),
    AttributeNotExists(String),
}

/// A conjunction of conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    conditions: Vec<Condition>,
}

impl Expression {
    pub fn parse(text: &str) -> Result<Self> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(StorageError::Validation("empty expression".to_string()));
        }

        let conditions = tokens
            .split(|token| token.eq_ignore_ascii_case("and"))
            .map(parse_condition)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { conditions })
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Evaluates the expression against `item`.
    pub fn matches(&self, item: &Item, values: &Item) -> Result<bool> {
        for condition in &self.conditions {
            let holds = match condition {
                Condition::Equals { path, placeholder } => {
                    values_equal(resolve_path(item, path), Some(lookup(values, placeholder)?))
                }
                Condition::NotEquals { path, placeholder } => {
                    !values_equal(resolve_path(item, path), Some(lookup(values, placeholder)?))
                }
                Condition::AttributeExists(path) => resolve_path(item, path).is_some(),
                Condition::AttributeNotExists(path) => resolve_path(item, path).is_none(),
            };
            if !holds {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn parse_condition(tokens: &[&str]) -> Result<Condition> {
    match tokens {
        [call] => {
            if let Some(path) = function_argument(call, "attribute_exists") {
                Ok(Condition::AttributeExists(path))
            } else if let Some(path) = function_argument(call, "attribute_not_exists") {
                Ok(Condition::AttributeNotExists(path))
            } else {
                Err(invalid(tokens))
            }
        }
        [path, op, placeholder] if is_path(path) && is_placeholder(placeholder) => {
            let path = path.to_string();
            let placeholder = placeholder.to_string();
            match *op {
                "=" => Ok(Condition::Equals { path, placeholder }),
                "<>" => Ok(Condition::NotEquals { path, placeholder }),
                _ => Err(invalid(tokens)),
            }
        }
        _ => Err(invalid(tokens)),
    }
}

fn function_argument(call: &str, name: &str) -> Option<String> {
    let inner = call.strip_prefix(name)?.strip_prefix('(')?.strip_suffix(')')?;
    is_path(inner).then(|| inner.to_string())
}

fn is_path(text: &str) -> bool {
    !text.is_empty()
        && text.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
}

fn is_placeholder(text: &str) -> bool {
    text.strip_prefix(':').map(is_path).unwrap_or(false)
}

fn invalid(tokens: &[&str]) -> StorageError {
    StorageError::Validation(format!("invalid condition '{}'", tokens.join(" ")))
}

fn lookup<'a>(values: &'a Item, placeholder: &str) -> Result<&'a AttributeValue> {
    values.get(placeholder).ok_or_else(|| {
        StorageError::Validation(format!("no value supplied for placeholder '{}'", placeholder))
    })
}

/// Resolves a dotted path through nested maps.
pub fn resolve_path<'a>(item: &'a Item, path: &str) -> Option<&'a AttributeValue> {
    let mut segments = path.split('.');
    let mut current = item.get(segments.next()?)?;
    for segment in segments {
        current = current.as_map()?.get(segment)?;
    }
    Some(current)
}

/// Compares two values with boxed numbers treated as their plain form.
pub fn values_equal(a: Option<&AttributeValue>, b: Option<&AttributeValue>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => unwrap_numbers(a.clone()) == unwrap_numbers(b.clone()),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_commons::NumberValue;

    fn values(pairs: &[(&str, AttributeValue)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_parse_key_condition() {
        let expr = Expression::parse("id = :pkey and sort = :skey").unwrap();
        assert_eq!(
            expr.conditions(),
            &[
                Condition::Equals {
                    path: "id".to_string(),
                    placeholder: ":pkey".to_string()
                },
                Condition::Equals {
                    path: "sort".to_string(),
                    placeholder: ":skey".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_functions_and_case_insensitive_and() {
        let expr =
            Expression::parse("attribute_exists(clients) AND attribute_not_exists(profile.bannedAt)")
                .unwrap();
        assert_eq!(
            expr.conditions(),
            &[
                Condition::AttributeExists("clients".to_string()),
                Condition::AttributeNotExists("profile.bannedAt".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in ["", "id =", "id == :v", "id = value", "attribute_exists(", "a = :v and"] {
            assert!(Expression::parse(text).is_err(), "accepted '{}'", text);
        }
    }

    #[test]
    fn test_matches_with_boxed_values() {
        let item = values(&[
            ("count", AttributeValue::Boxed(NumberValue::new("3"))),
            (
                "profile",
                AttributeValue::Map(values(&[("plan", AttributeValue::from("pro"))])),
            ),
        ]);
        let expr = Expression::parse("count = :c and profile.plan <> :p").unwrap();

        let bound = values(&[
            (":c", AttributeValue::from(3i64)),
            (":p", AttributeValue::from("free")),
        ]);
        assert!(expr.matches(&item, &bound).unwrap());

        let bound = values(&[
            (":c", AttributeValue::from(3i64)),
            (":p", AttributeValue::from("pro")),
        ]);
        assert!(!expr.matches(&item, &bound).unwrap());
    }

    #[test]
    fn test_missing_placeholder_is_an_error() {
        let expr = Expression::parse("id = :missing").unwrap();
        let item = values(&[("id", AttributeValue::from("a"))]);
        assert!(matches!(
            expr.matches(&item, &Item::new()),
            Err(StorageError::Validation(_))
        ));
    }
}
