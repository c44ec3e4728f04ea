//! # strata-commons
//!
//! Shared types and utilities for the Strata crates.
//!
//! ## Attribute Model
//!
//! Records read from and written to a store are [`Item`]s: ordered maps from
//! attribute name to [`AttributeValue`]. Stores hand numbers back in their
//! provider-native boxed form ([`NumberValue`]); [`normalize`] turns them back
//! into plain numbers.
//!
//! ## Type-Safe Wrappers
//!
//! - `AccountId`: canonical account identifier
//! - `IdType`: kind of external identifier (email, social provider subject)
//! - `Cursor`: opaque pagination resume key
//!
//! ## Example Usage
//!
//! ```rust
//! use strata_commons::{normalize, AttributeValue, NumberValue};
//!
//! let boxed = AttributeValue::Boxed(NumberValue::new("42"));
//! assert_eq!(normalize::unwrap_numbers(boxed), AttributeValue::from(42i64));
//! ```

pub mod errors;
pub mod models;
pub mod normalize;
pub mod serialization;
pub mod time;

pub use errors::{CommonError, Result};
pub use models::{AccountId, AttributeValue, Cursor, IdType, Item, NumberValue};
pub use serialization::{from_item, to_item};
