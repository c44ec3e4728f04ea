//! Shared models.

mod account_id;
mod attribute_value;
mod cursor;
mod id_type;

pub use account_id::AccountId;
pub use attribute_value::{AttributeValue, Item, NumberValue};
pub use cursor::Cursor;
pub use id_type::IdType;
