// Strata identity library
// Account and identifier-record entities plus resolution of external identifiers to accounts

pub mod error;
pub mod identifier_index;
pub mod models;

// Re-export commonly used types
pub use error::{IdentityError, IdentityResult};
pub use identifier_index::{Identifier, IdentifierIndex};
pub use models::{account_table, identifier_table, Account, IdentifierRecord};
