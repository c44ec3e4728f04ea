//! Identity entities.

mod account;
mod identifier;

pub use account::{account_table, Account, ACCOUNTS_BY_EMAIL};
pub use identifier::{identifier_table, IdentifierRecord, IDENTIFIERS_BY_USER};
