//! Shared error type for the Strata crates.
//!
//! ## Example Usage
//!
//! ```rust
//! use strata_commons::errors::{CommonError, Result};
//!
//! fn validate_identifier(id: &str) -> Result<()> {
//!     if id.is_empty() {
//!         return Err(CommonError::invalid_input("identifier cannot be empty"));
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt;

/// Common error type for value conversion and input validation.
#[derive(Debug, Clone, PartialEq)]
pub enum CommonError {
    /// Invalid input provided to a function
    InvalidInput(String),

    /// Value could not be converted between the item and serde representations
    Serialization(String),
}

impl CommonError {
    /// Creates an InvalidInput error with a message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates a Serialization error with a message.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommonError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CommonError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for CommonError {}

/// Result type alias using CommonError.
pub type Result<T> = std::result::Result<T, CommonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CommonError::invalid_input("bad id type");
        assert_eq!(err.to_string(), "Invalid input: bad id type");

        let err = CommonError::serialization("expected a map");
        assert_eq!(err.to_string(), "Serialization error: expected a map");
    }
}
