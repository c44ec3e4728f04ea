use strata_store::{EntityError, StorageError};
use thiserror::Error;

/// Errors raised while resolving identifiers to accounts.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// None of the presented identifiers belongs to an account
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Entity(#[from] EntityError),
}

impl IdentityError {
    /// True when the identifier or its account does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IdentityError::Entity(e) if e.is_not_found())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, IdentityError::Unauthorized(_))
    }
}

impl From<StorageError> for IdentityError {
    fn from(err: StorageError) -> Self {
        IdentityError::Entity(EntityError::Store(err))
    }
}

pub type IdentityResult<T> = Result<T, IdentityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let err: IdentityError = EntityError::NotFound("id=x".to_string()).into();
        assert!(err.is_not_found());
        assert!(!err.is_unauthorized());

        let err: IdentityError = StorageError::Throttled("busy".to_string()).into();
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Throttled: busy");
    }
}
