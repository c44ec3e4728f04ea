//! Kinds of external identifiers that resolve to an account.

use crate::errors::CommonError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source of an external identifier.
///
/// Serializes with the camelCase names stored in identifier records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdType {
    /// Email address
    #[default]
    #[serde(rename = "email")]
    Email,
    /// Facebook Login subject ID
    #[serde(rename = "facebookId")]
    FacebookId,
    /// Google account subject ID
    #[serde(rename = "googleId")]
    GoogleId,
    /// Sign in with Apple subject ID
    #[serde(rename = "appleId")]
    AppleId,
}

impl IdType {
    pub const ALL: [IdType; 4] = [
        IdType::Email,
        IdType::FacebookId,
        IdType::GoogleId,
        IdType::AppleId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::Email => "email",
            IdType::FacebookId => "facebookId",
            IdType::GoogleId => "googleId",
            IdType::AppleId => "appleId",
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdType {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CommonError::invalid_input(format!("unknown identifier type '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_type_names() {
        for id_type in IdType::ALL {
            assert_eq!(id_type.as_str().parse::<IdType>().unwrap(), id_type);
        }
        assert!("twitterId".parse::<IdType>().is_err());
    }

    #[test]
    fn test_id_type_serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&IdType::FacebookId).unwrap(),
            "\"facebookId\""
        );
        let parsed: IdType = serde_json::from_str("\"appleId\"").unwrap();
        assert_eq!(parsed, IdType::AppleId);
    }
}
