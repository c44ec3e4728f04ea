use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strata_commons::AccountId;
use strata_store::{Entity, EntityMeta, IndexDefinition, TableDefinition};

/// Index of accounts by email address.
pub const ACCOUNTS_BY_EMAIL: &str = "byEmail";

/// Canonical account that identifier records point to.
///
/// Attributes this type does not know about are kept in `extra` and written
/// back unchanged on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(flatten)]
    pub meta: EntityMeta,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banned_at: Option<i64>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub sub_source: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Account {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::new(id),
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn account_id(&self) -> AccountId {
        AccountId::new(self.meta.id.clone())
    }

    pub fn is_banned(&self) -> bool {
        self.banned_at.is_some()
    }
}

impl Entity for Account {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}

/// Declaration of the accounts table.
pub fn account_table(name: impl Into<String>) -> TableDefinition {
    TableDefinition::new(name, "id").with_index(IndexDefinition::new(ACCOUNTS_BY_EMAIL, "email"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_commons::{to_item, AttributeValue, Item};

    #[test]
    fn test_unknown_attributes_round_trip() {
        let item = Item::from([
            ("id".to_string(), AttributeValue::from("acc-1")),
            ("email".to_string(), AttributeValue::from("ada@example.com")),
            ("createdAt".to_string(), AttributeValue::from(10i64)),
            ("dob".to_string(), AttributeValue::from("1815-12-10")),
            (
                "domainScopes".to_string(),
                AttributeValue::from_json(json!({"app": ["read"]})),
            ),
        ]);

        let account = Account::from_partial(&item).unwrap();
        assert_eq!(account.meta.id, "acc-1");
        assert_eq!(account.meta.created_at, 10);
        assert_eq!(account.extra["dob"], json!("1815-12-10"));

        let written = to_item(&account).unwrap();
        assert_eq!(written["dob"], AttributeValue::from("1815-12-10"));
        assert_eq!(written["domainScopes"], item["domainScopes"]);
        assert!(!written.contains_key("bannedAt"));
    }

    #[test]
    fn test_camel_case_fields() {
        let mut account = Account::new("acc-2", "grace@example.com");
        account.first_name = Some("Grace".to_string());
        account.last_login_at = Some(5);

        let written = to_item(&account).unwrap();
        assert_eq!(written["firstName"], AttributeValue::from("Grace"));
        assert_eq!(written["lastLoginAt"], AttributeValue::from(5i64));
        assert_eq!(account.account_id().as_str(), "acc-2");
    }
}
