use serde::{Deserialize, Serialize};
use strata_commons::{AccountId, IdType};
use strata_store::{Entity, EntityMeta, IndexDefinition, TableDefinition};

/// Index of identifier records by the account they point to.
pub const IDENTIFIERS_BY_USER: &str = "byUserId";

/// Maps one external identifier (the record id) to an account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierRecord {
    #[serde(flatten)]
    pub meta: EntityMeta,
    #[serde(default)]
    pub id_type: IdType,
    #[serde(default)]
    pub user_id: AccountId,
    /// Epoch ms of the last resolution or upsert
    #[serde(default)]
    pub last_used_at: i64,
}

impl IdentifierRecord {
    pub fn new(id: impl Into<String>, id_type: IdType, user_id: AccountId) -> Self {
        Self {
            meta: EntityMeta::new(id),
            id_type,
            user_id,
            last_used_at: 0,
        }
    }
}

impl Entity for IdentifierRecord {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn apply_defaults(&mut self, now: i64) {
        if self.last_used_at == 0 {
            self.last_used_at = now;
        }
    }
}

/// Declaration of the identifier records table.
pub fn identifier_table(name: impl Into<String>) -> TableDefinition {
    TableDefinition::new(name, "id")
        .with_index(IndexDefinition::new(IDENTIFIERS_BY_USER, "userId"))
}
