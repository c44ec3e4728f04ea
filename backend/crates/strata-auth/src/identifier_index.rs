//! Identifier resolution index.
//!
//! Several external identifiers (an email address, social provider subject IDs)
//! can point at one canonical [`Account`]. Each is stored as an
//! [`IdentifierRecord`] keyed by the identifier string.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use strata_auth::{Identifier, IdentifierIndex};
//! use strata_commons::IdType;
//!
//! let presented = vec![
//!     Identifier::new(IdType::Email, "ada@example.com"),
//!     Identifier::new(IdType::GoogleId, "1098765"),
//! ];
//! // Resolves the account and links both identifiers to it
//! let account = index.get_user_and_push_identifiers(&presented).await?;
//! ```

use crate::error::{IdentityError, IdentityResult};
use crate::models::{Account, IdentifierRecord, IDENTIFIERS_BY_USER};
use futures_util::future::try_join_all;
use std::fmt::Display;
use std::sync::Arc;
use strata_commons::time::now_millis;
use strata_commons::{AccountId, AttributeValue, IdType};
use strata_store::{Entity, EntityError, EntityStore, KeyQuery, QueryPaginator, ReadConsistency};

/// An identifier presented for resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub id_type: IdType,
    pub id: String,
}

impl Identifier {
    /// `id` is stringified, so numeric social IDs and their text form match.
    pub fn new(id_type: IdType, id: impl Display) -> Self {
        Self {
            id_type,
            id: id.to_string(),
        }
    }
}

/// Resolves identifiers to accounts and keeps identifier records current.
pub struct IdentifierIndex {
    identifiers: Arc<dyn EntityStore<IdentifierRecord>>,
    accounts: Arc<dyn EntityStore<Account>>,
}

impl IdentifierIndex {
    pub fn new(
        identifiers: Arc<dyn EntityStore<IdentifierRecord>>,
        accounts: Arc<dyn EntityStore<Account>>,
    ) -> Self {
        Self {
            identifiers,
            accounts,
        }
    }

    pub fn identifiers(&self) -> &Arc<dyn EntityStore<IdentifierRecord>> {
        &self.identifiers
    }

    pub fn accounts(&self) -> &Arc<dyn EntityStore<Account>> {
        &self.accounts
    }

    async fn resolve(&self, id: &str) -> IdentityResult<Account> {
        let record = self.identifiers.get_by_id(id).await?;
        let account = self.accounts.get_by_id(record.user_id.as_str()).await?;
        Ok(account)
    }

    /// Returns the account of the first candidate that resolves.
    ///
    /// Candidates are tried in order. A missing identifier or account moves on
    /// to the next candidate, except on the last one where the not-found error
    /// is returned. Any other error is returned immediately.
    ///
    /// Resolution alone does not touch `last_used_at`; only
    /// [`upsert`](Self::upsert) refreshes it.
    pub async fn get_user<S>(&self, candidates: &[S]) -> IdentityResult<Account>
    where
        S: AsRef<str> + Sync,
    {
        if candidates.is_empty() {
            return Err(EntityError::NotFound("no identifiers to resolve".to_string()).into());
        }

        let last = candidates.len() - 1;
        for (i, candidate) in candidates.iter().enumerate() {
            match self.resolve(candidate.as_ref()).await {
                Ok(account) => return Ok(account),
                Err(e) if e.is_not_found() && i < last => {
                    log::debug!("Identifier '{}' did not resolve; trying next", candidate.as_ref());
                }
                Err(e) => return Err(e),
            }
        }
        Err(EntityError::NotFound("no identifiers to resolve".to_string()).into())
    }

    /// Resolves the first matching identifier, then links every presented
    /// identifier to that account.
    ///
    /// Fails with [`IdentityError::Unauthorized`] when none resolves.
    pub async fn get_user_and_push_identifiers(
        &self,
        identifiers: &[Identifier],
    ) -> IdentityResult<Account> {
        let mut resolved = None;
        for identifier in identifiers {
            match self.get_user(&[identifier.id.as_str()]).await {
                Ok(account) => {
                    resolved = Some(account);
                    break;
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }

        let account = resolved.ok_or_else(|| {
            log::info!(
                "None of {} presented identifier(s) matched an account",
                identifiers.len()
            );
            IdentityError::Unauthorized("no presented identifier matches an account".to_string())
        })?;

        self.push_identifiers(&account.account_id(), identifiers).await?;
        Ok(account)
    }

    /// Upserts every identifier against `user_id` concurrently.
    ///
    /// No ordering or atomicity across the set; the first failure is returned.
    pub async fn push_identifiers(
        &self,
        user_id: &AccountId,
        identifiers: &[Identifier],
    ) -> IdentityResult<Vec<IdentifierRecord>> {
        try_join_all(
            identifiers
                .iter()
                .map(|identifier| self.upsert(user_id, identifier.id_type, &identifier.id)),
        )
        .await
    }

    /// Fetches or creates the record for `id` and refreshes its `last_used_at`.
    ///
    /// An existing record keeps its `id_type` and `user_id`; only a missing one
    /// is created with the given values.
    pub async fn upsert(
        &self,
        user_id: &AccountId,
        id_type: IdType,
        id: impl Display,
    ) -> IdentityResult<IdentifierRecord> {
        let id = id.to_string();
        let mut record = match self.identifiers.get_by_id(&id).await {
            Ok(existing) => {
                if existing.user_id != *user_id {
                    log::debug!(
                        "Identifier '{}' already belongs to '{}'; not moving it to '{}'",
                        id,
                        existing.user_id,
                        user_id
                    );
                }
                existing
            }
            Err(e) if e.is_not_found() => IdentifierRecord::new(&id, id_type, user_id.clone()),
            Err(e) => return Err(e.into()),
        };

        record.last_used_at = now_millis().max(record.last_used_at.saturating_add(1));
        self.identifiers.save(&mut record).await?;
        Ok(record)
    }

    /// Every identifier record pointing at `user_id`.
    pub async fn identifiers_for(
        &self,
        user_id: &AccountId,
    ) -> IdentityResult<Vec<IdentifierRecord>> {
        let table = self.identifiers.table();
        let index = table.index(IDENTIFIERS_BY_USER)?;
        let query = KeyQuery::new(
            table.name.clone(),
            index.key.hash_key.clone(),
            AttributeValue::from(user_id.as_str()),
        )
        .index(index.name.clone())
        .consistency(ReadConsistency::Eventual);

        let mut rows = QueryPaginator::new(self.identifiers.backend().clone(), &query);
        let mut records = Vec::new();
        while let Some(item) = rows.next_item().await? {
            records.push(IdentifierRecord::from_partial(&item).map_err(IdentityError::from)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_stringifies_ids() {
        let numeric = Identifier::new(IdType::FacebookId, 1234567u64);
        assert_eq!(numeric.id, "1234567");
        assert_eq!(numeric.id_type, IdType::FacebookId);
    }
}
