//! Application context.
//!
//! Builds the configured document store once and wires the entity stores and
//! the identifier resolution index on top of it.

use std::sync::Arc;

use strata_auth::models::{account_table, identifier_table, ACCOUNTS_BY_EMAIL};
use strata_auth::{Account, IdentifierIndex, IdentifierRecord, IdentityResult};
use strata_commons::{AttributeValue, Item};
use strata_configs::StrataConfig;
use strata_store::{
    DocumentStore, EntityError, EntityStore, EntityTable, InMemoryStore, ReadConsistency,
    ScanIterator, ScanParams,
};

/// Shared handles for one configured store.
pub struct AppContext {
    config: StrataConfig,
    store: Arc<dyn DocumentStore>,
    accounts: Arc<EntityTable<Account>>,
    identifiers: Arc<EntityTable<IdentifierRecord>>,
    identifier_index: Arc<IdentifierIndex>,
}

impl AppContext {
    /// Validates `config`, opens the configured backend and declares the
    /// account and identifier tables.
    pub async fn from_config(config: StrataConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let store = open_store(&config)?;
        Self::with_store(config, store).await
    }

    /// Same as [`from_config`](Self::from_config) over an existing store.
    pub async fn with_store(
        config: StrataConfig,
        store: Arc<dyn DocumentStore>,
    ) -> anyhow::Result<Self> {
        let accounts = EntityTable::<Account>::create(
            store.clone(),
            account_table(config.tables.accounts.clone()),
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to declare table '{}': {}", config.tables.accounts, e))?;

        let identifiers = EntityTable::<IdentifierRecord>::create(
            store.clone(),
            identifier_table(config.tables.identifiers.clone()),
        )
        .await
        .map_err(|e| {
            anyhow::anyhow!("Failed to declare table '{}': {}", config.tables.identifiers, e)
        })?;

        let accounts = Arc::new(accounts);
        let identifiers = Arc::new(identifiers);
        let identifier_index = Arc::new(IdentifierIndex::new(
            identifiers.clone(),
            accounts.clone(),
        ));

        log::info!(
            "Store ready: backend={}, accounts='{}', identifiers='{}'",
            config.store.backend,
            config.tables.accounts,
            config.tables.identifiers
        );

        Ok(Self {
            config,
            store,
            accounts,
            identifiers,
            identifier_index,
        })
    }

    pub fn config(&self) -> &StrataConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn accounts(&self) -> &Arc<EntityTable<Account>> {
        &self.accounts
    }

    pub fn identifiers(&self) -> &Arc<EntityTable<IdentifierRecord>> {
        &self.identifiers
    }

    pub fn identifier_index(&self) -> &Arc<IdentifierIndex> {
        &self.identifier_index
    }

    /// Consistency for direct reads, from `store.consistent_reads`.
    pub fn read_consistency(&self) -> ReadConsistency {
        ReadConsistency::from_strong(self.config.store.consistent_reads)
    }

    /// Scan parameters for `table` with the configured page size and consistency.
    pub fn scan_params(&self, table: impl Into<String>) -> ScanParams {
        ScanParams::new(table)
            .page_size(self.config.store.scan_page_size)
            .consistency(self.read_consistency())
    }

    /// Scan over every row of the accounts table.
    pub fn scan_accounts(&self) -> ScanIterator {
        ScanIterator::new(
            self.store.clone(),
            self.scan_params(self.config.tables.accounts.clone()),
        )
    }

    /// Looks an account up by its email through the `byEmail` index.
    ///
    /// Index reads are always eventually consistent.
    pub async fn account_by_email(&self, email: &str) -> IdentityResult<Account> {
        let key = Item::from([("email".to_string(), AttributeValue::from(email))]);
        let account = self
            .accounts
            .get(&key, Some(ACCOUNTS_BY_EMAIL), ReadConsistency::Eventual)
            .await?;

        if account.meta.id.is_empty() {
            return Err(EntityError::NotFound(format!(
                "email={:?} in {}",
                email, self.config.tables.accounts
            ))
            .into());
        }
        Ok(account)
    }
}

fn open_store(config: &StrataConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.store.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        "rocksdb" => open_rocksdb(&config.store.data_path),
        other => Err(anyhow::anyhow!("Unknown store backend '{}'", other)),
    }
}

#[cfg(feature = "rocksdb")]
fn open_rocksdb(path: &str) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store = strata_store::RocksDbStore::open(path)
        .map_err(|e| anyhow::anyhow!("Failed to open RocksDB at '{}': {}", path, e))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "rocksdb"))]
fn open_rocksdb(path: &str) -> anyhow::Result<Arc<dyn DocumentStore>> {
    Err(anyhow::anyhow!(
        "Store backend 'rocksdb' (data_path '{}') requires the `rocksdb` feature",
        path
    ))
}
