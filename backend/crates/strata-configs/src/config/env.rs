use super::loader::{VALID_BACKENDS, VALID_FORMATS};
use super::types::StrataConfig;
use std::env;

impl StrataConfig {
    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - STRATA_STORE_BACKEND: Override store.backend
    /// - STRATA_DATA_PATH: Override store.data_path
    /// - STRATA_ACCOUNTS_TABLE: Override tables.accounts
    /// - STRATA_IDENTIFIERS_TABLE: Override tables.identifiers
    /// - STRATA_LOG_LEVEL: Override logging.level
    /// - STRATA_LOG_FORMAT: Override logging.format
    ///
    /// Call `validate()` afterwards.
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with a custom lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("STRATA_STORE_BACKEND") {
            let backend = backend.to_lowercase();
            if !VALID_BACKENDS.contains(&backend.as_str()) {
                return Err(anyhow::anyhow!("Invalid STRATA_STORE_BACKEND value: {}", backend));
            }
            self.store.backend = backend;
        }

        if let Some(path) = lookup("STRATA_DATA_PATH") {
            self.store.data_path = path;
        }

        if let Some(name) = lookup("STRATA_ACCOUNTS_TABLE") {
            self.tables.accounts = name;
        }

        if let Some(name) = lookup("STRATA_IDENTIFIERS_TABLE") {
            self.tables.identifiers = name;
        }

        if let Some(level) = lookup("STRATA_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }

        if let Some(format) = lookup("STRATA_LOG_FORMAT") {
            let format = format.to_lowercase();
            if !VALID_FORMATS.contains(&format.as_str()) {
                return Err(anyhow::anyhow!("Invalid STRATA_LOG_FORMAT value: {}", format));
            }
            self.logging.format = format;
        }

        log::debug!("Applied environment overrides to configuration");
        Ok(())
    }
}
