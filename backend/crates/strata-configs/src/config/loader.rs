use super::types::StrataConfig;
use std::fs;
use std::path::Path;

pub(crate) const VALID_BACKENDS: [&str; 2] = ["memory", "rocksdb"];
pub(crate) const VALID_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
pub(crate) const VALID_FORMATS: [&str; 2] = ["compact", "json"];

impl StrataConfig {
    /// Load configuration from a TOML file
    ///
    /// Note: Environment overrides are applied separately via `apply_env_overrides()`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text and validate it.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: StrataConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if !VALID_BACKENDS.contains(&self.store.backend.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid store backend '{}'. Must be one of: {}",
                self.store.backend,
                VALID_BACKENDS.join(", ")
            ));
        }

        if self.store.backend == "rocksdb" && self.store.data_path.trim().is_empty() {
            return Err(anyhow::anyhow!("data_path cannot be empty for the rocksdb backend"));
        }

        if self.store.scan_page_size == 0 {
            return Err(anyhow::anyhow!("scan_page_size cannot be 0"));
        }

        if self.tables.accounts.trim().is_empty() {
            return Err(anyhow::anyhow!("tables.accounts cannot be empty"));
        }

        if self.tables.identifiers.trim().is_empty() {
            return Err(anyhow::anyhow!("tables.identifiers cannot be empty"));
        }

        if self.tables.accounts == self.tables.identifiers {
            return Err(anyhow::anyhow!(
                "tables.accounts and tables.identifiers must differ (both '{}')",
                self.tables.accounts
            ));
        }

        // Validate log level
        if !VALID_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                VALID_LEVELS.join(", ")
            ));
        }

        // Validate log format
        if !VALID_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                VALID_FORMATS.join(", ")
            ));
        }

        // Validate per-target log levels if provided
        for (target, level) in &self.logging.targets {
            if !VALID_LEVELS.contains(&level.as_str()) {
                return Err(anyhow::anyhow!(
                    "Invalid log level '{}' for target '{}'. Must be one of: {}",
                    level,
                    target,
                    VALID_LEVELS.join(", ")
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = StrataConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.tables.identifiers, "userIdentifiers");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = StrataConfig::from_toml_str("").unwrap();
        assert_eq!(config.store.scan_page_size, 100);
        assert!(config.logging.log_to_console);
    }

    #[test]
    fn test_parse_full_config() {
        let config = StrataConfig::from_toml_str(
            r#"
            [store]
            backend = "rocksdb"
            data_path = "/var/lib/strata"
            consistent_reads = true
            scan_page_size = 250

            [tables]
            accounts = "users"
            identifiers = "userIds"

            [logging]
            level = "debug"
            format = "json"

            [logging.targets]
            strata_store = "trace"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.backend, "rocksdb");
        assert!(config.store.consistent_reads);
        assert_eq!(config.store.scan_page_size, 250);
        assert_eq!(config.tables.accounts, "users");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.targets["strata_store"], "trace");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for text in [
            "[store]\nbackend = \"dynamo\"",
            "[store]\nscan_page_size = 0",
            "[tables]\naccounts = \"\"",
            "[tables]\naccounts = \"x\"\nidentifiers = \"x\"",
            "[logging]\nlevel = \"loud\"",
            "[logging]\nformat = \"pretty\"",
            "[logging.targets]\nstrata_store = \"verbose\"",
        ] {
            assert!(StrataConfig::from_toml_str(text).is_err(), "accepted {}", text);
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tables]\naccounts = \"people\"").unwrap();

        let config = StrataConfig::from_file(file.path()).unwrap();
        assert_eq!(config.tables.accounts, "people");

        assert!(StrataConfig::from_file("/nonexistent/strata.toml").is_err());
    }
}
