use super::defaults::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrataConfig {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub tables: TableSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Document store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// "memory" or "rocksdb"
    #[serde(default = "default_store_backend")]
    pub backend: String,
    /// Database directory for the rocksdb backend
    #[serde(default = "default_data_path")]
    pub data_path: String,
    /// Default entity reads to strong consistency
    #[serde(default = "default_consistent_reads")]
    pub consistent_reads: bool,
    /// Rows evaluated per scan request by bulk jobs
    #[serde(default = "default_scan_page_size")]
    pub scan_page_size: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            data_path: default_data_path(),
            consistent_reads: default_consistent_reads(),
            scan_page_size: default_scan_page_size(),
        }
    }
}

/// Collection names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSettings {
    #[serde(default = "default_accounts_table")]
    pub accounts: String,
    #[serde(default = "default_identifiers_table")]
    pub identifiers: String,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            accounts: default_accounts_table(),
            identifiers: default_identifiers_table(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_true")]
    pub log_to_console: bool,
    /// Optional per-target log level overrides
    /// Configure via a TOML table:
    /// [logging.targets]
    /// strata_store = "debug"
    #[serde(default)]
    pub targets: HashMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_to_console: default_true(),
            targets: HashMap::new(),
        }
    }
}
