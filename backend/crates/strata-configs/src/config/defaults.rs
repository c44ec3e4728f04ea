// Default value functions

pub fn default_store_backend() -> String {
    "memory".to_string()
}

pub fn default_data_path() -> String {
    "./data".to_string() // Only used by the rocksdb backend
}

pub fn default_consistent_reads() -> bool {
    false
}

pub fn default_scan_page_size() -> usize {
    100
}

pub fn default_accounts_table() -> String {
    "accounts".to_string()
}

pub fn default_identifiers_table() -> String {
    "userIdentifiers".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_log_format() -> String {
    "compact".to_string()
}

pub fn default_true() -> bool {
    true
}
