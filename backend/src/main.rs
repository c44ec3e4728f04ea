// Strata entrypoint
//!
//! Loads configuration, initializes logging and opens the configured store.
//! Usage: `strata [config.toml]`

use anyhow::Result;
use log::info;
use std::env;
use std::path::Path;
use strata::{init_logging, AppContext};
use strata_configs::StrataConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = env::args().nth(1).unwrap_or_else(|| "strata.toml".to_string());

    // Fall back to defaults when no config file exists
    let mut config = if Path::new(&config_path).exists() {
        StrataConfig::from_file(&config_path)?
    } else {
        eprintln!("No config at {}; using defaults", config_path);
        StrataConfig::default()
    };
    config.apply_env_overrides()?;
    config.validate()?;

    // Logging before any other side effects
    init_logging(&config.logging)?;
    info!("Strata v{}", env!("CARGO_PKG_VERSION"));

    let ctx = AppContext::from_config(config).await?;

    let mut scan = ctx.scan_accounts();
    let mut count = 0usize;
    while scan.next_item().await?.is_some() {
        count += 1;
    }
    info!(
        "{} account(s) in '{}' ({} page(s) scanned)",
        count,
        ctx.config().tables.accounts,
        scan.pages_fetched()
    );

    Ok(())
}
