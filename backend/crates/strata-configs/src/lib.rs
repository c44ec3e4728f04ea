//! strata-configs
//!
//! Configuration types and loader for Strata.

pub mod config;

pub use config::defaults;
pub use config::*;
