pub mod defaults;
mod env;
mod loader;
mod types;

pub use types::*;
