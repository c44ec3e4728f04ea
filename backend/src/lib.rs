//! Strata Library
//!
//! Wires a configured document store to the account entity store and the
//! identifier resolution index, and sets up logging.

pub mod context;
pub mod logging;

pub use context::AppContext;
pub use logging::init_logging;
