//! Shared utilities for the points ledger.

pub mod logging;

pub use logging::{init_logging, LogFormat};
