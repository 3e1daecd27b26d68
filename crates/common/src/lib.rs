//! FieldMerge Common Utilities
//!
//! Shared infrastructure for all FieldMerge crates:
//! - Error types, structured error reports, and result aliases
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
