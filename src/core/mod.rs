//! Core domain types, errors and configuration for reportchart.
//!
//! Everything else in the crate builds on the sample model defined here.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    Config, ConfigBuilder, IgnoreConfig, LogLevel, PollerConfig, ServerConfig, StorageConfig,
};
pub use error::{ReportError, Result};
pub use types::{ExtraFields, FieldValue, Sample, Series};
