//! reportchart - charts a metrics report endpoint over time.
//!
//! reportchart polls an HTTP endpoint that reports per-name usage figures
//! (for example average latency per route), keeps one append-only series per
//! name in an embedded database and serves chart-ready views of them.
//!
//! # Architecture
//!
//! - `core`: sample model, errors and configuration
//! - `storage`: sample codec and the transactional series store
//! - `ingest`: raw report batches to stored samples
//! - `chart`: aligning series of different length on one axis
//! - `poller`: periodic fetching of the report endpoint
//! - `api`: HTTP endpoints and static dashboard assets
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use reportchart_lib::core::ConfigBuilder;
//! use reportchart_lib::Application;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigBuilder::new()
//!         .url("http://127.0.0.1:8080/report")
//!         .build()?;
//!     let app = Application::new(config)?;
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod api;
pub mod application;
pub mod chart;
pub mod cli;
pub mod core;
pub mod ingest;
pub mod poller;
pub mod storage;

// Re-export core types for convenience
pub use crate::application::Application;
pub use crate::core::{Config, ReportError, Result};
