//! Durable series storage.
//!
//! This module provides the store interface, its redb implementation and
//! the binary codec used for the stored values.

use std::sync::Arc;

pub mod backend;
pub mod bucket;
pub mod codec;

// Re-export commonly used types
pub use backend::SeriesStore;
pub use bucket::RedbSeriesStore;

/// Store handle shared by the ingestion side and the query side.
pub type SharedStore = Arc<dyn SeriesStore>;
