//! Common test utilities and fixtures.

#![allow(dead_code)]

use reportchart_lib::core::FieldValue;
use reportchart_lib::ingest::{RawBatch, RawEntry, AVERAGE_FIELD};
use reportchart_lib::storage::{RedbSeriesStore, SharedStore};
use std::sync::Arc;
use tempfile::TempDir;

/// A store on a fresh database file; keep the directory alive for the test.
pub fn temp_store() -> (TempDir, SharedStore) {
    let dir = TempDir::new().unwrap();
    let store = RedbSeriesStore::open(dir.path().join("report.db")).unwrap();
    (dir, Arc::new(store))
}

/// Test fixture builder for raw report batches.
#[derive(Default)]
pub struct TestBatchBuilder {
    batch: RawBatch,
}

impl TestBatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry with the given average and a request count.
    pub fn entry(mut self, name: &str, avg: i64) -> Self {
        let mut fields = RawEntry::new();
        fields.insert(AVERAGE_FIELD.to_string(), FieldValue::Int(avg));
        fields.insert("count".to_string(), FieldValue::Int(1));
        self.batch.insert(name, fields);
        self
    }

    pub fn build(self) -> RawBatch {
        self.batch
    }
}

/// Predicate that ignores nothing.
pub fn no_filter(_: &str) -> bool {
    false
}

/// Macro for building a batch quickly.
#[macro_export]
macro_rules! batch {
    ($($name:expr => $avg:expr),* $(,)?) => {
        TestBatchBuilder::new()$(.entry($name, $avg))*.build()
    };
}
