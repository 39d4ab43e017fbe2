//! Turning raw report batches into stored samples.
//!
//! A batch maps series names to the fields reported for one tick. Every
//! accepted entry becomes exactly one sample appended to its series, all
//! stamped with the same accept time.

pub mod ignore;

pub use ignore::IgnoreList;

use crate::core::{ExtraFields, FieldValue, ReportError, Result, Sample};
use crate::storage::SharedStore;
use std::collections::BTreeMap;

/// Report field holding the charted average.
pub const AVERAGE_FIELD: &str = "avg";

/// Report field holding the series name.
pub const NAME_FIELD: &str = "name";

/// Fields reported for one series in one tick.
pub type RawEntry = BTreeMap<String, FieldValue>;

/// One tick worth of raw report data, keyed by series name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    entries: BTreeMap<String, RawEntry>,
}

impl RawBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the fields reported for `name`, replacing earlier ones.
    pub fn insert(&mut self, name: impl Into<String>, entry: RawEntry) {
        self.entries.insert(name.into(), entry);
    }

    /// Builder-style insert
    pub fn with_entry(mut self, name: impl Into<String>, entry: RawEntry) -> Self {
        self.insert(name, entry);
        self
    }

    /// Number of named entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the batch has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawEntry)> {
        self.entries.iter()
    }

    /// Build a batch from an upstream report document.
    ///
    /// The report lists one object per endpoint under `http.used`, each
    /// carrying its `name` alongside the measured fields:
    ///
    /// ```json
    /// {"http": {"used": [{"name": "/api/users", "avg": 12, "count": 31}]}}
    /// ```
    ///
    /// Items without a string name are skipped.
    pub fn from_report(report: &serde_json::Value) -> Self {
        let mut batch = RawBatch::new();

        let Some(items) = report.pointer("/http/used").and_then(|v| v.as_array()) else {
            tracing::debug!("Report has no http.used list");
            return batch;
        };

        for item in items {
            let Some(fields) = item.as_object() else {
                tracing::warn!("Skipping non-object report item: {}", item);
                continue;
            };
            let Some(name) = fields.get(NAME_FIELD).and_then(|v| v.as_str()) else {
                tracing::warn!("Skipping report item without a name");
                continue;
            };

            let entry: RawEntry = fields
                .iter()
                .filter(|(key, _)| key.as_str() != NAME_FIELD)
                .filter_map(|(key, value)| FieldValue::from_json(value).map(|v| (key.clone(), v)))
                .collect();

            if batch.entries.contains_key(name) {
                tracing::debug!("Report lists '{}' more than once, keeping the last item", name);
            }
            batch.insert(name, entry);
        }

        batch
    }
}

/// Outcome of a successful ingest call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Samples appended to the store
    pub accepted: usize,
    /// Entries skipped by the ignore predicate
    pub ignored: usize,
}

/// Appends raw batches to the series store.
#[derive(Clone)]
pub struct Ingestor {
    store: SharedStore,
}

impl Ingestor {
    /// Create an ingestor writing to `store`.
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Store handle used by this ingestor.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Ingest `batch` stamped with the current wall-clock time.
    pub fn ingest<F>(&self, batch: &RawBatch, ignore: F) -> Result<IngestReport>
    where
        F: Fn(&str) -> bool,
    {
        self.ingest_at(batch, ignore, chrono::Utc::now().timestamp_millis())
    }

    /// Ingest `batch` with every accepted sample stamped `timestamp_ms`.
    ///
    /// Stops at the first failing append; samples appended before it stay
    /// stored and the rest of the batch is not attempted.
    pub fn ingest_at<F>(&self, batch: &RawBatch, ignore: F, timestamp_ms: i64) -> Result<IngestReport>
    where
        F: Fn(&str) -> bool,
    {
        if batch.is_empty() {
            return Err(ReportError::EmptyBatch);
        }

        let mut report = IngestReport::default();
        for (name, entry) in batch.iter() {
            if ignore(name) {
                report.ignored += 1;
                continue;
            }

            let sample = build_sample(name, entry, timestamp_ms);
            self.store.append(name, sample)?;
            report.accepted += 1;
        }

        tracing::debug!(
            "Ingested batch at {}: {} accepted, {} ignored",
            timestamp_ms,
            report.accepted,
            report.ignored
        );
        Ok(report)
    }
}

fn build_sample(name: &str, entry: &RawEntry, timestamp_ms: i64) -> Sample {
    let value = match entry.get(AVERAGE_FIELD) {
        Some(field) => field.as_i64().unwrap_or_else(|| {
            tracing::warn!("Non-numeric {} '{}' for '{}', storing 0", AVERAGE_FIELD, field, name);
            0
        }),
        None => {
            tracing::warn!("Missing {} for '{}', storing 0", AVERAGE_FIELD, name);
            0
        },
    };

    let extra: ExtraFields = entry
        .iter()
        .filter(|(key, _)| key.as_str() != AVERAGE_FIELD)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Sample {
        name: name.to_string(),
        timestamp: timestamp_ms,
        value,
        extra,
    }
}
