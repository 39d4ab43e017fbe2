//! Series store trait.

use crate::core::{Result, Sample, Series};
use std::collections::{BTreeMap, BTreeSet};

/// Durable mapping from series name to its append-only samples.
///
/// Every operation runs inside one storage transaction. Implementations
/// serialize writers and give readers a consistent snapshot, so callers
/// never observe a partially written series. A name that was never written
/// reads as an empty series, not as an error.
pub trait SeriesStore: Send + Sync {
    /// Get the series stored under `name`.
    fn get(&self, name: &str) -> Result<Series>;

    /// Append a sample to the end of the series stored under `name`.
    fn append(&self, name: &str, sample: Sample) -> Result<()>;

    /// Snapshot the series stored under each of `names`.
    ///
    /// Only the requested keys are read; names never written map to an
    /// empty series.
    fn get_many(&self, names: &[String]) -> Result<BTreeMap<String, Series>>;

    /// Snapshot every stored series.
    fn list_all(&self) -> Result<BTreeMap<String, Series>>;

    /// Names of all stored series.
    fn list_names(&self) -> Result<BTreeSet<String>>;

    /// Remove every stored series.
    fn clear(&self) -> Result<()>;
}
