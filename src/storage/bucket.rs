//! Series store backed by a single redb table.

use super::{codec, SeriesStore};
use crate::core::{Result, Sample, Series};
use redb::{Database, ReadableTable, TableDefinition};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

/// Encoded series keyed by series name.
const REPORT_BUCKET: TableDefinition<&str, &[u8]> = TableDefinition::new("report_bucket");

/// Series store over an embedded redb database file.
///
/// Cloning is cheap and every clone shares the same database handle.
#[derive(Clone)]
pub struct RedbSeriesStore {
    db: Arc<Database>,
}

impl RedbSeriesStore {
    /// Open the database at `path`, creating the file and the bucket if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = Database::create(path)?;

        let txn = db.begin_write()?;
        txn.open_table(REPORT_BUCKET)?;
        txn.commit()?;

        tracing::info!("Opened series store at {}", path.display());
        Ok(Self { db: Arc::new(db) })
    }

    #[cfg(test)]
    pub(crate) fn put_raw(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(REPORT_BUCKET)?;
            table.insert(name, bytes)?;
        }
        txn.commit()?;
        Ok(())
    }
}

impl SeriesStore for RedbSeriesStore {
    fn get(&self, name: &str) -> Result<Series> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(REPORT_BUCKET)?;

        match table.get(name)? {
            Some(bytes) => Ok(Series::from(codec::decode(bytes.value())?)),
            None => Ok(Series::new()),
        }
    }

    fn append(&self, name: &str, sample: Sample) -> Result<()> {
        let txn = self.db.begin_write()?;
        let len = {
            let mut table = txn.open_table(REPORT_BUCKET)?;

            let mut samples = match table.get(name)? {
                Some(existing) => codec::decode(existing.value())?,
                None => Vec::new(),
            };
            samples.push(sample);

            let encoded = codec::encode(&samples)?;
            table.insert(name, encoded.as_slice())?;
            samples.len()
        };
        // Dropping an uncommitted transaction aborts it, so early returns above leave the bucket untouched.
        txn.commit()?;

        tracing::trace!("Appended sample to '{}' ({} samples)", name, len);
        Ok(())
    }

    fn get_many(&self, names: &[String]) -> Result<BTreeMap<String, Series>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(REPORT_BUCKET)?;

        let mut selected = BTreeMap::new();
        for name in names {
            let series = match table.get(name.as_str())? {
                Some(bytes) => Series::from(codec::decode(bytes.value())?),
                None => Series::new(),
            };
            selected.insert(name.clone(), series);
        }
        Ok(selected)
    }

    fn list_all(&self) -> Result<BTreeMap<String, Series>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(REPORT_BUCKET)?;

        let mut all = BTreeMap::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let samples = codec::decode(value.value())?;
            all.insert(key.value().to_string(), Series::from(samples));
        }
        Ok(all)
    }

    fn list_names(&self) -> Result<BTreeSet<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(REPORT_BUCKET)?;

        let mut names = BTreeSet::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            names.insert(key.value().to_string());
        }
        Ok(names)
    }

    fn clear(&self) -> Result<()> {
        let txn = self.db.begin_write()?;
        txn.delete_table(REPORT_BUCKET)?;
        txn.open_table(REPORT_BUCKET)?;
        txn.commit()?;

        tracing::info!("Cleared all stored series");
        Ok(())
    }
}
