//! Names excluded from ingestion.

use crate::core::{ReportError, Result};
use std::collections::HashSet;
use std::path::Path;

/// Set of series names the ingestion step skips.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    names: HashSet<String>,
}

impl IgnoreList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of names from `path`.
    ///
    /// A missing file yields an empty list unless `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                tracing::info!("No ignore file at {}, ignoring nothing", path.display());
                return Ok(Self::new());
            },
            Err(e) => {
                return Err(ReportError::config(format!(
                    "Failed to read ignore file {}: {}",
                    path.display(),
                    e
                )))
            },
        };

        let list = Self::from_json(&content)?;
        tracing::info!("Ignoring {} names from {}", list.len(), path.display());
        Ok(list)
    }

    /// Parse a JSON array of names.
    pub fn from_json(json: &str) -> Result<Self> {
        let names: Vec<String> = serde_json::from_str(json)?;
        Ok(names.into_iter().collect())
    }

    /// True when `name` must not be ingested
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of ignored names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when nothing is ignored
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<String> for IgnoreList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
