//! Per-path dataset memoization.

use super::{load_csv, Dataset, DatasetSchema};
use crate::error::DataLoadError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Loaded datasets keyed by the path they were read from.
///
/// Entries live for the lifetime of the cache; failed loads are not stored.
/// The schema is assumed fixed per path.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<PathBuf, Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `path`, reading it on first use.
    pub fn load(&self, path: &Path, schema: &DatasetSchema) -> Result<Arc<Dataset>, DataLoadError> {
        if let Some(dataset) = self.get(path) {
            debug!("Dataset cache hit: {}", path.display());
            return Ok(dataset);
        }

        let dataset = Arc::new(load_csv(path, schema)?);

        // Another caller may have loaded the same path meanwhile; keep the first.
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let cached = entries.entry(path.to_path_buf()).or_insert(dataset).clone();
        debug!("Dataset cache holds {} entries", entries.len());
        Ok(cached)
    }

    /// Cached dataset for `path`, if any.
    pub fn get(&self, path: &Path) -> Option<Arc<Dataset>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_same_path_returns_same_dataset() {
        let file = write_csv("OverTime,Attrition\nYes,Yes\nNo,No\n");
        let cache = DatasetCache::new();
        let schema = DatasetSchema::default();

        let first = cache.load(file.path(), &schema).unwrap();
        let second = cache.load(file.path(), &schema).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.get(file.path()).is_some());
    }

    #[test]
    fn test_cached_dataset_survives_file_removal() {
        let file = write_csv("OverTime,Attrition\nYes,Yes\nNo,No\n");
        let path = file.path().to_path_buf();
        let cache = DatasetCache::new();
        let schema = DatasetSchema::default();

        cache.load(&path, &schema).unwrap();
        drop(file);
        assert!(!path.exists());

        let dataset = cache.load(&path, &schema).unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let cache = DatasetCache::new();
        let path = Path::new("/nonexistent/hr.csv");
        let result = cache.load(path, &DatasetSchema::default());

        assert!(result.is_err());
        assert!(cache.get(path).is_none());
    }
}
