//! Path-keyed cache of the loaded [`Dataset`].
//!
//! A front-end re-runs its filters and charts on every interaction. The cache
//! keeps the base dataset for the current path, so the file is read again only
//! when the path changes. It is owned by the caller; nothing in the library
//! consults it on its own.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::{Dataset, Result};

/// Holds the dataset of the most recently loaded path.
#[derive(Debug, Clone, Default)]
pub struct DatasetCache {
    entry: Option<(PathBuf, Arc<Dataset>)>,
}

impl DatasetCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The path of the cached dataset, if any.
    pub fn cached_path(&self) -> Option<&Path> {
        self.entry.as_ref().map(|(path, _)| path.as_path())
    }

    /// Returns the cached dataset for `path`, or loads it with `load` and
    /// caches the result, replacing the dataset of any other path.
    ///
    /// # Errors
    ///
    /// Returns the error of `load`. The cache is left empty in that case.
    pub fn get_or_load<F>(&mut self, path: impl AsRef<Path>, load: F) -> Result<Arc<Dataset>>
    where
        F: FnOnce(&Path) -> Result<Dataset>,
    {
        let path = path.as_ref();
        if let Some((cached, dataset)) = &self.entry {
            if cached == path {
                debug!("dataset cache hit for {}", path.display());
                return Ok(Arc::clone(dataset));
            }
        }

        debug!("dataset cache miss for {}", path.display());
        self.entry = None;
        let dataset = Arc::new(load(path)?);
        self.entry = Some((path.to_path_buf(), Arc::clone(&dataset)));
        Ok(dataset)
    }

    /// Like [`DatasetCache::get_or_load`] with the default CSV loader.
    ///
    /// # Errors
    ///
    /// See [`crate::csv::CsvLoader::load`].
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<Arc<Dataset>> {
        self.get_or_load(path, |path| crate::csv::load(path))
    }

    /// Drops the cached dataset.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
