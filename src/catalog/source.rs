use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::CatalogError;
use crate::propagator::{self, Propagator};

/// Upstream provider of object batches, addressed by group key.
///
/// A fetch either yields the whole batch or fails; partial catalogs are never
/// returned.
pub trait CatalogSource: Send + Sync {
    fn fetch(&self, key: &str) -> Result<Vec<Arc<dyn Propagator>>, CatalogError>;
}

/// Reads `<dir>/<key>.tle` (or `.txt`) files
pub struct TleDirectorySource {
    tle_dir: PathBuf,
}

impl TleDirectorySource {
    pub fn new(tle_dir: PathBuf) -> Self {
        Self { tle_dir }
    }

    fn locate(&self, key: &str) -> Result<PathBuf, CatalogError> {
        if !self.tle_dir.is_dir() {
            return Err(CatalogError::SourceNotFound(
                self.tle_dir.display().to_string(),
            ));
        }
        ["tle", "txt"]
            .iter()
            .map(|ext| self.tle_dir.join(format!("{}.{}", key, ext)))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                CatalogError::SourceNotFound(format!("{}/{}", self.tle_dir.display(), key))
            })
    }
}

impl CatalogSource for TleDirectorySource {
    fn fetch(&self, key: &str) -> Result<Vec<Arc<dyn Propagator>>, CatalogError> {
        let path = self.locate(key)?;
        let content = fs::read_to_string(&path)?;
        let filename = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let objects = propagator::parse_objects(&content, &filename)?;
        log::info!("Loaded {} objects from {}", objects.len(), path.display());

        Ok(objects
            .into_iter()
            .map(|object| Arc::new(object) as Arc<dyn Propagator>)
            .collect())
    }
}
