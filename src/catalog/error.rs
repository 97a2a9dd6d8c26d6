use thiserror::Error;

use crate::propagator::TleError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog source not found: {0}")]
    SourceNotFound(String),
    #[error("Catalog read error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Tle(#[from] TleError),
    #[error("Catalog fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
