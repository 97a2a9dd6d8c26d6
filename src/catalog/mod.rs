//! Catalog retrieval and quality control.

mod cache;
mod error;
mod filter;
mod presets;
mod source;

pub use cache::{Catalog, CatalogCache, DEFAULT_CACHE_TTL};
pub use error::CatalogError;
pub use filter::{
    AltitudeBounds, CatalogFilter, FilterOutcome, FilterThresholds, OrbitClass, RejectReason,
    Rejection,
};
pub use presets::{constellation_min_elevation, CONSTELLATION_MIN_ELEVATIONS};
pub use source::{CatalogSource, TleDirectorySource};
