//! Narrow capability interface over orbit propagators.
//!
//! Analysis code only ever talks to [`Propagator`]; the SGP4 adapter in
//! [`Sgp4Object`] is the one production implementation.

mod error;
mod sgp4_object;
pub(crate) mod tle;
mod types;

#[cfg(test)]
pub(crate) mod testing;

use chrono::{DateTime, Utc};

pub use error::{PropagationError, TleError};
pub use sgp4_object::Sgp4Object;
pub use tle::parse_objects;
pub use types::{Classification, MeanElements, ObjectIdentity, PropagationStatus, StateVector};

pub trait Propagator: Send + Sync {
    fn identity(&self) -> &ObjectIdentity;

    /// Reference epoch of the element set
    fn epoch(&self) -> DateTime<Utc>;

    fn mean_elements(&self) -> MeanElements;

    fn status(&self) -> PropagationStatus;

    /// Inertial position (km) and velocity (km/s) at `epoch`
    fn state_at(&self, epoch: DateTime<Utc>) -> Result<StateVector, PropagationError>;
}
