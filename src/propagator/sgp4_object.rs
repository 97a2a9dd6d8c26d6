use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use sgp4::{Constants, Elements, MinutesSinceEpoch};

use crate::geo::EARTH_RADIUS_KM;
use crate::propagator::error::PropagationError;
use crate::propagator::types::{
    Classification, MeanElements, ObjectIdentity, PropagationStatus, StateVector,
};
use crate::propagator::Propagator;

/// `Propagator` backed by the `sgp4` crate.
pub struct Sgp4Object {
    identity: ObjectIdentity,
    elements: Elements,
    constants: Option<Constants>,
    epoch: DateTime<Utc>,
    mean: MeanElements,
    status: PropagationStatus,
}

impl Sgp4Object {
    /// Wraps an element set. Never fails: an element set SGP4 cannot
    /// initialise yields an object with a non-zero status whose state
    /// queries all fail.
    pub fn from_elements(elements: Elements) -> Self {
        let identity = ObjectIdentity {
            name: elements
                .object_name
                .clone()
                .unwrap_or_else(|| format!("NORAD {}", elements.norad_id)),
            norad_id: elements.norad_id as u32,
            international_designator: elements.international_designator.clone(),
            classification: Classification::from(&elements.classification),
        };
        let epoch = elements.datetime.and_utc();
        let mean = MeanElements::new(
            elements.mean_motion,
            elements.eccentricity,
            elements.inclination,
            elements.right_ascension,
            elements.argument_of_perigee,
        );

        let (constants, status) = match Constants::from_elements(&elements) {
            Ok(constants) => {
                let status = status_at_epoch(&constants);
                (Some(constants), status)
            }
            Err(e) => {
                log::debug!("SGP4 initialisation failed for {}: {}", identity, e);
                (None, status_from_elements(&elements))
            }
        };

        Self {
            identity,
            elements,
            constants,
            epoch,
            mean,
            status,
        }
    }
}

fn status_at_epoch(constants: &Constants) -> PropagationStatus {
    match constants.propagate(MinutesSinceEpoch(0.0)) {
        Ok(prediction) => {
            if Vector3::from(prediction.position).norm() < EARTH_RADIUS_KM {
                PropagationStatus::Decayed
            } else {
                PropagationStatus::NoError
            }
        }
        Err(e) => PropagationStatus::from(&e),
    }
}

fn status_from_elements(elements: &Elements) -> PropagationStatus {
    if !(0.0..1.0).contains(&elements.eccentricity) {
        PropagationStatus::MeanEccentricity
    } else {
        PropagationStatus::NegativeMeanMotion
    }
}

impl Propagator for Sgp4Object {
    fn identity(&self) -> &ObjectIdentity {
        &self.identity
    }

    fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    fn mean_elements(&self) -> MeanElements {
        self.mean
    }

    fn status(&self) -> PropagationStatus {
        self.status
    }

    fn state_at(&self, epoch: DateTime<Utc>) -> Result<StateVector, PropagationError> {
        let constants = self
            .constants
            .as_ref()
            .ok_or_else(|| PropagationError::Unavailable {
                object: self.identity.to_string(),
                status: self.status,
            })?;

        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&epoch.naive_utc())
            .map_err(|e| PropagationError::Epoch(e.to_string()))?;

        let prediction = constants
            .propagate(minutes)
            .map_err(|e| PropagationError::Sgp4(e.to_string()))?;

        Ok(StateVector {
            epoch,
            position_km: Vector3::from(prediction.position),
            velocity_km_s: Vector3::from(prediction.velocity),
        })
    }
}
