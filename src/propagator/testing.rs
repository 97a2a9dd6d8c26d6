//! Deterministic propagators for unit tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use nalgebra::Vector3;

use crate::geo::{EARTH_RADIUS_KM, MU_EARTH_KM3_S2};
use crate::propagator::{
    Classification, MeanElements, ObjectIdentity, PropagationError, PropagationStatus,
    Propagator, StateVector,
};

pub(crate) fn reference_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap()
}

/// Two-body circular orbit
#[derive(Debug, Clone)]
pub(crate) struct CircularOrbit {
    identity: ObjectIdentity,
    epoch: DateTime<Utc>,
    radius_km: f64,
    inclination_rad: f64,
    phase_rad: f64,
    status: PropagationStatus,
    failing: bool,
}

impl CircularOrbit {
    pub(crate) fn new(norad_id: u32, altitude_km: f64, inclination_deg: f64) -> Self {
        Self {
            identity: ObjectIdentity {
                name: format!("TEST-{}", norad_id),
                norad_id,
                international_designator: None,
                classification: Classification::Unclassified,
            },
            epoch: reference_epoch(),
            radius_km: EARTH_RADIUS_KM + altitude_km,
            inclination_rad: inclination_deg.to_radians(),
            phase_rad: 0.0,
            status: PropagationStatus::NoError,
            failing: false,
        }
    }

    pub(crate) fn with_epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.epoch = epoch;
        self
    }

    pub(crate) fn with_phase_deg(mut self, phase_deg: f64) -> Self {
        self.phase_rad = phase_deg.to_radians();
        self
    }

    pub(crate) fn with_status(mut self, status: PropagationStatus) -> Self {
        self.status = status;
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub(crate) fn shared(self) -> Arc<dyn Propagator> {
        Arc::new(self)
    }

    fn mean_motion_rad_s(&self) -> f64 {
        (MU_EARTH_KM3_S2 / self.radius_km.powi(3)).sqrt()
    }

    /// Tilt the orbital plane about the node line on +x
    fn rotate(&self, v: Vector3<f64>) -> Vector3<f64> {
        let (sin_i, cos_i) = self.inclination_rad.sin_cos();
        Vector3::new(v.x, v.y * cos_i, v.y * sin_i)
    }
}

impl Propagator for CircularOrbit {
    fn identity(&self) -> &ObjectIdentity {
        &self.identity
    }

    fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    fn mean_elements(&self) -> MeanElements {
        let rev_per_day = self.mean_motion_rad_s() * 86_400.0 / std::f64::consts::TAU;
        MeanElements::new(
            rev_per_day,
            0.0,
            self.inclination_rad.to_degrees(),
            0.0,
            0.0,
        )
    }

    fn status(&self) -> PropagationStatus {
        self.status
    }

    fn state_at(&self, epoch: DateTime<Utc>) -> Result<StateVector, PropagationError> {
        if self.failing {
            return Err(PropagationError::Sgp4("simulated failure".into()));
        }
        let dt = (epoch - self.epoch).num_milliseconds() as f64 / 1000.0;
        let n = self.mean_motion_rad_s();
        let u = self.phase_rad + n * dt;
        let (sin_u, cos_u) = u.sin_cos();
        let position = self.rotate(Vector3::new(cos_u, sin_u, 0.0) * self.radius_km);
        let velocity = self.rotate(Vector3::new(-sin_u, cos_u, 0.0) * self.radius_km * n);
        Ok(StateVector {
            epoch,
            position_km: position,
            velocity_km_s: velocity,
        })
    }
}
