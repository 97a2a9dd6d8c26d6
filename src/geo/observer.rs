use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::Serialize;
use thiserror::Error;

use super::frames::{self, LookAngles};
use crate::propagator::{PropagationError, Propagator, StateVector};

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("latitude {0} outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} outside [-180, 180]")]
    Longitude(f64),
    #[error("invalid coordinates {0:?}, expected \"lat, lon\"")]
    Coordinates(String),
    #[error("unknown location {0:?}")]
    Unknown(String),
}

/// Fixed point on the WGS-84 ellipsoid. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObserverLocation {
    label: String,
    latitude_deg: f64,
    longitude_deg: f64,
    altitude_m: f64,
}

impl ObserverLocation {
    pub fn new(
        label: impl Into<String>,
        latitude_deg: f64,
        longitude_deg: f64,
        altitude_m: f64,
    ) -> Result<Self, LocationError> {
        if !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(LocationError::Latitude(latitude_deg));
        }
        if !(-180.0..=180.0).contains(&longitude_deg) {
            return Err(LocationError::Longitude(longitude_deg));
        }
        Ok(Self {
            label: label.into(),
            latitude_deg,
            longitude_deg,
            altitude_m,
        })
    }

    pub fn from_coordinates(
        label: impl Into<String>,
        coordinates: &str,
        altitude_m: Option<f64>,
    ) -> Result<Self, LocationError> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            return Err(LocationError::Coordinates(coordinates.to_string()));
        }
        let lat = parts[0]
            .parse()
            .map_err(|_| LocationError::Coordinates(coordinates.to_string()))?;
        let lon = parts[1]
            .parse()
            .map_err(|_| LocationError::Coordinates(coordinates.to_string()))?;
        Self::new(label, lat, lon, altitude_m.unwrap_or(0.0))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn latitude_deg(&self) -> f64 {
        self.latitude_deg
    }

    pub fn longitude_deg(&self) -> f64 {
        self.longitude_deg
    }

    pub fn altitude_m(&self) -> f64 {
        self.altitude_m
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> Vector3<f64> {
        frames::geodetic_to_ecef(self.lat_rad(), self.lon_rad(), self.altitude_m / 1000.0)
    }

    /// Look angles to a target already expressed in ECEF
    pub fn look_angles_ecef(&self, target_ecef_km: &Vector3<f64>) -> LookAngles {
        let dr = target_ecef_km - self.position_ecef_km();
        let enu = frames::ecef_to_enu(&dr, self.lat_rad(), self.lon_rad());
        frames::look_angles_from_enu(&enu)
    }

    /// Look angles to an inertial (TEME) state
    pub fn look_angles(&self, state: &StateVector) -> LookAngles {
        let gmst = frames::gmst(state.epoch);
        let ecef = frames::teme_to_ecef_position(&state.position_km, gmst);
        self.look_angles_ecef(&ecef)
    }

    pub fn look_at(
        &self,
        object: &dyn Propagator,
        epoch: DateTime<Utc>,
    ) -> Result<LookAngles, PropagationError> {
        Ok(self.look_angles(&object.state_at(epoch)?))
    }
}

impl std::fmt::Display for ObserverLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({:.3}, {:.3})",
            self.label, self.latitude_deg, self.longitude_deg
        )
    }
}
