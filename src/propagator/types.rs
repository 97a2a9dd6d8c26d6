use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::Serialize;

use crate::geo::{EARTH_RADIUS_KM, MU_EARTH_KM3_S2};

/// Catalog identity of an orbiting object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectIdentity {
    pub name: String,
    pub norad_id: u32,
    pub international_designator: Option<String>,
    pub classification: Classification,
}

impl std::fmt::Display for ObjectIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.norad_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
pub enum Classification {
    Unclassified,
    Classified,
    Secret,
}

impl From<&sgp4::Classification> for Classification {
    fn from(value: &sgp4::Classification) -> Self {
        match value {
            sgp4::Classification::Unclassified => Classification::Unclassified,
            sgp4::Classification::Classified => Classification::Classified,
            sgp4::Classification::Secret => Classification::Secret,
        }
    }
}

/// Slowly varying orbit parameters taken from the element set
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeanElements {
    /// Revolutions per day
    pub mean_motion: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
    pub right_ascension_deg: f64,
    pub argument_of_perigee_deg: f64,
    pub semi_major_axis_km: f64,
}

impl MeanElements {
    pub fn new(
        mean_motion: f64,
        eccentricity: f64,
        inclination_deg: f64,
        right_ascension_deg: f64,
        argument_of_perigee_deg: f64,
    ) -> Self {
        Self {
            mean_motion,
            eccentricity,
            inclination_deg,
            right_ascension_deg,
            argument_of_perigee_deg,
            semi_major_axis_km: semi_major_axis_km(mean_motion),
        }
    }

    /// Mean altitude above the equatorial radius. Non-positive for decayed
    /// or malformed element sets.
    pub fn altitude_km(&self) -> f64 {
        self.semi_major_axis_km - EARTH_RADIUS_KM
    }
}

fn semi_major_axis_km(mean_motion_rev_day: f64) -> f64 {
    if mean_motion_rev_day <= 0.0 || !mean_motion_rev_day.is_finite() {
        return 0.0;
    }
    let n_rad_s = mean_motion_rev_day * std::f64::consts::TAU / 86_400.0;
    (MU_EARTH_KM3_S2 / (n_rad_s * n_rad_s)).cbrt()
}

/// Propagation error taxonomy reported by SGP4-class propagators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PropagationStatus {
    NoError,
    MeanEccentricity,
    NegativeMeanMotion,
    PerturbedEccentricity,
    SemiLatusRectum,
    Unused,
    Decayed,
}

impl PropagationStatus {
    pub fn code(&self) -> u8 {
        match self {
            PropagationStatus::NoError => 0,
            PropagationStatus::MeanEccentricity => 1,
            PropagationStatus::NegativeMeanMotion => 2,
            PropagationStatus::PerturbedEccentricity => 3,
            PropagationStatus::SemiLatusRectum => 4,
            PropagationStatus::Unused => 5,
            PropagationStatus::Decayed => 6,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => PropagationStatus::NoError,
            1 => PropagationStatus::MeanEccentricity,
            2 => PropagationStatus::NegativeMeanMotion,
            3 => PropagationStatus::PerturbedEccentricity,
            4 => PropagationStatus::SemiLatusRectum,
            5 => PropagationStatus::Unused,
            6 => PropagationStatus::Decayed,
            _ => return None,
        })
    }

    pub fn is_ok(&self) -> bool {
        *self == PropagationStatus::NoError
    }

    pub fn description(&self) -> &'static str {
        match self {
            PropagationStatus::NoError => "No error.",
            PropagationStatus::MeanEccentricity => {
                "Mean eccentricity is outside the range 0 ≤ e < 1."
            }
            PropagationStatus::NegativeMeanMotion => "Mean motion has fallen below zero.",
            PropagationStatus::PerturbedEccentricity => {
                "Perturbed eccentricity is outside the range 0 ≤ e ≤ 1."
            }
            PropagationStatus::SemiLatusRectum => {
                "Length of the orbit's semi-latus rectum has fallen below zero."
            }
            PropagationStatus::Unused => "N/A: Not used anymore.",
            PropagationStatus::Decayed => "Orbit has decayed: the computed position is underground.",
        }
    }
}

impl std::fmt::Display for PropagationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "code {} ({})", self.code(), self.description())
    }
}

impl From<&sgp4::Error> for PropagationStatus {
    fn from(err: &sgp4::Error) -> Self {
        match err {
            sgp4::Error::OutOfRangeEccentricity { .. } => PropagationStatus::MeanEccentricity,
            sgp4::Error::OutOfRangePerturbedEccentricity { .. } => {
                PropagationStatus::PerturbedEccentricity
            }
            sgp4::Error::NegativeSemiLatusRectum { .. } => PropagationStatus::SemiLatusRectum,
        }
    }
}

/// Inertial (TEME) state at one epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateVector {
    pub epoch: DateTime<Utc>,
    pub position_km: Vector3<f64>,
    pub velocity_km_s: Vector3<f64>,
}
