use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::Serialize;

use crate::geo::LookAngles;
use crate::propagator::StateVector;

/// Position of a sample within its span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum SamplePoint {
    Start,
    Interior,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EphemerisSample {
    pub epoch: DateTime<Utc>,
    pub point: SamplePoint,
    /// Inertial (TEME) position
    pub position_km: Vector3<f64>,
    pub velocity_km_s: Vector3<f64>,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    pub look: Option<LookAngles>,
    pub sunlit: Option<bool>,
}

impl EphemerisSample {
    pub fn state(&self) -> StateVector {
        StateVector {
            epoch: self.epoch,
            position_km: self.position_km,
            velocity_km_s: self.velocity_km_s,
        }
    }
}

/// Ordered samples over one span
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ephemeris {
    samples: Vec<EphemerisSample>,
    topocentric: bool,
}

impl Ephemeris {
    pub fn new(samples: Vec<EphemerisSample>, topocentric: bool) -> Self {
        Self {
            samples,
            topocentric,
        }
    }

    pub fn samples(&self) -> &[EphemerisSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn epochs(&self) -> Vec<DateTime<Utc>> {
        self.samples.iter().map(|s| s.epoch).collect()
    }

    pub fn states(&self) -> Vec<StateVector> {
        self.samples.iter().map(EphemerisSample::state).collect()
    }

    /// Every row present: `n` samples, each with look angles when an
    /// observer was supplied.
    pub fn is_populated(&self, n: usize) -> bool {
        self.samples.len() == n
            && (!self.topocentric || self.samples.iter().all(|s| s.look.is_some()))
    }

    pub fn sunlit_fraction(&self) -> Option<f64> {
        let flags: Vec<bool> = self.samples.iter().filter_map(|s| s.sunlit).collect();
        if flags.is_empty() {
            return None;
        }
        let lit = flags.iter().filter(|&&lit| lit).count();
        Some(lit as f64 / flags.len() as f64)
    }
}
