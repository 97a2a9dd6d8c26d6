use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::deserialize_duration;
use crate::propagator::{MeanElements, ObjectIdentity, PropagationStatus, Propagator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
pub enum OrbitClass {
    #[strum(serialize = "LEO")]
    Leo,
    #[strum(serialize = "MEO")]
    Meo,
    #[strum(serialize = "GEO")]
    Geo,
    #[strum(serialize = "HEO")]
    Heo,
    Other,
}

impl OrbitClass {
    pub fn classify(elements: &MeanElements) -> Self {
        let n = elements.mean_motion;
        if elements.eccentricity > 0.25 {
            OrbitClass::Heo
        } else if (0.99..=1.01).contains(&n) {
            OrbitClass::Geo
        } else if (1.8..=2.39).contains(&n) {
            OrbitClass::Meo
        } else if n > 11.25 {
            OrbitClass::Leo
        } else {
            OrbitClass::Other
        }
    }
}

/// Nominal upper altitude (km) per orbit class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AltitudeBounds {
    pub leo_km: f64,
    pub meo_km: f64,
    pub geo_km: f64,
    pub heo_km: f64,
    pub other_km: f64,
}

impl Default for AltitudeBounds {
    fn default() -> Self {
        Self {
            leo_km: 2_000.0,
            meo_km: 35_786.0,
            geo_km: 35_786.0,
            heo_km: 100_000.0,
            other_km: 50_000.0,
        }
    }
}

impl AltitudeBounds {
    pub fn bound_km(&self, class: OrbitClass) -> f64 {
        match class {
            OrbitClass::Leo => self.leo_km,
            OrbitClass::Meo => self.meo_km,
            OrbitClass::Geo => self.geo_km,
            OrbitClass::Heo => self.heo_km,
            OrbitClass::Other => self.other_km,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterThresholds {
    #[serde(deserialize_with = "deserialize_duration")]
    pub max_epoch_age: Duration,
    pub altitude_bounds: AltitudeBounds,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            max_epoch_age: Duration::days(5),
            altitude_bounds: AltitudeBounds::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    PropagationError(PropagationStatus),
    ImplausibleAltitude { altitude_km: f64, bound_km: f64 },
    StaleEpoch { age: Duration },
}

impl RejectReason {
    /// Stable key used when tallying rejections
    pub fn kind(&self) -> &'static str {
        match self {
            RejectReason::PropagationError(_) => "propagation_error",
            RejectReason::ImplausibleAltitude { .. } => "implausible_altitude",
            RejectReason::StaleEpoch { .. } => "stale_epoch",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::PropagationError(status) => write!(f, "propagation error {}", status),
            RejectReason::ImplausibleAltitude {
                altitude_km,
                bound_km,
            } => write!(
                f,
                "implausible altitude {:.1} km (limit {:.0} km)",
                altitude_km,
                2.0 * bound_km
            ),
            RejectReason::StaleEpoch { age } => write!(
                f,
                "stale epoch, {:.1} days old",
                age.num_seconds() as f64 / 86_400.0
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rejection {
    pub identity: ObjectIdentity,
    pub reason: RejectReason,
}

pub struct FilterOutcome {
    pub accepted: Vec<Arc<dyn Propagator>>,
    pub rejected: Vec<Rejection>,
}

impl FilterOutcome {
    pub fn total_queried(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }

    pub fn dropped_by_reason(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for rejection in &self.rejected {
            *counts.entry(rejection.reason.kind()).or_insert(0) += 1;
        }
        counts
    }
}

/// Quality gate applied to every catalog batch before analysis.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    thresholds: FilterThresholds,
}

impl CatalogFilter {
    pub fn new(thresholds: FilterThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &FilterThresholds {
        &self.thresholds
    }

    /// First failing check for one object, in status, altitude, staleness order
    pub fn check(&self, object: &dyn Propagator, now: DateTime<Utc>) -> Option<RejectReason> {
        let status = object.status();
        if !status.is_ok() {
            return Some(RejectReason::PropagationError(status));
        }

        let elements = object.mean_elements();
        let altitude_km = elements.altitude_km();
        let bound_km = self
            .thresholds
            .altitude_bounds
            .bound_km(OrbitClass::classify(&elements));
        if !(altitude_km > 0.0 && altitude_km < 2.0 * bound_km) {
            return Some(RejectReason::ImplausibleAltitude {
                altitude_km,
                bound_km,
            });
        }

        let age = now - object.epoch();
        if age > self.thresholds.max_epoch_age {
            return Some(RejectReason::StaleEpoch { age });
        }

        None
    }

    pub fn filter(&self, objects: Vec<Arc<dyn Propagator>>, now: DateTime<Utc>) -> FilterOutcome {
        let mut accepted = Vec::with_capacity(objects.len());
        let mut rejected = Vec::new();

        for object in objects {
            match self.check(object.as_ref(), now) {
                None => accepted.push(object),
                Some(reason) => {
                    log::info!(
                        "Dropping {}: {} ({} accepted, {} rejected so far)",
                        object.identity(),
                        reason,
                        accepted.len(),
                        rejected.len() + 1
                    );
                    rejected.push(Rejection {
                        identity: object.identity().clone(),
                        reason,
                    });
                }
            }
        }

        log::info!(
            "Catalog filter kept {} of {} objects",
            accepted.len(),
            accepted.len() + rejected.len()
        );

        FilterOutcome { accepted, rejected }
    }
}
