use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::ephemeris::Ephemeris;
use crate::geo::ObserverLocation;
use crate::propagator::ObjectIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum EventKind {
    Rise,
    Culminate,
    Set,
}

impl EventKind {
    pub fn code(&self) -> u8 {
        match self {
            EventKind::Rise => 0,
            EventKind::Culminate => 1,
            EventKind::Set => 2,
        }
    }
}

/// One threshold crossing or culmination seen from an observer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElevationCrossing {
    pub epoch: DateTime<Utc>,
    pub kind: EventKind,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

/// Chronological crossings for one object, observer and window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Crossings {
    events: Vec<ElevationCrossing>,
}

impl Crossings {
    pub fn from_events(mut events: Vec<ElevationCrossing>) -> Self {
        events.sort_by_key(|e| e.epoch);
        Self { events }
    }

    pub fn events(&self) -> &[ElevationCrossing] {
        &self.events
    }

    pub fn epochs(&self) -> Vec<DateTime<Utc>> {
        self.events.iter().map(|e| e.epoch).collect()
    }

    /// Event codes, 0 rise, 1 culminate, 2 set
    pub fn kinds(&self) -> Vec<u8> {
        self.events.iter().map(|e| e.kind.code()).collect()
    }

    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &ElevationCrossing> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

/// A complete pass of one object over one observer.
#[derive(Debug, Clone, Serialize)]
pub struct TransitEvent {
    pub identity: ObjectIdentity,
    pub observer: ObserverLocation,
    pub rise: ElevationCrossing,
    pub culminate: ElevationCrossing,
    pub set: ElevationCrossing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ephemeris: Option<Ephemeris>,
}

impl TransitEvent {
    pub fn rise_time(&self) -> DateTime<Utc> {
        self.rise.epoch
    }

    pub fn culminate_time(&self) -> DateTime<Utc> {
        self.culminate.epoch
    }

    pub fn set_time(&self) -> DateTime<Utc> {
        self.set.epoch
    }

    pub fn duration(&self) -> Duration {
        self.set.epoch - self.rise.epoch
    }

    pub fn max_elevation_deg(&self) -> f64 {
        self.culminate.elevation_deg
    }

    pub fn is_populated(&self) -> bool {
        self.ephemeris.is_some()
    }
}
