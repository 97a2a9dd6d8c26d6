use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::ephemeris::EphemerisSampler;
use crate::geo::ObserverLocation;
use crate::propagator::{ObjectIdentity, PropagationError, Propagator};
use crate::transit::assembler::{assemble_transits, Misalignment};
use crate::transit::detector::ElevationEventDetector;
use crate::transit::types::{Crossings, TransitEvent};

#[derive(Debug, Error)]
#[error("search window end {end} is not after start {start}")]
pub struct InvalidWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl SearchWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidWindow> {
        if end <= start {
            return Err(InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> Result<Self, InvalidWindow> {
        Self::new(start, start + length)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum Stage {
    NoEvents,
    RawCrossings,
    AlignedTransits,
    PopulatedEphemeris,
}

/// Propagation failure for one object, reported without aborting the batch
#[derive(Debug, Clone)]
pub struct ObjectFailure {
    pub identity: ObjectIdentity,
    pub observer: String,
    pub error: PropagationError,
}

/// Transits for a single observer and search window.
///
/// The set is bound to its key: changing the observer or the window through
/// [`TransitSet::rebind`] empties it, so no transit outlives the pairing
/// that produced it.
#[derive(Debug, Clone)]
pub struct TransitSet {
    observer: ObserverLocation,
    window: SearchWindow,
    stage: Stage,
    crossings: Vec<(ObjectIdentity, Crossings)>,
    transits: Vec<TransitEvent>,
    misaligned: Vec<(ObjectIdentity, Misalignment)>,
}

impl TransitSet {
    pub fn new(observer: ObserverLocation, window: SearchWindow) -> Self {
        Self {
            observer,
            window,
            stage: Stage::NoEvents,
            crossings: Vec::new(),
            transits: Vec::new(),
            misaligned: Vec::new(),
        }
    }

    pub fn observer(&self) -> &ObserverLocation {
        &self.observer
    }

    pub fn window(&self) -> SearchWindow {
        self.window
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn transits(&self) -> &[TransitEvent] {
        &self.transits
    }

    pub fn into_transits(self) -> Vec<TransitEvent> {
        self.transits
    }

    /// Objects whose crossings could not be paired
    pub fn misaligned(&self) -> &[(ObjectIdentity, Misalignment)] {
        &self.misaligned
    }

    pub fn invalidate(&mut self) {
        self.crossings.clear();
        self.transits.clear();
        self.misaligned.clear();
        self.stage = Stage::NoEvents;
    }

    /// Point the set at a new observer or window. Returns whether anything
    /// was discarded.
    pub fn rebind(&mut self, observer: ObserverLocation, window: SearchWindow) -> bool {
        if observer == self.observer && window == self.window {
            return false;
        }
        log::debug!(
            "Dropping {} transits for {} after rebinding",
            self.transits.len(),
            self.observer.label()
        );
        self.observer = observer;
        self.window = window;
        self.invalidate();
        true
    }

    pub fn record_crossings(&mut self, identity: ObjectIdentity, crossings: Crossings) {
        if crossings.is_empty() {
            return;
        }
        self.crossings.push((identity, crossings));
        self.stage = Stage::RawCrossings;
    }

    /// Pair recorded crossings into transits, object by object
    pub fn align(&mut self) {
        if self.stage != Stage::RawCrossings {
            return;
        }
        for (identity, crossings) in self.crossings.drain(..) {
            match assemble_transits(&crossings, &identity, &self.observer) {
                Ok(transits) => self.transits.extend(transits),
                Err(misalignment) => {
                    log::info!(
                        "Dropping all transits of {} over {}: {}",
                        identity,
                        self.observer.label(),
                        misalignment
                    );
                    self.misaligned.push((identity, misalignment));
                }
            }
        }
        self.transits.sort_by_key(|t| t.rise_time());
        self.stage = Stage::AlignedTransits;
    }

    pub fn populate(
        &mut self,
        sampler: &EphemerisSampler,
        objects: &[Arc<dyn Propagator>],
        max_total_points: usize,
    ) -> usize {
        if self.stage != Stage::AlignedTransits {
            return 0;
        }
        let populated = sampler.populate(&mut self.transits, objects, max_total_points);
        self.stage = Stage::PopulatedEphemeris;
        populated
    }

    /// Rebuild the set from scratch for `objects`
    pub fn refresh(
        &mut self,
        detector: &ElevationEventDetector,
        objects: &[Arc<dyn Propagator>],
    ) -> Vec<ObjectFailure> {
        self.invalidate();
        let mut failures = Vec::new();

        for object in objects {
            match detector.detect_for(
                object.as_ref(),
                &self.observer,
                self.window.start,
                self.window.end,
            ) {
                Ok(crossings) => self.record_crossings(object.identity().clone(), crossings),
                Err(error) => {
                    log::warn!(
                        "Skipping {} over {}: {}",
                        object.identity(),
                        self.observer.label(),
                        error
                    );
                    failures.push(ObjectFailure {
                        identity: object.identity().clone(),
                        observer: self.observer.label().to_string(),
                        error,
                    });
                }
            }
        }

        self.align();
        failures
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitSummary {
    pub total_transits: usize,
    pub objects_with_transits: usize,
    pub objects_queried: usize,
    pub failures: usize,
    pub misaligned_windows: usize,
}

/// Result of searching many objects over many observers
#[derive(Debug, Clone, Default)]
pub struct TransitSearch {
    pub transits: Vec<TransitEvent>,
    pub failures: Vec<ObjectFailure>,
    pub misaligned_windows: usize,
    pub objects_queried: usize,
}

impl TransitSearch {
    pub fn run(
        detector: &ElevationEventDetector,
        objects: &[Arc<dyn Propagator>],
        observers: &[ObserverLocation],
        window: SearchWindow,
    ) -> Self {
        let mut search = TransitSearch {
            objects_queried: objects.len(),
            ..Default::default()
        };

        for observer in observers {
            let mut set = TransitSet::new(observer.clone(), window);
            search.failures.extend(set.refresh(detector, objects));
            search.misaligned_windows += set.misaligned().len();
            log::info!(
                "Found {} transits over {}",
                set.transits().len(),
                observer.label()
            );
            search.transits.extend(set.into_transits());
        }

        search.transits.sort_by_key(|t| t.rise_time());
        search
    }

    pub fn summary(&self) -> TransitSummary {
        let objects: HashSet<_> = self
            .transits
            .iter()
            .map(|t| t.identity.norad_id)
            .collect();
        TransitSummary {
            total_transits: self.transits.len(),
            objects_with_transits: objects.len(),
            objects_queried: self.objects_queried,
            failures: self.failures.len(),
            misaligned_windows: self.misaligned_windows,
        }
    }
}
