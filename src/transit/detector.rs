use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::geo::{LookAngles, ObserverLocation};
use crate::propagator::{PropagationError, Propagator};
use crate::transit::types::{Crossings, ElevationCrossing, EventKind};

const COARSE_STEP_SECONDS: i64 = 60; // initial scan
const FINE_STEP_SECONDS: i64 = 1; // refinement

#[derive(Debug, Error)]
#[error("detector steps must satisfy 0 < fine ({fine}) <= coarse ({coarse})")]
pub struct InvalidSteps {
    pub coarse: Duration,
    pub fine: Duration,
}

/// Finds rise, culminate and set events of the elevation above a threshold.
///
/// The window is scanned on a coarse grid. Threshold crossings between two
/// grid points are refined by bisection and local maxima by ternary search.
/// A pass cut by the window boundary only contributes the events that lie
/// inside the window; nothing is synthesised at the boundary.
#[derive(Debug, Clone)]
pub struct ElevationEventDetector {
    min_elevation_deg: f64,
    coarse_step: Duration,
    fine_step: Duration,
}

impl ElevationEventDetector {
    pub fn new(min_elevation_deg: f64) -> Self {
        Self {
            min_elevation_deg,
            coarse_step: Duration::seconds(COARSE_STEP_SECONDS),
            fine_step: Duration::seconds(FINE_STEP_SECONDS),
        }
    }

    /// Override the scan and refinement steps
    pub fn with_steps(
        mut self,
        coarse_step: Duration,
        fine_step: Duration,
    ) -> Result<Self, InvalidSteps> {
        if fine_step <= Duration::zero() || coarse_step < fine_step {
            return Err(InvalidSteps {
                coarse: coarse_step,
                fine: fine_step,
            });
        }
        self.coarse_step = coarse_step;
        self.fine_step = fine_step;
        Ok(self)
    }

    pub fn min_elevation_deg(&self) -> f64 {
        self.min_elevation_deg
    }

    pub fn detect_for(
        &self,
        object: &dyn Propagator,
        observer: &ObserverLocation,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Crossings, PropagationError> {
        self.detect(|t| observer.look_at(object, t), start, end)
    }

    pub fn detect<F>(
        &self,
        look: F,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Crossings, PropagationError>
    where
        F: Fn(DateTime<Utc>) -> Result<LookAngles, PropagationError>,
    {
        if end <= start {
            return Ok(Crossings::default());
        }

        let mut grid = Vec::new();
        let mut cursor = start;
        while cursor < end {
            grid.push((cursor, look(cursor)?.elevation_deg));
            cursor += self.coarse_step;
        }
        grid.push((end, look(end)?.elevation_deg));

        let threshold = self.min_elevation_deg;
        let mut events = Vec::new();
        let mut crossed = false;

        for pair in grid.windows(2) {
            let (t0, e0) = pair[0];
            let (t1, e1) = pair[1];
            if e0 < threshold && e1 >= threshold {
                events.push(self.refine_crossing(&look, t0, t1, EventKind::Rise)?);
                crossed = true;
            } else if e0 >= threshold && e1 < threshold {
                events.push(self.refine_crossing(&look, t0, t1, EventKind::Set)?);
                crossed = true;
            }
        }

        for triple in grid.windows(3) {
            let (before, e_before) = triple[0];
            let (_, e_mid) = triple[1];
            let (after, e_after) = triple[2];
            if !(e_mid >= e_before && e_mid > e_after) {
                continue;
            }

            let peak = self.refine_peak(&look, before, after)?;
            if peak.elevation_deg < threshold {
                continue;
            }
            events.push(peak);

            // short pass entirely between grid points
            if e_mid < threshold {
                events.push(self.refine_crossing(&look, before, peak.epoch, EventKind::Rise)?);
                events.push(self.refine_crossing(&look, peak.epoch, after, EventKind::Set)?);
                crossed = true;
            }
        }

        // continuously above or below the threshold
        if !crossed {
            return Ok(Crossings::default());
        }

        Ok(Crossings::from_events(events))
    }

    /// Bisection between a point on each side of the threshold
    fn refine_crossing<F>(
        &self,
        look: &F,
        before: DateTime<Utc>,
        after: DateTime<Utc>,
        kind: EventKind,
    ) -> Result<ElevationCrossing, PropagationError>
    where
        F: Fn(DateTime<Utc>) -> Result<LookAngles, PropagationError>,
    {
        let rising = kind == EventKind::Rise;
        let mut low = before;
        let mut high = after;

        while high - low > self.fine_step {
            let mid = low + (high - low) / 2;
            let above = look(mid)?.elevation_deg >= self.min_elevation_deg;
            if above == rising {
                high = mid;
            } else {
                low = mid;
            }
        }

        // report the side that is above the threshold
        let epoch = if rising { high } else { low };
        let angles = look(epoch)?;
        Ok(ElevationCrossing {
            epoch,
            kind,
            azimuth_deg: angles.azimuth_deg,
            elevation_deg: angles.elevation_deg,
        })
    }

    /// Ternary search for the maximum of a unimodal stretch
    fn refine_peak<F>(
        &self,
        look: &F,
        before: DateTime<Utc>,
        after: DateTime<Utc>,
    ) -> Result<ElevationCrossing, PropagationError>
    where
        F: Fn(DateTime<Utc>) -> Result<LookAngles, PropagationError>,
    {
        let mut low = before;
        let mut high = after;

        while high - low > self.fine_step {
            let third = (high - low) / 3;
            let m1 = low + third;
            let m2 = high - third;
            if look(m1)?.elevation_deg < look(m2)?.elevation_deg {
                low = m1;
            } else {
                high = m2;
            }
        }

        let epoch = low + (high - low) / 2;
        let angles = look(epoch)?;
        Ok(ElevationCrossing {
            epoch,
            kind: EventKind::Culminate,
            azimuth_deg: angles.azimuth_deg,
            elevation_deg: angles.elevation_deg,
        })
    }
}
