use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::ephemeris::{Ephemeris, EphemerisSample, SamplePoint};
use crate::geo::{frames, sun, ObserverLocation};
use crate::propagator::Propagator;
use crate::transit::TransitEvent;

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("sample count must be at least 1")]
    NoPoints,
    #[error("cannot place {points} samples between {start} and {end}")]
    EmptySpan {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        points: usize,
    },
    #[error("ephemeris of {object} is incomplete ({got} of {want} points)")]
    Incomplete {
        object: String,
        got: usize,
        want: usize,
    },
}

/// Points per transit when `concurrent` transits share `max_total_points`
pub fn point_budget(max_total_points: usize, concurrent: usize) -> usize {
    (max_total_points / concurrent.max(1)).max(1)
}

/// `n` epochs evenly spaced in time, both ends included
pub fn linspace(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    n: usize,
) -> Result<Vec<DateTime<Utc>>, SamplingError> {
    if n == 0 {
        return Err(SamplingError::NoPoints);
    }
    if end < start || (end == start && n > 1) {
        return Err(SamplingError::EmptySpan {
            start,
            end,
            points: n,
        });
    }
    if n == 1 {
        return Ok(vec![start]);
    }

    let span_ms = (end - start).num_milliseconds() as f64;
    let last = n - 1;
    Ok((0..n)
        .map(|i| {
            if i == last {
                end
            } else {
                let offset = span_ms * i as f64 / last as f64;
                start + Duration::microseconds((offset * 1000.0).round() as i64)
            }
        })
        .collect())
}

#[derive(Debug, Clone, Default)]
pub struct EphemerisSampler {
    illumination: bool,
}

impl EphemerisSampler {
    pub fn new(illumination: bool) -> Self {
        Self { illumination }
    }

    pub fn sample_span(
        &self,
        object: &dyn Propagator,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        n: usize,
        observer: Option<&ObserverLocation>,
    ) -> Result<Ephemeris, SamplingError> {
        let epochs = linspace(start, end, n)?;
        let last = epochs.len() - 1;
        let mut samples = Vec::with_capacity(epochs.len());

        for (i, epoch) in epochs.into_iter().enumerate() {
            let state = match object.state_at(epoch) {
                Ok(state) => state,
                Err(e) => {
                    log::warn!("Skipping sample of {} at {}: {}", object.identity(), epoch, e);
                    continue;
                }
            };

            let gmst = frames::gmst(epoch);
            let ecef = frames::teme_to_ecef_position(&state.position_km, gmst);
            let geodetic = frames::ecef_to_geodetic(&ecef);
            let point = match i {
                0 => SamplePoint::Start,
                i if i == last => SamplePoint::End,
                _ => SamplePoint::Interior,
            };

            samples.push(EphemerisSample {
                epoch,
                point,
                position_km: state.position_km,
                velocity_km_s: state.velocity_km_s,
                latitude_deg: geodetic.latitude_deg,
                longitude_deg: geodetic.longitude_deg,
                altitude_km: geodetic.altitude_km,
                look: observer.map(|o| o.look_angles_ecef(&ecef)),
                sunlit: self
                    .illumination
                    .then(|| sun::is_sunlit(&state.position_km, &sun::sun_position_km(epoch))),
            });
        }

        Ok(Ephemeris::new(samples, observer.is_some()))
    }

    /// Same as [`EphemerisSampler::sample_span`], but an ephemeris missing
    /// any sample is an error instead of a short result
    pub fn sample_complete_span(
        &self,
        object: &dyn Propagator,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        n: usize,
        observer: Option<&ObserverLocation>,
    ) -> Result<Ephemeris, SamplingError> {
        let ephemeris = self.sample_span(object, start, end, n, observer)?;
        if !ephemeris.is_populated(n) {
            return Err(SamplingError::Incomplete {
                object: object.identity().to_string(),
                got: ephemeris.len(),
                want: n,
            });
        }
        Ok(ephemeris)
    }

    pub fn sample_transit(
        &self,
        object: &dyn Propagator,
        transit: &TransitEvent,
        n: usize,
    ) -> Result<Ephemeris, SamplingError> {
        self.sample_span(
            object,
            transit.rise_time(),
            transit.set_time(),
            n,
            Some(&transit.observer),
        )
    }

    /// Attach an ephemeris to every transit, splitting `max_total_points`
    /// evenly between them. Transits whose ephemeris comes back incomplete
    /// are left unpopulated. Returns how many were populated.
    pub fn populate(
        &self,
        transits: &mut [TransitEvent],
        objects: &[Arc<dyn Propagator>],
        max_total_points: usize,
    ) -> usize {
        let n = point_budget(max_total_points, transits.len());
        log::debug!("Sampling {} transits at {} points each", transits.len(), n);

        let by_id: HashMap<u32, &dyn Propagator> = objects
            .iter()
            .map(|o| (o.identity().norad_id, o.as_ref()))
            .collect();

        let mut populated = 0;
        for transit in transits.iter_mut() {
            let Some(object) = by_id.get(&transit.identity.norad_id) else {
                log::warn!("No propagator for {}, skipping ephemeris", transit.identity);
                continue;
            };
            match self.sample_transit(*object, transit, n) {
                Ok(ephemeris) if ephemeris.is_populated(n) => {
                    transit.ephemeris = Some(ephemeris);
                    populated += 1;
                }
                Ok(ephemeris) => log::warn!(
                    "Incomplete ephemeris for {} ({} of {} points), skipping",
                    transit.identity,
                    ephemeris.len(),
                    n
                ),
                Err(e) => log::warn!("Cannot sample {}: {}", transit.identity, e),
            }
        }
        populated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    use crate::geo::EARTH_RADIUS_KM;
    use crate::propagator::testing::{reference_epoch, CircularOrbit};
    use crate::transit::{ElevationCrossing, EventKind};

    fn transit_for(
        object: &dyn Propagator,
        observer: &ObserverLocation,
        offset_min: i64,
    ) -> TransitEvent {
        let at = |minutes: i64, kind| ElevationCrossing {
            epoch: reference_epoch() + Duration::minutes(offset_min + minutes),
            kind,
            azimuth_deg: 0.0,
            elevation_deg: 10.0,
        };
        TransitEvent {
            identity: object.identity().clone(),
            observer: observer.clone(),
            rise: at(0, EventKind::Rise),
            culminate: at(4, EventKind::Culminate),
            set: at(8, EventKind::Set),
            ephemeris: None,
        }
    }

    #[test]
    fn test_point_budget() {
        assert_eq!(point_budget(3000, 10), 300);
        assert_eq!(point_budget(3000, 7), 428);
        assert_eq!(point_budget(3000, 5000), 1);
        assert_eq!(point_budget(3000, 0), 3000);

        let mut previous = usize::MAX;
        for k in 1..100 {
            let n = point_budget(3000, k);
            assert!(n <= previous);
            previous = n;
        }
    }

    #[test]
    fn test_linspace() {
        let start = reference_epoch();
        let end = start + Duration::minutes(10);
        let epochs = linspace(start, end, 11).unwrap();
        assert_eq!(epochs.len(), 11);
        assert_eq!(epochs[0], start);
        assert_eq!(epochs[5], start + Duration::minutes(5));
        assert_eq!(epochs[10], end);

        assert_eq!(linspace(start, start, 1).unwrap(), vec![start]);
        assert!(matches!(linspace(start, end, 0), Err(SamplingError::NoPoints)));
        assert!(matches!(
            linspace(start, start, 2),
            Err(SamplingError::EmptySpan { .. })
        ));
        assert!(matches!(
            linspace(end, start, 5),
            Err(SamplingError::EmptySpan { .. })
        ));
    }

    #[test]
    fn test_sample_span_geodetic() {
        let orbit = CircularOrbit::new(1, 500.0, 0.0);
        let start = reference_epoch();
        let ephemeris = EphemerisSampler::default()
            .sample_span(&orbit, start, start + Duration::minutes(30), 50, None)
            .unwrap();

        assert_eq!(ephemeris.len(), 50);
        assert!(ephemeris.is_populated(50));
        let samples = ephemeris.samples();
        assert_eq!(samples[0].point, SamplePoint::Start);
        assert_eq!(samples[25].point, SamplePoint::Interior);
        assert_eq!(samples[49].point, SamplePoint::End);
        for sample in samples {
            assert_relative_eq!(sample.latitude_deg, 0.0, epsilon = 1e-9);
            assert_relative_eq!(sample.altitude_km, 500.0, epsilon = 1e-6);
            assert_relative_eq!(
                sample.position_km.norm(),
                EARTH_RADIUS_KM + 500.0,
                epsilon = 1e-6
            );
            assert!(sample.look.is_none());
            assert!(sample.sunlit.is_none());
        }
    }

    #[test]
    fn test_sample_transit_has_look_angles() {
        let orbit = CircularOrbit::new(1, 500.0, 51.6);
        let observer = ObserverLocation::new("TEST", 40.0, -105.0, 0.0).unwrap();
        let transit = transit_for(&orbit, &observer, 0);

        let ephemeris = EphemerisSampler::default()
            .sample_transit(&orbit, &transit, 20)
            .unwrap();
        assert!(ephemeris.is_populated(20));
        assert_eq!(ephemeris.epochs()[0], transit.rise_time());
        assert_eq!(ephemeris.epochs()[19], transit.set_time());
        assert!(ephemeris.samples().iter().all(|s| s.look.is_some()));
    }

    #[test]
    fn test_illumination_over_one_orbit() {
        // equatorial orbit at the March equinox, Sun close to +x
        let orbit = CircularOrbit::new(1, 500.0, 0.0);
        let start = reference_epoch();
        let period_s = std::f64::consts::TAU
            * ((EARTH_RADIUS_KM + 500.0).powi(3) / crate::geo::MU_EARTH_KM3_S2).sqrt();
        let end = start + Duration::seconds(period_s as i64);

        let ephemeris = EphemerisSampler::new(true)
            .sample_span(&orbit, start, end, 360, None)
            .unwrap();
        let lit = ephemeris.sunlit_fraction().unwrap();
        assert!(lit > 0.55 && lit < 0.70, "sunlit fraction {}", lit);
        assert_eq!(ephemeris.samples()[0].sunlit, Some(true));
    }

    #[test]
    fn test_failing_object_is_not_populated() {
        let orbit = CircularOrbit::new(1, 500.0, 0.0).failing();
        let start = reference_epoch();
        let ephemeris = EphemerisSampler::default()
            .sample_span(&orbit, start, start + Duration::minutes(5), 10, None)
            .unwrap();
        assert!(ephemeris.is_empty());
        assert!(!ephemeris.is_populated(10));
    }

    #[test]
    fn test_complete_span_rejects_partial_ephemeris() {
        let start = reference_epoch();
        let end = start + Duration::minutes(5);
        let sampler = EphemerisSampler::default();

        let good = CircularOrbit::new(1, 500.0, 0.0);
        let ephemeris = sampler.sample_complete_span(&good, start, end, 10, None).unwrap();
        assert_eq!(ephemeris.len(), 10);

        let bad = CircularOrbit::new(2, 500.0, 0.0).failing();
        match sampler.sample_complete_span(&bad, start, end, 10, None) {
            Err(SamplingError::Incomplete { got, want, .. }) => {
                assert_eq!(got, 0);
                assert_eq!(want, 10);
            }
            other => panic!("expected an incomplete ephemeris, got {:?}", other.map(|e| e.len())),
        }
    }

    #[test]
    fn test_populate_splits_budget() {
        let observer = ObserverLocation::new("TEST", 40.0, -105.0, 0.0).unwrap();
        let objects: Vec<Arc<dyn Propagator>> = (1..=10)
            .map(|id| {
                CircularOrbit::new(id, 550.0, 53.0)
                    .with_phase_deg(id as f64 * 30.0)
                    .shared()
            })
            .collect();
        let mut transits: Vec<TransitEvent> = objects
            .iter()
            .enumerate()
            .map(|(i, o)| transit_for(o.as_ref(), &observer, i as i64 * 15))
            .collect();

        let populated = EphemerisSampler::default().populate(&mut transits, &objects, 3000);
        assert_eq!(populated, 10);
        for transit in &transits {
            assert_eq!(transit.ephemeris.as_ref().unwrap().len(), 300);
        }
    }

    #[test]
    fn test_populate_skips_failures() {
        let observer = ObserverLocation::new("TEST", 40.0, -105.0, 0.0).unwrap();
        let good = CircularOrbit::new(1, 550.0, 53.0).shared();
        let bad = CircularOrbit::new(2, 550.0, 53.0).failing().shared();
        let orphan = CircularOrbit::new(3, 550.0, 53.0);
        let mut transits = vec![
            transit_for(good.as_ref(), &observer, 0),
            transit_for(bad.as_ref(), &observer, 20),
            transit_for(&orphan, &observer, 40),
        ];

        let populated = EphemerisSampler::default().populate(&mut transits, &[good, bad], 300);
        assert_eq!(populated, 1);
        assert!(transits[0].is_populated());
        assert!(!transits[1].is_populated());
        assert!(!transits[2].is_populated());
    }
}
