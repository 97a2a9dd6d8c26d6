use chrono::{DateTime, Utc};
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;
use thiserror::Error;

use crate::ephemeris::Ephemeris;
use crate::propagator::StateVector;

const DEGENERATE_NORM: f64 = 1e-9;
const EPOCH_TOLERANCE_MS: i64 = 1;

#[derive(Debug, Error)]
pub enum RelativeError {
    #[error("ephemeris lengths differ: {primary} vs {secondary}")]
    LengthMismatch { primary: usize, secondary: usize },
    #[error("epochs differ at sample {index}: {primary} vs {secondary}")]
    EpochMismatch {
        index: usize,
        primary: DateTime<Utc>,
        secondary: DateTime<Utc>,
    },
}

/// Radial, in-track, cross-track triad of a reference state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RicFrame {
    pub radial: Vector3<f64>,
    pub in_track: Vector3<f64>,
    pub cross_track: Vector3<f64>,
}

impl RicFrame {
    /// `None` when the position or the angular momentum vanishes
    pub fn from_state(position: &Vector3<f64>, velocity: &Vector3<f64>) -> Option<Self> {
        let radial = position.try_normalize(DEGENERATE_NORM)?;
        let cross_track = position.cross(velocity).try_normalize(DEGENERATE_NORM)?;
        let in_track = cross_track.cross(&radial);
        Some(Self {
            radial,
            in_track,
            cross_track,
        })
    }

    /// Inertial to RIC rotation
    pub fn rotation(&self) -> Matrix3<f64> {
        Matrix3::from_rows(&[
            self.radial.transpose(),
            self.in_track.transpose(),
            self.cross_track.transpose(),
        ])
    }

    pub fn rotate_into(&self, inertial: &Vector3<f64>) -> Vector3<f64> {
        self.rotation() * inertial
    }

    pub fn rotate_out_of(&self, ric: &Vector3<f64>) -> Vector3<f64> {
        self.rotation().transpose() * ric
    }
}

/// Offset of the secondary from the primary at one epoch, in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelativeState {
    pub epoch: DateTime<Utc>,
    pub radial_m: f64,
    pub in_track_m: f64,
    pub cross_track_m: f64,
    pub miss_distance_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkippedEpoch {
    pub index: usize,
    pub epoch: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MissDistanceSummary {
    pub samples: usize,
    pub min_m: f64,
    pub max_m: f64,
    pub mean_m: f64,
    pub closest_approach: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RicTrack {
    pub states: Vec<RelativeState>,
    /// Epochs where the reference frame was undefined. These carry no
    /// miss distance at all.
    pub skipped: Vec<SkippedEpoch>,
}

impl RicTrack {
    pub fn summary(&self) -> Option<MissDistanceSummary> {
        let closest = self
            .states
            .iter()
            .min_by(|a, b| a.miss_distance_m.total_cmp(&b.miss_distance_m))?;
        let max_m = self
            .states
            .iter()
            .map(|s| s.miss_distance_m)
            .fold(f64::NEG_INFINITY, f64::max);
        let total: f64 = self.states.iter().map(|s| s.miss_distance_m).sum();

        Some(MissDistanceSummary {
            samples: self.states.len(),
            min_m: closest.miss_distance_m,
            max_m,
            mean_m: total / self.states.len() as f64,
            closest_approach: closest.epoch,
        })
    }
}

/// RIC offset of `secondary` relative to `primary`, both sampled on the same
/// epochs. Inputs are in km, the track is in metres.
pub fn relative_track(
    primary: &[StateVector],
    secondary: &[StateVector],
) -> Result<RicTrack, RelativeError> {
    if primary.len() != secondary.len() {
        return Err(RelativeError::LengthMismatch {
            primary: primary.len(),
            secondary: secondary.len(),
        });
    }

    let mut track = RicTrack::default();
    for (index, (reference, other)) in primary.iter().zip(secondary).enumerate() {
        if (reference.epoch - other.epoch).num_milliseconds().abs() > EPOCH_TOLERANCE_MS {
            return Err(RelativeError::EpochMismatch {
                index,
                primary: reference.epoch,
                secondary: other.epoch,
            });
        }

        let Some(frame) = RicFrame::from_state(&reference.position_km, &reference.velocity_km_s)
        else {
            log::debug!("Degenerate reference state at {}, skipping", reference.epoch);
            track.skipped.push(SkippedEpoch {
                index,
                epoch: reference.epoch,
            });
            continue;
        };

        let offset_m = frame.rotate_into(&(other.position_km - reference.position_km)) * 1000.0;
        track.states.push(RelativeState {
            epoch: reference.epoch,
            radial_m: offset_m.x,
            in_track_m: offset_m.y,
            cross_track_m: offset_m.z,
            miss_distance_m: offset_m.norm(),
        });
    }

    if !track.skipped.is_empty() {
        log::warn!(
            "{} of {} epochs skipped for degenerate geometry",
            track.skipped.len(),
            primary.len()
        );
    }

    Ok(track)
}

pub fn relative_track_between(
    primary: &Ephemeris,
    secondary: &Ephemeris,
) -> Result<RicTrack, RelativeError> {
    relative_track(&primary.states(), &secondary.states())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;

    use crate::ephemeris::EphemerisSampler;
    use crate::propagator::testing::{reference_epoch, CircularOrbit};

    fn state(position: [f64; 3], velocity: [f64; 3]) -> StateVector {
        StateVector {
            epoch: reference_epoch(),
            position_km: Vector3::from(position),
            velocity_km_s: Vector3::from(velocity),
        }
    }

    #[test]
    fn test_basis_is_orthonormal_and_right_handed() {
        let cases = [
            ([7000.0, 0.0, 0.0], [0.0, 7.5, 0.0]),
            ([-4200.0, 5100.0, 1800.0], [-3.1, -4.4, 5.2]),
            ([6778.0, -12.0, 300.0], [0.4, 4.9, 6.1]),
        ];
        for (r, v) in cases {
            let frame = RicFrame::from_state(&Vector3::from(r), &Vector3::from(v)).unwrap();
            assert_relative_eq!(frame.radial.norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(frame.in_track.norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(frame.cross_track.norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(frame.radial.dot(&frame.in_track), 0.0, epsilon = 1e-12);
            assert_relative_eq!(frame.radial.dot(&frame.cross_track), 0.0, epsilon = 1e-12);
            assert_relative_eq!(
                frame.radial.cross(&frame.in_track),
                frame.cross_track,
                epsilon = 1e-12
            );

            let v_eci = Vector3::new(1.0, -2.0, 3.0);
            assert_relative_eq!(
                frame.rotate_out_of(&frame.rotate_into(&v_eci)),
                v_eci,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_degenerate_states_have_no_frame() {
        let zero = Vector3::zeros();
        assert!(RicFrame::from_state(&zero, &Vector3::new(0.0, 7.5, 0.0)).is_none());
        assert!(RicFrame::from_state(&Vector3::new(7000.0, 0.0, 0.0), &zero).is_none());
        // radial velocity only
        assert!(RicFrame::from_state(
            &Vector3::new(7000.0, 0.0, 0.0),
            &Vector3::new(3.0, 0.0, 0.0)
        )
        .is_none());
    }

    #[test]
    fn test_known_offset() {
        let primary = [state([7000.0, 0.0, 0.0], [0.0, 7.5, 0.0])];
        let secondary = [state([7000.1, 0.2, -0.3], [0.0, 7.5, 0.0])];
        let track = relative_track(&primary, &secondary).unwrap();

        let offset = track.states[0];
        assert_relative_eq!(offset.radial_m, 100.0, epsilon = 1e-6);
        assert_relative_eq!(offset.in_track_m, 200.0, epsilon = 1e-6);
        assert_relative_eq!(offset.cross_track_m, -300.0, epsilon = 1e-6);
        assert_relative_eq!(offset.miss_distance_m, 140_000f64.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_identical_ephemerides_are_zero() {
        let orbit = CircularOrbit::new(1, 550.0, 53.0);
        let start = reference_epoch();
        let ephemeris = EphemerisSampler::default()
            .sample_span(&orbit, start, start + Duration::hours(2), 120, None)
            .unwrap();

        let track = relative_track_between(&ephemeris, &ephemeris).unwrap();
        assert_eq!(track.states.len(), 120);
        assert!(track.skipped.is_empty());
        for offset in &track.states {
            assert_eq!(offset.radial_m, 0.0);
            assert_eq!(offset.in_track_m, 0.0);
            assert_eq!(offset.cross_track_m, 0.0);
        }
        assert_eq!(track.summary().unwrap().max_m, 0.0);
    }

    #[test]
    fn test_phase_lead_shows_up_in_track() {
        let start = reference_epoch();
        let sampler = EphemerisSampler::default();
        let lead_deg: f64 = 0.01;
        let primary = CircularOrbit::new(1, 500.0, 97.4);
        let secondary = CircularOrbit::new(2, 500.0, 97.4).with_phase_deg(lead_deg);
        let end = start + Duration::minutes(30);

        let track = relative_track_between(
            &sampler.sample_span(&primary, start, end, 31, None).unwrap(),
            &sampler.sample_span(&secondary, start, end, 31, None).unwrap(),
        )
        .unwrap();

        let radius_m = (crate::geo::EARTH_RADIUS_KM + 500.0) * 1000.0;
        let lead = lead_deg.to_radians();
        for offset in &track.states {
            assert_relative_eq!(offset.in_track_m, radius_m * lead.sin(), epsilon = 1e-3);
            assert_relative_eq!(offset.radial_m, radius_m * (lead.cos() - 1.0), epsilon = 1e-3);
            assert_relative_eq!(offset.cross_track_m, 0.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_degenerate_epochs_are_skipped() {
        let t1 = reference_epoch() + Duration::seconds(10);
        let mut primary = vec![
            state([7000.0, 0.0, 0.0], [0.0, 7.5, 0.0]),
            state([0.0, 0.0, 0.0], [0.0, 7.5, 0.0]),
        ];
        primary[1].epoch = t1;
        let mut secondary = vec![
            state([7000.0, 1.0, 0.0], [0.0, 7.5, 0.0]),
            state([7000.0, 1.0, 0.0], [0.0, 7.5, 0.0]),
        ];
        secondary[1].epoch = t1;

        let track = relative_track(&primary, &secondary).unwrap();
        assert_eq!(track.states.len(), 1);
        assert_eq!(track.skipped, vec![SkippedEpoch { index: 1, epoch: t1 }]);
        assert_relative_eq!(track.summary().unwrap().min_m, 1000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mismatched_grids_are_errors() {
        let a = state([7000.0, 0.0, 0.0], [0.0, 7.5, 0.0]);
        let mut b = a;
        assert!(matches!(
            relative_track(&[a, a], &[a]),
            Err(RelativeError::LengthMismatch {
                primary: 2,
                secondary: 1
            })
        ));

        b.epoch = a.epoch + Duration::seconds(1);
        assert!(matches!(
            relative_track(&[a], &[b]),
            Err(RelativeError::EpochMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn test_summary() {
        let t = |s: i64| reference_epoch() + Duration::seconds(s);
        let track = RicTrack {
            states: [5.0, 2.0, 8.0]
                .iter()
                .enumerate()
                .map(|(i, &d)| RelativeState {
                    epoch: t(i as i64),
                    radial_m: d,
                    in_track_m: 0.0,
                    cross_track_m: 0.0,
                    miss_distance_m: d,
                })
                .collect(),
            skipped: Vec::new(),
        };
        let summary = track.summary().unwrap();
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.min_m, 2.0);
        assert_eq!(summary.max_m, 8.0);
        assert_relative_eq!(summary.mean_m, 5.0);
        assert_eq!(summary.closest_approach, t(1));

        assert!(RicTrack::default().summary().is_none());
    }
}
