use nalgebra::Vector3;

use crate::propagator::StateVector;
use crate::relative::RicFrame;

/// Station-keeping trigger: thrust along track once the secondary leads the
/// primary by more than `threshold_m`. A trailing secondary is never pushed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InTrackControl {
    /// In-track separation (m) beyond which thrust is applied
    pub threshold_m: f64,
    /// Thrust acceleration (m/s²) expressed in the primary's RIC frame
    pub acceleration_ric: Vector3<f64>,
}

impl Default for InTrackControl {
    fn default() -> Self {
        Self {
            threshold_m: 4_500.0,
            acceleration_ric: Vector3::new(0.0, 2e-5, 0.0),
        }
    }
}

impl InTrackControl {
    /// Inertial acceleration (m/s²) to add to the secondary. Zero inside the
    /// control box, `None` when the primary's frame is undefined.
    pub fn acceleration(
        &self,
        primary: &StateVector,
        secondary: &StateVector,
    ) -> Option<Vector3<f64>> {
        let frame = RicFrame::from_state(&primary.position_km, &primary.velocity_km_s)?;
        let offset_m = frame.rotate_into(&(secondary.position_km - primary.position_km)) * 1000.0;

        if offset_m.y > self.threshold_m {
            Some(frame.rotate_out_of(&self.acceleration_ric))
        } else {
            Some(Vector3::zeros())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    use crate::propagator::testing::reference_epoch;

    fn state(position: [f64; 3]) -> StateVector {
        StateVector {
            epoch: reference_epoch(),
            position_km: Vector3::from(position),
            velocity_km_s: Vector3::new(0.0, 7.5, 0.0),
        }
    }

    #[test]
    fn test_inside_box_is_quiet() {
        let control = InTrackControl::default();
        let primary = state([7000.0, 0.0, 0.0]);
        let secondary = state([7000.0, 4.4, 0.0]);
        assert_eq!(
            control.acceleration(&primary, &secondary),
            Some(Vector3::zeros())
        );

        // trailing is not corrected
        let behind = state([7000.0, -9.0, 0.0]);
        assert_eq!(control.acceleration(&primary, &behind), Some(Vector3::zeros()));
    }

    #[test]
    fn test_outside_box_thrusts_in_track() {
        let control = InTrackControl::default();
        let primary = state([7000.0, 0.0, 0.0]);
        let secondary = state([7000.0, 4.6, 0.0]);
        let accel = control.acceleration(&primary, &secondary).unwrap();
        // in-track of this primary is +y
        assert_relative_eq!(accel, Vector3::new(0.0, 2e-5, 0.0), epsilon = 1e-15);
    }

    #[test]
    fn test_degenerate_primary() {
        let control = InTrackControl::default();
        let primary = state([0.0, 0.0, 0.0]);
        assert!(control
            .acceleration(&primary, &state([7000.0, 9.0, 0.0]))
            .is_none());
    }
}
