//! Low-precision solar ephemeris and Earth shadow test.

use chrono::{DateTime, Utc};
use nalgebra::Vector3;

use super::EARTH_RADIUS_KM;

const AU_KM: f64 = 149_597_870.7;
const J2000_JD: f64 = 2_451_545.0;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

pub fn julian_date(epoch: DateTime<Utc>) -> f64 {
    epoch.timestamp_millis() as f64 / 86_400_000.0 + UNIX_EPOCH_JD
}

/// Geocentric equatorial Sun position in km, good to about 0.01°.
pub fn sun_position_km(epoch: DateTime<Utc>) -> Vector3<f64> {
    let n = julian_date(epoch) - J2000_JD;
    let mean_longitude = (280.460 + 0.985_647_4 * n).rem_euclid(360.0);
    let mean_anomaly = (357.528 + 0.985_600_3 * n).rem_euclid(360.0).to_radians();

    let ecliptic_longitude = (mean_longitude
        + 1.915 * mean_anomaly.sin()
        + 0.020 * (2.0 * mean_anomaly).sin())
    .to_radians();
    let obliquity = (23.439 - 0.000_000_4 * n).to_radians();
    let distance_km = (1.000_14
        - 0.016_71 * mean_anomaly.cos()
        - 0.000_14 * (2.0 * mean_anomaly).cos())
        * AU_KM;

    let (sin_l, cos_l) = ecliptic_longitude.sin_cos();
    Vector3::new(
        distance_km * cos_l,
        distance_km * obliquity.cos() * sin_l,
        distance_km * obliquity.sin() * sin_l,
    )
}

/// Cylindrical Earth shadow: eclipsed only on the anti-sun side and within
/// one Earth radius of the Earth–Sun line.
pub fn is_sunlit(position_km: &Vector3<f64>, sun_km: &Vector3<f64>) -> bool {
    let sun_dir = sun_km.normalize();
    let projection = position_km.dot(&sun_dir);
    if projection > 0.0 {
        return true;
    }
    let perpendicular = position_km - projection * sun_dir;
    perpendicular.norm() > EARTH_RADIUS_KM
}
