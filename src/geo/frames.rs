use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::Serialize;

use super::{WGS84_A_KM, WGS84_E2};

/// Topocentric look angles from an observer to a target
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LookAngles {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

/// Greenwich sidereal angle (radians) used to rotate TEME into ECEF
pub fn gmst(epoch: DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&epoch.naive_utc()))
}

pub fn teme_to_ecef_position(pos_teme: &Vector3<f64>, gmst: f64) -> Vector3<f64> {
    let (sin_gmst, cos_gmst) = gmst.sin_cos();
    Vector3::new(
        pos_teme.x * cos_gmst + pos_teme.y * sin_gmst,
        -pos_teme.x * sin_gmst + pos_teme.y * cos_gmst,
        pos_teme.z,
    )
}

/// East, north, up components of an ECEF offset
pub fn ecef_to_enu(dr: &Vector3<f64>, lat_rad: f64, lon_rad: f64) -> Vector3<f64> {
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();

    let east = -sin_lon * dr.x + cos_lon * dr.y;
    let north = -sin_lat * cos_lon * dr.x - sin_lat * sin_lon * dr.y + cos_lat * dr.z;
    let up = cos_lat * cos_lon * dr.x + cos_lat * sin_lon * dr.y + sin_lat * dr.z;
    Vector3::new(east, north, up)
}

pub fn look_angles_from_enu(enu: &Vector3<f64>) -> LookAngles {
    let range_km = enu.norm();
    let azimuth_deg = enu.x.atan2(enu.y).to_degrees().rem_euclid(360.0);
    let elevation_deg = if range_km > 0.0 {
        (enu.z / range_km).asin().to_degrees()
    } else {
        90.0
    };
    LookAngles {
        azimuth_deg,
        elevation_deg,
        range_km,
    }
}

pub fn geodetic_to_ecef(lat_rad: f64, lon_rad: f64, alt_km: f64) -> Vector3<f64> {
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();
    let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    Vector3::new(
        (n + alt_km) * cos_lat * cos_lon,
        (n + alt_km) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + alt_km) * sin_lat,
    )
}

/// WGS-84 geodetic coordinates of an ECEF point (fixed-point iteration on latitude)
pub fn ecef_to_geodetic(pos: &Vector3<f64>) -> Geodetic {
    let p = (pos.x * pos.x + pos.y * pos.y).sqrt();
    let longitude = pos.y.atan2(pos.x);

    let mut latitude = pos.z.atan2(p * (1.0 - WGS84_E2));
    for _ in 0..16 {
        let sin_lat = latitude.sin();
        let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let next = (pos.z + WGS84_E2 * n * sin_lat).atan2(p);
        let converged = (next - latitude).abs() < 1e-12;
        latitude = next;
        if converged {
            break;
        }
    }

    let sin_lat = latitude.sin();
    let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let altitude_km = if latitude.cos().abs() > 1e-10 {
        p / latitude.cos() - n
    } else {
        pos.z.abs() - n * (1.0 - WGS84_E2)
    };

    Geodetic {
        latitude_deg: latitude.to_degrees(),
        longitude_deg: longitude.to_degrees(),
        altitude_km,
    }
}
