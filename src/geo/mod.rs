pub mod frames;
mod locations;
mod observer;
pub mod sun;

pub use frames::{Geodetic, LookAngles};
pub use locations::{preset, PRESET_LOCATIONS};
pub use observer::{LocationError, ObserverLocation};

// WGS-84 constants
pub const WGS84_A_KM: f64 = 6378.137;
pub const WGS84_E2: f64 = 0.00669437999014;

pub const EARTH_RADIUS_KM: f64 = WGS84_A_KM;

/// Gravitational parameter matching the SGP4 (WGS-72) model
pub const MU_EARTH_KM3_S2: f64 = 398_600.8;
