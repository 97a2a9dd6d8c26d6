//! Satellite transit detection, ephemeris sampling and relative-motion
//! analysis over SGP4-propagated catalogs.

pub mod catalog;
pub mod config;
pub mod ephemeris;
pub mod geo;
pub mod propagator;
pub mod relative;
pub mod schedule;
pub mod transit;
