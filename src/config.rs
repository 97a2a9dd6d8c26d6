use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::catalog::{constellation_min_elevation, FilterThresholds, DEFAULT_CACHE_TTL};
use crate::geo::{self, LocationError, ObserverLocation};
use crate::transit::{ElevationEventDetector, InvalidSteps};

pub const DEFAULT_MIN_ELEVATION_DEG: f64 = 10.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Observer error: {0}")]
    Location(#[from] LocationError),
    #[error("No observers configured")]
    NoObservers,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub observers: Vec<ObserverConfig>,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub filter: FilterThresholds,
    #[serde(default)]
    pub transits: TransitConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
}

/// A named preset, or explicit `"lat, lon"` coordinates
#[derive(Debug, Clone, Deserialize)]
pub struct ObserverConfig {
    pub name: String,
    pub coordinates: Option<String>,
    #[serde(default)]
    pub altitude_m: f64,
}

impl ObserverConfig {
    pub fn location(&self) -> Result<ObserverLocation, LocationError> {
        match &self.coordinates {
            Some(coordinates) => {
                ObserverLocation::from_coordinates(&self.name, coordinates, Some(self.altitude_m))
            }
            None => geo::preset(&self.name),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub tle_folder: PathBuf,
    pub group: String,
    #[serde(
        default = "default_cache_ttl",
        deserialize_with = "deserialize_std_duration"
    )]
    pub cache_ttl: std::time::Duration,
}

fn default_cache_ttl() -> std::time::Duration {
    DEFAULT_CACHE_TTL
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransitConfig {
    pub min_elevation_deg: Option<f64>,
    #[serde(deserialize_with = "deserialize_option_datetime")]
    pub start: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "deserialize_duration")]
    pub window: Duration,
    /// Elevation scan step
    #[serde(deserialize_with = "deserialize_duration")]
    pub coarse_step: Duration,
    /// Resolution of the reported event times
    #[serde(deserialize_with = "deserialize_duration")]
    pub fine_step: Duration,
    /// IANA zone for schedule times, UTC when unset
    #[serde(deserialize_with = "deserialize_option_timezone")]
    pub timezone: Option<Tz>,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            min_elevation_deg: None,
            start: None,
            window: Duration::days(1),
            coarse_step: Duration::minutes(1),
            fine_step: Duration::seconds(1),
            timezone: None,
        }
    }
}

impl TransitConfig {
    /// Explicit threshold, else the constellation preset, else the default
    pub fn min_elevation_for(&self, group: &str) -> f64 {
        self.min_elevation_deg
            .or_else(|| constellation_min_elevation(group))
            .unwrap_or(DEFAULT_MIN_ELEVATION_DEG)
    }

    pub fn display_timezone(&self) -> Tz {
        self.timezone.unwrap_or(Tz::UTC)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Points shared by every transit sampled in one request
    pub max_total_points: usize,
    /// Points for a single ground track or relative-motion span
    pub track_points: usize,
    pub illumination: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_total_points: 3000,
            track_points: 500,
            illumination: true,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn observer_locations(&self) -> Result<Vec<ObserverLocation>, ConfigError> {
        if self.observers.is_empty() {
            return Err(ConfigError::NoObservers);
        }
        let locations = self
            .observers
            .iter()
            .map(ObserverConfig::location)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(locations)
    }

    pub fn min_elevation_deg(&self) -> f64 {
        self.transits.min_elevation_for(&self.catalog.group)
    }

    pub fn detector(&self) -> Result<ElevationEventDetector, InvalidSteps> {
        ElevationEventDetector::new(self.min_elevation_deg())
            .with_steps(self.transits.coarse_step, self.transits.fine_step)
    }
}

pub(crate) fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let std = deserialize_std_duration(deserializer)?;
    Duration::from_std(std).map_err(serde::de::Error::custom)
}

fn deserialize_std_duration<'de, D>(deserializer: D) -> Result<std::time::Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

fn deserialize_option_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn deserialize_option_timezone<'de, D>(deserializer: D) -> Result<Option<Tz>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    s.map(|s| parse_timezone(&s).map_err(serde::de::Error::custom))
        .transpose()
}

pub fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| format!("unknown timezone {:?}: {}", name, e))
}
