use super::observer::{LocationError, ObserverLocation};

/// Named observer sites, (latitude, longitude) in degrees.
pub const PRESET_LOCATIONS: &[(&str, f64, f64)] = &[
    ("BOULDER", 40.015, -105.27),
    ("SAN FRANCISCO", 37.78, -122.41),
    ("NEW YORK", 40.73, -74.0),
    ("MUMBAI", 19.08, 72.88),
    ("LONDON", 51.5, -0.13),
    ("SHANGHAI", 31.23, 121.47),
    ("CAPE TOWN", -33.92, 18.42),
    ("RIO DE JANEIRO", -22.91, -43.1),
    ("SYDNEY", -33.87, 151.21),
    ("MOSCOW", 55.76, 37.62),
    ("TOKYO", 35.68, 139.65),
    ("RAJKOT", 22.30, 70.80),
    ("REYKJAVIK", 64.15, 21.94),
    ("CAIRO", 30.04, 31.24),
    ("SANTIAGO", -33.45, -70.67),
    ("MEXICO CITY", 19.43, -99.13),
    ("ATHENS", 37.98, 23.73),
    ("PARIS", 48.86, 2.35),
    ("ROME", 41.90, 12.50),
    ("CORVALLIS", 44.56, -123.26),
    ("PORTLAND", 45.51, -122.68),
    ("SANTA CRUZ", 36.97, -122.03),
    ("WEST LAFAYETTE", 40.43, -86.91),
    ("ANN ARBOR", 42.28, -83.74),
    ("LITTLE ROCK", 34.74, -92.28),
    ("TROLL", -72.0114, -2.5350),
    ("SVALBARD", 77.8750, -20.9752),
];

/// Case-insensitive lookup of a preset site
pub fn preset(name: &str) -> Result<ObserverLocation, LocationError> {
    let wanted = name.trim();
    PRESET_LOCATIONS
        .iter()
        .find(|(label, _, _)| label.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| LocationError::Unknown(name.to_string()))
        .and_then(|(label, lat, lon)| ObserverLocation::new(*label, *lat, *lon, 0.0))
}
