/// Minimum elevation (degrees) used for a constellation's transit search.
pub const CONSTELLATION_MIN_ELEVATIONS: &[(&str, f64)] = &[
    ("SPIRE", 80.0),
    ("PLANET", 80.0),
    ("SWARM", 80.0),
    ("STARLINK", 80.0),
    ("ONEWEB", 85.0),
    ("IRIDIUM", 80.0),
    ("GLOBALSTAR", 85.0),
    ("ORBCOMM", 85.0),
    ("NAVSTAR", 87.0),
    ("AMATEUR", 80.0),
    ("SPECIAL INTEREST", 80.0),
    ("WEATHER", 80.0),
    ("VISIBLE", 80.0),
];

/// Case-insensitive; `_` and `-` in `group` match spaces, so file keys such
/// as `special_interest` resolve.
pub fn constellation_min_elevation(group: &str) -> Option<f64> {
    let wanted = group.trim().replace(['_', '-'], " ");
    CONSTELLATION_MIN_ELEVATIONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(&wanted))
        .map(|(_, elevation)| *elevation)
}
