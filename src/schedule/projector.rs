use std::fmt::Write;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::transit::TransitEvent;

pub const DT_FORMAT: &str = "%b %d, %Y %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompactRow {
    pub object: String,
    pub norad_id: u32,
    pub location: String,
    pub rise: DateTime<Utc>,
    pub set: DateTime<Utc>,
    pub rise_azimuth_deg: f64,
    pub set_azimuth_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRow {
    pub object: String,
    pub norad_id: u32,
    pub location: String,
    pub start: DateTime<Utc>,
    pub culminate: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_seconds: i64,
    pub max_elevation_deg: f64,
}

/// Display-ready view of a transit collection, sorted by rise time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum Schedule {
    Empty,
    Compact(Vec<CompactRow>),
    Timeline(Vec<TimelineRow>),
}

/// Transits for `location` (all of them when `None`), stable-sorted by rise
fn select<'a>(transits: &'a [TransitEvent], location: Option<&str>) -> Vec<&'a TransitEvent> {
    let mut selected: Vec<&TransitEvent> = transits
        .iter()
        .filter(|t| location.map_or(true, |label| t.observer.label() == label))
        .collect();
    selected.sort_by_key(|t| t.rise_time());
    selected
}

impl Schedule {
    pub fn compact(transits: &[TransitEvent], location: Option<&str>) -> Self {
        let rows: Vec<CompactRow> = select(transits, location)
            .into_iter()
            .map(|t| CompactRow {
                object: t.identity.name.clone(),
                norad_id: t.identity.norad_id,
                location: t.observer.label().to_string(),
                rise: t.rise_time(),
                set: t.set_time(),
                rise_azimuth_deg: t.rise.azimuth_deg,
                set_azimuth_deg: t.set.azimuth_deg,
            })
            .collect();
        if rows.is_empty() {
            Schedule::Empty
        } else {
            Schedule::Compact(rows)
        }
    }

    pub fn timeline(transits: &[TransitEvent], location: Option<&str>) -> Self {
        let rows: Vec<TimelineRow> = select(transits, location)
            .into_iter()
            .map(|t| TimelineRow {
                object: t.identity.name.clone(),
                norad_id: t.identity.norad_id,
                location: t.observer.label().to_string(),
                start: t.rise_time(),
                culminate: t.culminate_time(),
                end: t.set_time(),
                duration_seconds: t.duration().num_seconds(),
                max_elevation_deg: t.max_elevation_deg(),
            })
            .collect();
        if rows.is_empty() {
            Schedule::Empty
        } else {
            Schedule::Timeline(rows)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Schedule::Empty => 0,
            Schedule::Compact(rows) => rows.len(),
            Schedule::Timeline(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Schedule::Empty)
    }

    /// Plain-text table, one transit per line, with times shown in `tz`
    pub fn render(&self, tz: Tz) -> String {
        let local = |t: &DateTime<Utc>| t.with_timezone(&tz).format(DT_FORMAT).to_string();
        let mut out = String::new();
        match self {
            Schedule::Empty => out.push_str("No transits found.\n"),
            Schedule::Compact(rows) => {
                let _ = writeln!(
                    out,
                    "{:<24} {:<16} {:<22} {:<22} {:>7} {:>7}",
                    "Satellite",
                    "Location",
                    format!("Rise ({})", tz.name()),
                    format!("Set ({})", tz.name()),
                    "Az rise",
                    "Az set"
                );
                for row in rows {
                    let _ = writeln!(
                        out,
                        "{:<24} {:<16} {:<22} {:<22} {:>7.1} {:>7.1}",
                        row.object,
                        row.location,
                        local(&row.rise),
                        local(&row.set),
                        row.rise_azimuth_deg,
                        row.set_azimuth_deg
                    );
                }
            }
            Schedule::Timeline(rows) => {
                let _ = writeln!(
                    out,
                    "{:<24} {:<16} {:<22} {:<22} {:>8} {:>7}",
                    "Satellite",
                    "Location",
                    format!("Start ({})", tz.name()),
                    format!("End ({})", tz.name()),
                    "Duration",
                    "Max el"
                );
                for row in rows {
                    let _ = writeln!(
                        out,
                        "{:<24} {:<16} {:<22} {:<22} {:>7}s {:>7.1}",
                        row.object,
                        row.location,
                        local(&row.start),
                        local(&row.end),
                        row.duration_seconds,
                        row.max_elevation_deg
                    );
                }
            }
        }
        out
    }
}
