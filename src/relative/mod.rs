//! Relative motion of two objects in the primary's RIC frame.

mod control;
mod ric;

pub use control::InTrackControl;
pub use ric::{
    relative_track, relative_track_between, MissDistanceSummary, RelativeError, RelativeState,
    RicFrame, RicTrack, SkippedEpoch,
};
