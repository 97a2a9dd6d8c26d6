//! Pass detection: raw elevation crossings, their pairing into transits and
//! the per-window transit state.

mod assembler;
mod detector;
mod finder;
mod types;

pub use assembler::{assemble_transits, Misalignment};
pub use detector::{ElevationEventDetector, InvalidSteps};
pub use finder::{
    InvalidWindow, ObjectFailure, SearchWindow, Stage, TransitSearch, TransitSet, TransitSummary,
};
pub use types::{Crossings, ElevationCrossing, EventKind, TransitEvent};
