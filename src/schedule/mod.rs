mod projector;

pub use projector::{CompactRow, Schedule, TimelineRow, DT_FORMAT};
