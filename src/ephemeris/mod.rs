mod sample;
mod sampler;

pub use sample::{Ephemeris, EphemerisSample, SamplePoint};
pub use sampler::{linspace, point_budget, EphemerisSampler, SamplingError};
