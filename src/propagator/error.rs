use thiserror::Error;

use super::types::PropagationStatus;

#[derive(Debug, Clone, Error)]
pub enum PropagationError {
    #[error("propagator unavailable for {object}: {status}")]
    Unavailable {
        object: String,
        status: PropagationStatus,
    },
    #[error("epoch out of range: {0}")]
    Epoch(String),
    #[error("propagation failed: {0}")]
    Sgp4(String),
}

#[derive(Debug, Error)]
pub enum TleError {
    #[error("Invalid TLE format in {source_name}: {message}")]
    InvalidTle {
        source_name: String,
        message: String,
    },
    #[error("No TLE records found in {0}")]
    NoRecords(String),
}
