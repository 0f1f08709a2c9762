use thiserror::Error;

use crate::train::epoch_stats::EpochReport;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed sample or input record. Never coerced.
    #[error("invalid input: {0}")]
    Input(String),

    #[error("index {index} out of range for dataset of length {len}")]
    OutOfRange { index: usize, len: usize },

    /// Non-finite loss or gradient in the given batch (0-based).
    #[error("non-finite value {value} in batch {batch}")]
    NumericInstability { batch: usize, value: f64 },

    /// An epoch failed part-way. `completed` holds every report emitted
    /// before the failure.
    #[error("epoch {epoch} aborted after {} completed epochs: {source}", .completed.len())]
    EpochAborted {
        epoch: usize,
        completed: Vec<EpochReport>,
        #[source]
        source: Box<Error>,
    },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
