//! Error types for `MedCamp` core library.

use thiserror::Error;

use crate::consent::TransitionError;
use crate::schedule::ScheduleError;

/// Result type alias using `MedCamp` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `MedCamp` operations.
///
/// Malformed timestamps never show up here: they normalise to
/// [`TimePoint::Unknown`](crate::time_point::TimePoint::Unknown) instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A consent or approval transition was rejected
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Campaign schedule failed validation
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// A record in a snapshot could not be read
    #[error("Failed to parse record on line {line}: {reason}")]
    RecordParse { line: usize, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
