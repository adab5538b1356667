//! Error taxonomy shared by the session, timer and progress services.

use crate::id::WorkoutId;

/// Result type for gymtrack services.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the calling layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Referenced workout, exercise, exercise type, session, set or timer does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller does not own the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Rejected input, e.g. a non-positive timer duration
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Underlying repository failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// The workout exists but has no exercises
    #[error("Workout {0} has no exercises")]
    NoExercises(WorkoutId),
}

impl Error {
    /// Shorthand for a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// HTTP status the transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::NoExercises(_) => 404,
            Self::Forbidden(_) => 403,
            Self::InvalidArgument(_) => 400,
            Self::Storage(_) => 500,
        }
    }
}
