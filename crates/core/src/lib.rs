//! gymtrack core data models.
//!
//! Workouts, exercises, sets and the session cursor that the navigator,
//! timer and progress services work on, plus the shared error taxonomy.

#![warn(missing_docs)]

// Core identities
mod id;

// Workout structure
mod workout;
mod set;

// Navigation state
mod session;

mod error;

// Re-exports
pub use id::*;

pub use workout::{Workout, WorkoutSummary, Exercise, ExerciseType};
pub use set::WorkoutSet;
pub use session::{WorkoutSession, clamp_index};
pub use error::{Error, Result};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
