//! Workout progress (Layer 3)
//!
//! Set and exercise completion counts, percentages and a linear finish estimate.

#![warn(missing_docs)]

pub mod tracker;
pub mod estimator;

pub use tracker::{
    ProgressTracker, BasicProgressTracker, WorkoutProgress, ExerciseProgress, ExerciseStatus,
};
pub use estimator::CompletionEstimator;
