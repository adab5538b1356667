//! Session navigation (Layer 2)
//!
//! The current-exercise cursor of a workout and set completion.

#![warn(missing_docs)]

pub mod navigator;
pub mod sets;

pub use navigator::{
    SessionNavigator, BasicSessionNavigator, CurrentExercise, Direction, NavigationTarget,
};
pub use sets::SetTracker;
