//! Workout model - a training day with an ordered list of exercises.

use serde::{Deserialize, Serialize};
use crate::id::{ExerciseId, ExerciseTypeId, UserId, WorkoutId};
use crate::Time;

/// A single training session instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    /// Unique identifier
    pub id: WorkoutId,

    /// Owner of the workout
    pub user_id: UserId,

    /// Display name
    pub name: String,

    /// When the workout started
    pub started_at: Time,

    /// When the workout ended (None while running)
    pub ended_at: Option<Time>,

    /// Marked complete by the user
    pub completed: bool,
}

impl Workout {
    /// Create a new, unfinished workout starting now.
    pub fn new(id: WorkoutId, user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            user_id,
            name: name.into(),
            started_at: chrono::Utc::now(),
            ended_at: None,
            completed: false,
        }
    }

    /// Whether the workout has been finished.
    pub fn is_finished(&self) -> bool {
        self.completed || self.ended_at.is_some()
    }

    /// Whether `user` owns this workout.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user_id == user
    }

    /// Summarize for display next to the current exercise.
    pub fn summary(&self, exercise_count: usize) -> WorkoutSummary {
        WorkoutSummary {
            id: self.id,
            name: self.name.clone(),
            started_at: self.started_at,
            ended_at: self.ended_at,
            completed: self.completed,
            exercise_count,
        }
    }
}

/// Workout metadata shown alongside the current exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    /// Workout identifier
    pub id: WorkoutId,
    /// Display name
    pub name: String,
    /// Start time
    pub started_at: Time,
    /// End time
    pub ended_at: Option<Time>,
    /// Completion flag
    pub completed: bool,
    /// Number of exercises at read time
    pub exercise_count: usize,
}

/// One movement within a workout.
///
/// Exercises of a workout are ordered by `index`, which is unique within the
/// workout; that order is the sequence the session cursor walks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// Unique identifier
    pub id: ExerciseId,

    /// Owning workout
    pub workout_id: WorkoutId,

    /// Catalogue entry describing the movement
    pub exercise_type_id: ExerciseTypeId,

    /// Position within the workout
    pub index: i32,

    /// Planned number of sets
    pub target_sets: u32,
}

impl Exercise {
    /// Create a new exercise.
    pub fn new(
        id: ExerciseId,
        workout_id: WorkoutId,
        exercise_type_id: ExerciseTypeId,
        index: i32,
    ) -> Self {
        Self {
            id,
            workout_id,
            exercise_type_id,
            index,
            target_sets: 0,
        }
    }

    /// Set the planned number of sets.
    pub fn with_target_sets(mut self, target_sets: u32) -> Self {
        self.target_sets = target_sets;
        self
    }
}

/// Catalogue entry for a movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseType {
    /// Unique identifier
    pub id: ExerciseTypeId,

    /// Movement name
    pub name: String,

    /// Demonstration video link
    pub url: String,

    /// Muscle group code
    pub group_code: String,

    /// Recommended rest between sets (0 when unset)
    pub rest_in_seconds: u32,

    /// Technique accent
    pub accent: String,

    /// Logged units, e.g. "reps,weight" or "minutes,meters"
    pub units: String,
}

impl ExerciseType {
    /// Create a catalogue entry with no rest recommendation.
    pub fn new(id: ExerciseTypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: String::new(),
            group_code: String::new(),
            rest_in_seconds: 0,
            accent: String::new(),
            units: String::new(),
        }
    }

    /// Set the recommended rest.
    pub fn with_rest(mut self, seconds: u32) -> Self {
        self.rest_in_seconds = seconds;
        self
    }
}
