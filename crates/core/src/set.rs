//! Set model - one completable unit of work within an exercise.

use serde::{Deserialize, Serialize};
use crate::id::{ExerciseId, SetId};
use crate::Time;

/// A logged set (reps/weight or time/distance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    /// Unique identifier
    pub id: SetId,

    /// Owning exercise
    pub exercise_id: ExerciseId,

    /// Position within the exercise
    pub index: i32,

    /// Repetitions
    pub reps: u32,

    /// Weight
    pub weight: f32,

    /// Duration in minutes
    pub minutes: u32,

    /// Distance in meters
    pub meters: u32,

    /// Whether the set has been done
    pub completed: bool,

    /// When the set was marked done
    pub completed_at: Option<Time>,
}

impl WorkoutSet {
    /// Create an empty, uncompleted set.
    pub fn new(id: SetId, exercise_id: ExerciseId, index: i32) -> Self {
        Self {
            id,
            exercise_id,
            index,
            reps: 0,
            weight: 0.0,
            minutes: 0,
            meters: 0,
            completed: false,
            completed_at: None,
        }
    }

    /// Set reps and weight.
    pub fn with_load(mut self, reps: u32, weight: f32) -> Self {
        self.reps = reps;
        self.weight = weight;
        self
    }

    /// Flip completion.
    ///
    /// Completing stamps `completed_at` with `now`; un-completing clears it.
    pub fn toggle_completed(&mut self, now: Time) {
        self.completed = !self.completed;
        self.completed_at = if self.completed { Some(now) } else { None };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_stamps_then_clears() {
        let mut set = WorkoutSet::new(SetId(1), ExerciseId(1), 0);
        let now = chrono::Utc::now();

        set.toggle_completed(now);
        assert!(set.completed);
        assert_eq!(set.completed_at, Some(now));

        set.toggle_completed(now);
        assert!(!set.completed);
        assert!(set.completed_at.is_none());
    }
}
