//! Workout session - the cursor over a workout's exercises.

use serde::{Deserialize, Serialize};
use crate::id::{SessionId, WorkoutId};
use crate::Time;

/// Active-progress record of a workout.
///
/// `current_exercise_index` is a zero-based position into the workout's
/// exercises ordered by index. It stays within `0..count` while the workout
/// has exercises and may hold `-1` after a navigation on an empty workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    /// Store-assigned identifier (`SessionId(0)` until created)
    pub id: SessionId,

    /// Owning workout
    pub workout_id: WorkoutId,

    /// Cursor position
    pub current_exercise_index: i64,

    /// Set once, at creation
    pub started_at: Time,

    /// At most one active session per workout
    pub is_active: bool,
}

impl WorkoutSession {
    /// A fresh, not yet persisted, active session positioned at `index`.
    pub fn start(workout_id: WorkoutId, index: i64) -> Self {
        Self {
            id: SessionId(0),
            workout_id,
            current_exercise_index: index,
            started_at: chrono::Utc::now(),
            is_active: true,
        }
    }

    /// The cursor as a usable position for `exercise_count` exercises.
    ///
    /// A cursor outside `0..exercise_count` reads as `0`.
    pub fn effective_index(&self, exercise_count: usize) -> usize {
        usize::try_from(self.current_exercise_index)
            .ok()
            .filter(|index| *index < exercise_count)
            .unwrap_or(0)
    }
}

/// Clamp a requested cursor position to `exercise_count` exercises.
///
/// Negative targets go to `0`, targets past the end go to the last exercise.
/// With no exercises a non-negative target yields `-1`.
pub fn clamp_index(target: i64, exercise_count: usize) -> i64 {
    let count = exercise_count as i64;
    if target < 0 {
        0
    } else if target >= count {
        count - 1
    } else {
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_matches_min_max_for_non_empty() {
        for count in 1..6usize {
            for target in -10..10i64 {
                let expected = target.min(count as i64 - 1).max(0);
                assert_eq!(clamp_index(target, count), expected, "target {target} count {count}");
            }
        }
    }

    #[test]
    fn test_clamp_empty_workout() {
        assert_eq!(clamp_index(-3, 0), 0);
        assert_eq!(clamp_index(0, 0), -1);
        assert_eq!(clamp_index(4, 0), -1);
    }

    #[test]
    fn test_effective_index_resets_stale_cursor() {
        let mut session = WorkoutSession::start(WorkoutId(1), 5);
        assert_eq!(session.effective_index(2), 0);
        assert_eq!(session.effective_index(6), 5);

        session.current_exercise_index = -1;
        assert_eq!(session.effective_index(3), 0);
    }
}
